//! Relarc - relationship timeline engine for book data
//!
//! Usage:
//!   relarc --book demo.json timeline 3 7 --chapter 2    Cumulative timeline
//!   relarc --book demo.json first-appearance 3 7        Earliest co-occurrence
//!   relarc --book demo.json resolve 1                   Last event of a chapter
//!   relarc --help                                       Show all commands

use anyhow::Result;
use clap::Parser;

use relarc::cli::output::OutputMode;
use relarc::cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("relarc=info".parse()?),
        )
        .init();

    let mode = OutputMode::from_json_flag(cli.json);
    execute(&cli.command, cli.book.as_ref(), mode).await?;

    Ok(())
}
