//! CLI interface for Relarc.

pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::models::TimelineMode;
use crate::services::{
    locate_first_appearance, resolve_last_event, ProbeConfig, TimelineFacade, TimelineQuery,
};
use crate::session::{MemoryStore, TimelineCache};
use crate::source::manifest::ManifestSource;
use crate::source::EventSource;
use output::{output_json, print_note, print_table, OutputMode};

/// Relarc - relationship timeline engine for book data
#[derive(Parser)]
#[command(name = "relarc", version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON book file
    #[arg(long, env = "RELARC_BOOK", global = true)]
    pub book: Option<PathBuf>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconstruct a pair's relationship timeline
    Timeline {
        /// First character id
        id1: i64,
        /// Second character id
        id2: i64,
        /// Chapter being inspected
        #[arg(long)]
        chapter: u32,
        /// Reconstruction mode: standalone, viewer, or cumulative
        #[arg(long, default_value = "cumulative")]
        mode: String,
        /// End of the event window (standalone mode)
        #[arg(long)]
        event: Option<u32>,
    },

    /// Find the earliest coordinate where a pair co-occurs
    FirstAppearance {
        /// First character id
        id1: i64,
        /// Second character id
        id2: i64,
        /// Last chapter to search (default: whole book)
        #[arg(long)]
        up_to: Option<u32>,
    },

    /// Resolve the last valid event index of a chapter
    Resolve {
        /// Chapter to resolve
        chapter: u32,
    },
}

fn parse_mode(mode: &str) -> Result<TimelineMode> {
    match mode {
        "standalone" => Ok(TimelineMode::Standalone),
        "viewer" => Ok(TimelineMode::Viewer),
        "cumulative" => Ok(TimelineMode::Cumulative),
        other => bail!("Unknown mode '{}'. Use standalone, viewer, or cumulative", other),
    }
}

fn load_source(book: Option<&PathBuf>) -> Result<Arc<ManifestSource>> {
    let path = book.context("No book file given. Pass --book or set RELARC_BOOK")?;
    let source = ManifestSource::load(path)
        .with_context(|| format!("Failed to load book from {}", path.display()))?;
    Ok(Arc::new(source))
}

pub async fn execute(cmd: &Commands, book: Option<&PathBuf>, mode: OutputMode) -> Result<()> {
    let source = load_source(book)?;
    let config = ProbeConfig::default();

    match cmd {
        Commands::Timeline {
            id1,
            id2,
            chapter,
            mode: timeline_mode,
            event,
        } => {
            let cache = Arc::new(TimelineCache::new(Arc::new(MemoryStore::new())));
            let facade = TimelineFacade::new(source.clone(), cache);
            facade
                .set_query(TimelineQuery {
                    mode: parse_mode(timeline_mode)?,
                    book_id: Some(source.book_id().to_string()),
                    id1: Some(*id1),
                    id2: Some(*id2),
                    chapter: Some(*chapter),
                    event: *event,
                    max_chapter: Some(source.max_chapter()),
                })
                .await;
            facade.fetch_data().await;

            let state = facade.state().await;
            match mode {
                OutputMode::Json => output_json(&state),
                OutputMode::Human => {
                    if let Some(error) = &state.error {
                        bail!("{}", error);
                    }
                    if state.no_relation {
                        print_note("Pair has no relation in range.");
                        return Ok(());
                    }
                    let rows: Vec<Vec<String>> = state
                        .labels
                        .iter()
                        .zip(&state.timeline)
                        .filter(|(label, _)| !label.is_empty())
                        .map(|(label, value)| {
                            vec![
                                label.clone(),
                                value.map_or("-".to_string(), |v| format!("{:+.2}", v)),
                            ]
                        })
                        .collect();
                    print_table(&["Point", "Positivity"], rows);
                }
            }
        }

        Commands::FirstAppearance { id1, id2, up_to } => {
            let up_to = up_to.unwrap_or_else(|| source.max_chapter());
            let found =
                locate_first_appearance(source.as_ref(), *id1, *id2, up_to, &config).await;
            match mode {
                OutputMode::Json => output_json(&found),
                OutputMode::Human => match found {
                    Some(coordinate) => println!("First co-occurrence at {}", coordinate),
                    None => print_note("Pair never co-occurs in range."),
                },
            }
        }

        Commands::Resolve { chapter } => {
            let last = resolve_last_event(source.as_ref(), *chapter, &config).await;
            match mode {
                OutputMode::Json => output_json(&serde_json::json!({
                    "chapter": chapter,
                    "lastEvent": last,
                })),
                OutputMode::Human => println!("Chapter {} last event: {}", chapter, last),
            }
        }
    }

    Ok(())
}
