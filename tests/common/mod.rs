pub mod builders;

pub use builders::{pair_event, quiet_event, scenario_book, ScriptedSource};
