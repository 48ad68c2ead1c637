//! Event-data source seam.
//!
//! The reconstruction engine never talks to a transport directly; it consumes
//! an [`EventSource`] that yields one envelope per `(chapter, event)`
//! coordinate. Sources that know their per-chapter extent expose a
//! [`BookManifest`]; sources that do not are probed (binary search and
//! early-exit scanning in the services layer).

pub mod manifest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RelarcError;

/// A character present at an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Payload of one event fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    #[serde(default)]
    pub characters: Option<Vec<Character>>,
    /// Raw relation records; shapes vary, normalize before use.
    #[serde(default)]
    pub relations: Vec<Value>,
    #[serde(default)]
    pub event: Option<Value>,
}

/// Envelope returned by an event fetch.
///
/// Absent or invalid coordinates come back as a synthesized success with
/// empty arrays, never as a not-found error; the engine relies on this to
/// tell "no data" apart from transport failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: EventData,
}

impl EventEnvelope {
    /// Synthesized success for a coordinate with no data.
    pub fn empty() -> Self {
        Self {
            is_success: true,
            code: "SUCCESS".to_string(),
            message: "no event data".to_string(),
            result: EventData::default(),
        }
    }

    /// Whether anything usable exists at this coordinate: a non-empty
    /// character list, a non-empty relation list, or a present event object.
    pub fn has_payload(&self) -> bool {
        if !self.is_success {
            return false;
        }
        let chars_present = self
            .result
            .characters
            .as_ref()
            .is_some_and(|c| !c.is_empty());
        chars_present || !self.result.relations.is_empty() || self.result.event.is_some()
    }
}

/// Per-chapter event extent for manifest-backed books.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookManifest {
    /// Last valid event index per chapter, 1-indexed by `chapter - 1`.
    pub last_event_per_chapter: Vec<u32>,
}

impl BookManifest {
    /// Last valid event index of a chapter; 0 when the chapter has no events
    /// or is out of range.
    pub fn last_event_index(&self, chapter: u32) -> u32 {
        if chapter == 0 {
            return 0;
        }
        self.last_event_per_chapter
            .get((chapter - 1) as usize)
            .copied()
            .unwrap_or(0)
    }

    pub fn max_chapter(&self) -> u32 {
        self.last_event_per_chapter.len() as u32
    }
}

/// A book's event data, addressable by coordinate.
#[async_trait]
pub trait EventSource: Send + Sync {
    fn book_id(&self) -> &str;

    /// The per-chapter extent table, when this source knows it up front.
    /// `None` switches the services layer to probe mode.
    fn manifest(&self) -> Option<&BookManifest>;

    async fn fetch_event(&self, chapter: u32, event: u32) -> Result<EventEnvelope, RelarcError>;
}
