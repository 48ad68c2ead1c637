//! Test doubles and event builders shared by integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use relarc::source::{BookManifest, EventData, EventEnvelope, EventSource};
use relarc::RelarcError;

/// An event that has a payload but no relation for any pair.
pub fn quiet_event(title: &str) -> EventData {
    EventData {
        characters: None,
        relations: vec![],
        event: Some(json!({ "title": title })),
    }
}

/// An event holding one relation record for a pair.
pub fn pair_event(id1: i64, id2: i64, positivity: f64) -> EventData {
    EventData {
        characters: None,
        relations: vec![json!({ "id1": id1, "id2": id2, "positivity": positivity })],
        event: None,
    }
}

/// Probe-only event source (no manifest) with a fetch counter.
///
/// Chapters are given as vectors of events starting at event index 1;
/// anything outside the scripted data comes back as a synthesized empty
/// success, matching the collaborator contract.
pub struct ScriptedSource {
    book_id: String,
    chapters: Vec<Vec<EventData>>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(book_id: &str, chapters: Vec<Vec<EventData>>) -> Self {
        Self {
            book_id: book_id.to_string(),
            chapters,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    fn book_id(&self) -> &str {
        &self.book_id
    }

    fn manifest(&self) -> Option<&BookManifest> {
        None
    }

    async fn fetch_event(&self, chapter: u32, event: u32) -> Result<EventEnvelope, RelarcError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if chapter == 0 || event == 0 {
            return Ok(EventEnvelope::empty());
        }
        let data = self
            .chapters
            .get((chapter - 1) as usize)
            .and_then(|c| c.get((event - 1) as usize));

        Ok(match data {
            Some(event_data) => EventEnvelope {
                is_success: true,
                code: "SUCCESS".to_string(),
                message: "ok".to_string(),
                result: event_data.clone(),
            },
            None => EventEnvelope::empty(),
        })
    }
}

/// The two-chapter book behind the reconstruction scenarios: the pair (3, 7)
/// first appears at ch1/e3 and reappears through chapter 2.
pub fn scenario_book() -> ScriptedSource {
    ScriptedSource::new(
        "42",
        vec![
            vec![
                quiet_event("opening"),
                quiet_event("journey"),
                pair_event(3, 7, 0.2),
                pair_event(3, 7, 0.4),
            ],
            vec![
                quiet_event("arrival"),
                pair_event(3, 7, -0.1),
                pair_event(3, 7, 0.0),
                pair_event(3, 7, 0.3),
                pair_event(3, 7, 0.6),
            ],
        ],
    )
}
