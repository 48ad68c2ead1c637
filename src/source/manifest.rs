//! Manifest-backed event source over in-memory book data.
//!
//! Book data is a per-chapter list of events, deserializable from a JSON
//! file. The manifest (last event index per chapter) is derived from the
//! data at construction, so lookups never probe.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{BookManifest, EventData, EventEnvelope, EventSource};
use crate::RelarcError;

/// One chapter's events, in order from event index 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChapterData {
    #[serde(default)]
    pub events: Vec<EventData>,
}

/// A whole book's event data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookData {
    pub book_id: String,
    #[serde(default)]
    pub chapters: Vec<ChapterData>,
}

/// Event source backed by a [`BookData`] and its derived manifest.
pub struct ManifestSource {
    data: BookData,
    manifest: BookManifest,
}

impl ManifestSource {
    pub fn new(data: BookData) -> Self {
        let manifest = BookManifest {
            last_event_per_chapter: data
                .chapters
                .iter()
                .map(|c| c.events.len() as u32)
                .collect(),
        };
        Self { data, manifest }
    }

    /// Load book data from a JSON file on disk.
    pub fn load(path: &Path) -> Result<Self, RelarcError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| RelarcError::Source(format!("Failed to read book file: {}", e)))?;
        let data: BookData = serde_json::from_str(&json)
            .map_err(|e| RelarcError::Source(format!("Failed to parse book file: {}", e)))?;
        Ok(Self::new(data))
    }

    pub fn max_chapter(&self) -> u32 {
        self.manifest.max_chapter()
    }
}

#[async_trait]
impl EventSource for ManifestSource {
    fn book_id(&self) -> &str {
        &self.data.book_id
    }

    fn manifest(&self) -> Option<&BookManifest> {
        Some(&self.manifest)
    }

    async fn fetch_event(&self, chapter: u32, event: u32) -> Result<EventEnvelope, RelarcError> {
        if chapter == 0 || event == 0 {
            return Ok(EventEnvelope::empty());
        }
        let data = self
            .data
            .chapters
            .get((chapter - 1) as usize)
            .and_then(|c| c.events.get((event - 1) as usize));

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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_book() -> BookData {
        serde_json::from_value(json!({
            "bookId": "demo",
            "chapters": [
                { "events": [
                    { "relations": [{ "id1": 3, "id2": 7, "positivity": 0.2 }] },
                    { "relations": [] }
                ] },
                { "events": [] }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_manifest_derived_from_data() {
        let source = ManifestSource::new(sample_book());
        let manifest = source.manifest().unwrap();
        assert_eq!(manifest.last_event_per_chapter, vec![2, 0]);
        assert_eq!(source.max_chapter(), 2);
    }

    #[tokio::test]
    async fn test_fetch_present_event() {
        let source = ManifestSource::new(sample_book());
        let env = source.fetch_event(1, 1).await.unwrap();
        assert!(env.is_success);
        assert_eq!(env.result.relations.len(), 1);
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.json");
        std::fs::write(
            &path,
            serde_json::to_string(&sample_book()).unwrap(),
        )
        .unwrap();

        let source = ManifestSource::load(&path).unwrap();
        assert_eq!(source.book_id(), "demo");
        assert_eq!(source.max_chapter(), 2);

        assert!(ManifestSource::load(&dir.path().join("missing.json")).is_err());
    }

    #[tokio::test]
    async fn test_absent_event_synthesizes_empty_success() {
        let source = ManifestSource::new(sample_book());
        for (chapter, event) in [(1, 3), (2, 1), (9, 1), (0, 1), (1, 0)] {
            let env = source.fetch_event(chapter, event).await.unwrap();
            assert!(env.is_success, "ch{}/e{} must not error", chapter, event);
            assert!(!env.has_payload());
        }
    }
}
