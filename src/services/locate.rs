//! First-appearance search: the earliest coordinate where a pair co-occurs.

use tracing::debug;

use super::collect::pair_relation_at;
use super::resolver::{resolve_last_event, ProbeConfig};
use crate::models::{is_same_pair, normalize_relation, Coordinate};
use crate::source::EventSource;

/// Find the earliest coordinate in chapters `1..=up_to_chapter` where the
/// pair co-occurs. `None` is a valid outcome, not an error.
///
/// Manifest sources scan every event exhaustively. Probe sources treat event
/// data as contiguous from index 1, so a chapter scan stops once
/// `empty_streak_limit` consecutive probes come back empty.
pub async fn locate_first_appearance(
    source: &dyn EventSource,
    id1: i64,
    id2: i64,
    up_to_chapter: u32,
    config: &ProbeConfig,
) -> Option<Coordinate> {
    for chapter in 1..=up_to_chapter {
        let found = if source.manifest().is_some() {
            scan_chapter_manifest(source, id1, id2, chapter, config).await
        } else {
            scan_chapter_probing(source, id1, id2, chapter, config).await
        };
        if let Some(coordinate) = found {
            debug!("Pair ({}, {}) first appears at {}", id1, id2, coordinate);
            return Some(coordinate);
        }
    }
    None
}

async fn scan_chapter_manifest(
    source: &dyn EventSource,
    id1: i64,
    id2: i64,
    chapter: u32,
    config: &ProbeConfig,
) -> Option<Coordinate> {
    let last = resolve_last_event(source, chapter, config).await;
    for event in 1..=last {
        if pair_relation_at(source, id1, id2, chapter, event).await.is_some() {
            return Some(Coordinate::new(chapter, event));
        }
    }
    None
}

async fn scan_chapter_probing(
    source: &dyn EventSource,
    id1: i64,
    id2: i64,
    chapter: u32,
    config: &ProbeConfig,
) -> Option<Coordinate> {
    let mut empty_streak = 0u32;
    for event in 1..=config.probe_ceiling {
        let envelope = match source.fetch_event(chapter, event).await {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Probe ch{}/e{} failed during scan: {}", chapter, event, e);
                empty_streak += 1;
                if empty_streak >= config.empty_streak_limit {
                    break;
                }
                continue;
            }
        };

        if !envelope.has_payload() {
            empty_streak += 1;
            if empty_streak >= config.empty_streak_limit {
                break;
            }
            continue;
        }
        empty_streak = 0;

        let matched = envelope
            .result
            .relations
            .iter()
            .filter_map(normalize_relation)
            .any(|rel| is_same_pair(&rel, id1, id2));
        if matched {
            return Some(Coordinate::new(chapter, event));
        }
    }
    None
}
