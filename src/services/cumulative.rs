//! Cross-chapter cumulative aggregation.
//!
//! Long books would produce unbounded timelines if every event were plotted,
//! so prior chapters compress to one point each while the chapter currently
//! being inspected keeps full per-event granularity.

use tracing::debug;

use super::collect::{collect, pair_relation_at};
use super::locate::locate_first_appearance;
use super::resolver::{resolve_last_event, ProbeConfig};
use crate::models::{Coordinate, RelationSample, Timeline, TimelineMode};
use crate::source::EventSource;

/// Build the cumulative timeline for a pair up to `target_chapter`.
///
/// - No co-occurrence anywhere in range yields an empty timeline with
///   `no_relation` set.
/// - Each chapter from the first appearance up to (excluding) the target
///   contributes at most one `Ch{n}` sample: the pair's most recent relation
///   in that chapter, found by scanning backward from the chapter's last
///   valid event within `back_scan_depth`. Chapters where nothing is found
///   in that window are omitted.
/// - The target chapter contributes its full `E{n}` series, starting at the
///   pair's first appearance within it, or event 1 if the pair already
///   appeared earlier.
pub async fn cumulative(
    source: &dyn EventSource,
    id1: i64,
    id2: i64,
    target_chapter: u32,
    config: &ProbeConfig,
) -> Timeline {
    let Some(first) = locate_first_appearance(source, id1, id2, target_chapter, config).await
    else {
        return Timeline::no_relation(TimelineMode::Cumulative);
    };

    let mut points: Vec<RelationSample> = Vec::new();

    for chapter in first.chapter..target_chapter {
        if let Some(sample) = chapter_aggregate(source, id1, id2, chapter, config).await {
            points.push(sample);
        } else {
            debug!("Ch{} omitted: pair ({}, {}) has no relation there", chapter, id1, id2);
        }
    }

    let start_event = if first.chapter == target_chapter {
        first.event
    } else {
        1
    };
    let last = resolve_last_event(source, target_chapter, config).await;
    if last >= start_event {
        let series = collect(
            source,
            id1,
            id2,
            Coordinate::new(target_chapter, start_event),
            Coordinate::new(target_chapter, last),
            config,
        )
        .await;
        points.extend(series);
    }

    Timeline {
        points,
        mode: TimelineMode::Cumulative,
        no_relation: false,
    }
}

/// One `Ch{n}` sample for a prior chapter: the pair's most recent relation,
/// scanning backward from the chapter's last valid event.
async fn chapter_aggregate(
    source: &dyn EventSource,
    id1: i64,
    id2: i64,
    chapter: u32,
    config: &ProbeConfig,
) -> Option<RelationSample> {
    let last = resolve_last_event(source, chapter, config).await;
    if last == 0 {
        return None;
    }

    let floor = last.saturating_sub(config.back_scan_depth.saturating_sub(1)).max(1);
    for event in (floor..=last).rev() {
        if let Some(rel) = pair_relation_at(source, id1, id2, chapter, event).await {
            return Some(RelationSample {
                coordinate: Coordinate::new(chapter, event),
                positivity: rel.positivity,
                label: format!("Ch{}", chapter),
                relation_labels: rel.relation,
            });
        }
    }
    None
}
