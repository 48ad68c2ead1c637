//! Coordinate resolution: the last valid event index of a chapter.
//!
//! Manifest-backed sources answer from their per-chapter table in O(1).
//! Probe-only sources binary-search a fixed window, because each probe is a
//! network round trip and a linear scan would not be affordable.

use tracing::debug;

use crate::source::EventSource;

/// Probe limits for sources without a manifest.
///
/// The defaults are correctness limits, not tuning knobs: a chapter with more
/// than `probe_ceiling` events is silently truncated at the ceiling, and a
/// chapter whose event data has gaps longer than `empty_streak_limit` may be
/// cut short. Books that exceed them need the limits raised explicitly.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Upper bound of the binary-search window over event indexes.
    pub probe_ceiling: u32,
    /// Consecutive empty probes treated as proof of "past the end" when
    /// scanning a chapter forward.
    pub empty_streak_limit: u32,
    /// How far back from a chapter's last event to look for the pair's most
    /// recent relation when aggregating a prior chapter.
    pub back_scan_depth: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            probe_ceiling: 100,
            empty_streak_limit: 2,
            back_scan_depth: 50,
        }
    }
}

/// Whether any usable payload exists at a coordinate.
///
/// Fetch failures count as "nothing there": missing data and transient
/// transport faults are deliberately indistinguishable at this layer.
pub(crate) async fn probe_exists(source: &dyn EventSource, chapter: u32, event: u32) -> bool {
    match source.fetch_event(chapter, event).await {
        Ok(envelope) => envelope.has_payload(),
        Err(e) => {
            debug!("Probe ch{}/e{} failed, treating as absent: {}", chapter, event, e);
            false
        }
    }
}

/// Resolve the last valid event index of a chapter; 0 means no events.
///
/// Probe mode assumes event data is contiguous from index 1, so payload
/// presence is monotonic over the window and binary search applies: an
/// existing probe advances the lower bound and becomes the candidate, an
/// empty one retreats the upper bound.
pub async fn resolve_last_event(
    source: &dyn EventSource,
    chapter: u32,
    config: &ProbeConfig,
) -> u32 {
    if let Some(manifest) = source.manifest() {
        return manifest.last_event_index(chapter);
    }

    let mut low = 1u32;
    let mut high = config.probe_ceiling;
    let mut best = 0u32;

    while low <= high {
        let mid = low + (high - low) / 2;
        if probe_exists(source, chapter, mid).await {
            best = mid;
            low = mid + 1;
        } else {
            high = mid - 1;
        }
    }

    debug!("Resolved last event of ch{} to {}", chapter, best);
    best
}
