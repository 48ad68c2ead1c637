use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Which reconstruction produced a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineMode {
    /// Explicit chapter/event window over manifest data only.
    Standalone,
    /// Bounded to the chapter currently being read.
    #[default]
    Viewer,
    /// One point per prior chapter plus the full current-chapter series.
    Cumulative,
}

/// One point on a pair's relationship timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSample {
    pub coordinate: Coordinate,
    /// Raw positivity as sampled; `None` means the value was absent.
    pub positivity: Option<f64>,
    /// Chart label: `E{event}` within a chapter, `Ch{chapter}` for a
    /// chapter-boundary aggregate.
    pub label: String,
    /// Relation tags carried through from the normalized record.
    pub relation_labels: Vec<String>,
}

impl RelationSample {
    /// Positivity clamped to `[-1, 1]`; callers consume only this form.
    pub fn clamped_positivity(&self) -> Option<f64> {
        self.positivity.map(|p| p.clamp(-1.0, 1.0))
    }
}

/// An ordered series of relationship samples for one pair.
///
/// Points are strictly increasing by coordinate (one sample per coordinate
/// visited, by construction) and never precede the pair's first co-occurrence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Timeline {
    pub points: Vec<RelationSample>,
    pub mode: TimelineMode,
    /// True when the pair never co-occurs within the queried range. This is
    /// a valid domain outcome, not an error.
    pub no_relation: bool,
}

impl Timeline {
    pub fn empty(mode: TimelineMode) -> Self {
        Self {
            points: Vec::new(),
            mode,
            no_relation: false,
        }
    }

    pub fn no_relation(mode: TimelineMode) -> Self {
        Self {
            points: Vec::new(),
            mode,
            no_relation: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}
