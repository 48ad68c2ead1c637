use serde::{Deserialize, Serialize};

/// A `(chapter, event)` position in a book's narrative timeline.
///
/// Both components are 1-indexed. Ordering is lexicographic by
/// `(chapter, event)`, which the derived `Ord` provides via field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub chapter: u32,
    pub event: u32,
}

impl Coordinate {
    pub fn new(chapter: u32, event: u32) -> Self {
        Self { chapter, event }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ch{}/e{}", self.chapter, self.event)
    }
}
