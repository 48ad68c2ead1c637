pub mod coordinate;
pub mod relation;
pub mod timeline;

pub use coordinate::Coordinate;
pub use relation::{is_same_pair, normalize_relation, NormalizedRelation, PairKey};
pub use timeline::{RelationSample, Timeline, TimelineMode};
