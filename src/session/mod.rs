pub mod cache;
pub mod store;

pub use cache::{CacheConfig, TimelineCache};
pub use store::{MemoryStore, SessionStore};
