//! Best-effort TTL cache for reconstructed timelines.
//!
//! Entries expire lazily: an expired entry is deleted by the read that finds
//! it, and every write sweeps the namespace first. There is no background
//! timer. Losing the cache never affects correctness, only re-triggers
//! reconstruction.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::store::SessionStore;
use crate::models::PairKey;

/// TTL and eviction policy.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum entry age before a read treats it as a miss (default: 5 min).
    pub ttl: Duration,
    /// How many oldest entries to evict when the store rejects a write for
    /// capacity (default: 10).
    pub eviction_batch: usize,
    /// Key namespace prefix.
    pub prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            eviction_batch: 10,
            prefix: "relation-timeline-".to_string(),
        }
    }
}

/// Persisted entry shape: the raw result plus its write timestamp.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    result: Value,
    timestamp: i64,
}

/// TTL + best-effort-bounded cache over a [`SessionStore`].
pub struct TimelineCache {
    store: Arc<dyn SessionStore>,
    config: CacheConfig,
}

impl TimelineCache {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            config: CacheConfig::default(),
        }
    }

    pub fn with_config(store: Arc<dyn SessionStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    /// Cache key for a pair at a chapter. Ids are canonicalized ascending so
    /// that `(3, 7)` and `(7, 3)` share one entry.
    pub fn key(&self, book_id: &str, chapter: u32, id1: i64, id2: i64) -> String {
        let pair = PairKey::new(book_id, id1, id2);
        format!(
            "{}{}-{}-{}-{}",
            self.config.prefix, pair.book_id, chapter, pair.id1, pair.id2
        )
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Utc::now().timestamp_millis()).await
    }

    /// TTL check against an explicit clock; expired and unparseable entries
    /// are deleted as a side effect of the read.
    pub async fn get_at(&self, key: &str, now_ms: i64) -> Option<Value> {
        let raw = self.store.read(key).await?;
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Dropping unparseable cache entry '{}': {}", key, e);
                self.store.remove(key).await;
                return None;
            }
        };
        if self.expired(entry.timestamp, now_ms) {
            debug!("Cache entry '{}' expired, deleting", key);
            self.store.remove(key).await;
            return None;
        }
        debug!("Cache hit for '{}'", key);
        Some(entry.result)
    }

    pub async fn set(&self, key: &str, value: &Value) {
        self.set_at(key, value, Utc::now().timestamp_millis()).await;
    }

    /// Write with an explicit clock. Sweeps expired namespace entries first;
    /// a quota rejection evicts the oldest entries and retries exactly once.
    pub async fn set_at(&self, key: &str, value: &Value, now_ms: i64) {
        self.sweep_expired(now_ms).await;

        let entry = CacheEntry {
            result: value.clone(),
            timestamp: now_ms,
        };
        let serialized = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize cache entry '{}': {}", key, e);
                return;
            }
        };

        if self.store.write(key, serialized.clone()).await.is_ok() {
            return;
        }

        self.evict_oldest(self.config.eviction_batch).await;
        if let Err(e) = self.store.write(key, serialized).await {
            warn!("Cache write for '{}' failed after eviction, giving up: {}", key, e);
        }
    }

    /// Remove every entry for a book, or for one chapter of it.
    pub async fn invalidate(&self, book_id: &str, chapter: Option<u32>) {
        let prefix = match chapter {
            Some(chapter) => format!("{}{}-{}-", self.config.prefix, book_id, chapter),
            None => format!("{}{}-", self.config.prefix, book_id),
        };
        for key in self.namespace_keys().await {
            if key.starts_with(&prefix) {
                self.store.remove(&key).await;
            }
        }
    }

    fn expired(&self, timestamp_ms: i64, now_ms: i64) -> bool {
        now_ms.saturating_sub(timestamp_ms) > self.config.ttl.as_millis() as i64
    }

    async fn namespace_keys(&self) -> Vec<String> {
        self.store
            .keys()
            .await
            .into_iter()
            .filter(|k| k.starts_with(&self.config.prefix))
            .collect()
    }

    /// Amortized cleanup: delete every expired entry under the namespace.
    async fn sweep_expired(&self, now_ms: i64) {
        for key in self.namespace_keys().await {
            if let Some(raw) = self.store.read(&key).await {
                match serde_json::from_str::<CacheEntry>(&raw) {
                    Ok(entry) if self.expired(entry.timestamp, now_ms) => {
                        self.store.remove(&key).await;
                    }
                    Ok(_) => {}
                    Err(_) => self.store.remove(&key).await,
                }
            }
        }
    }

    /// Evict the `count` oldest-timestamped entries under the namespace.
    async fn evict_oldest(&self, count: usize) {
        let mut aged: Vec<(i64, String)> = Vec::new();
        for key in self.namespace_keys().await {
            if let Some(raw) = self.store.read(&key).await {
                if let Ok(entry) = serde_json::from_str::<CacheEntry>(&raw) {
                    aged.push((entry.timestamp, key));
                }
            }
        }
        aged.sort();
        for (_, key) in aged.into_iter().take(count) {
            debug!("Evicting cache entry '{}'", key);
            self.store.remove(&key).await;
        }
    }
}
