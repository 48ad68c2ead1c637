//! Session-scoped key/value storage seam.
//!
//! The cache layer works against this trait so the backing store can be an
//! in-process map, a browser-style session store behind FFI, or a test
//! double with a deliberately tiny quota.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::RelarcError;

/// A string key/value store with session lifetime.
///
/// Writes may be rejected for capacity; callers distinguish
/// [`RelarcError::StoreQuota`] from other store faults because quota
/// rejections trigger eviction-and-retry while everything else is swallowed.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn read(&self, key: &str) -> Option<String>;
    async fn write(&self, key: &str, value: String) -> Result<(), RelarcError>;
    async fn remove(&self, key: &str);
    async fn keys(&self) -> Vec<String>;
}

/// In-process store with an optional byte quota over keys plus values.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes: None,
        }
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn used_bytes(entries: &HashMap<String, String>) -> usize {
        entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn read(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn write(&self, key: &str, value: String) -> Result<(), RelarcError> {
        let mut entries = self.entries.write().await;
        if let Some(quota) = self.quota_bytes {
            let replaced = entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let projected = Self::used_bytes(&entries) - replaced + key.len() + value.len();
            if projected > quota {
                return Err(RelarcError::StoreQuota {
                    key: key.to_string(),
                });
            }
        }
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    async fn keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip_and_remove() {
        let store = MemoryStore::new();
        store.write("k", "v".to_string()).await.unwrap();
        assert_eq!(store.read("k").await, Some("v".to_string()));
        store.remove("k").await;
        assert_eq!(store.read("k").await, None);
    }

    #[tokio::test]
    async fn test_quota_rejects_oversized_write() {
        let store = MemoryStore::with_quota(10);
        store.write("a", "12345".to_string()).await.unwrap();
        let err = store.write("b", "123456789".to_string()).await.unwrap_err();
        assert!(matches!(err, RelarcError::StoreQuota { .. }));
        // Rejected writes leave the store untouched.
        assert_eq!(store.read("b").await, None);
    }

    #[tokio::test]
    async fn test_quota_accounts_for_replacement() {
        let store = MemoryStore::with_quota(8);
        store.write("k", "1234567".to_string()).await.unwrap();
        // Replacing the same key with an equal-sized value fits.
        store.write("k", "abcdefg".to_string()).await.unwrap();
        assert_eq!(store.read("k").await, Some("abcdefg".to_string()));
    }
}
