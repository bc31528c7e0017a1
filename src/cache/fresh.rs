//! L1 freshness cache

use super::CacheEntry;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Short-TTL cache keyed by query parameter
#[derive(Clone)]
pub struct FreshCache {
    ttl: Duration,
    inner: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl FreshCache {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs),
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Entry for `key` if its age is still under the TTL
    pub async fn get(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let map = self.inner.read().await;
        let entry = map.get(key)?;
        if now.signed_duration_since(entry.stored_at) >= self.ttl {
            return None;
        }
        Some(entry.clone())
    }

    /// Entry for `key` regardless of age; used for the empty-merge
    /// write guard
    pub async fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.inner.read().await.get(key).cloned()
    }

    /// Replace the entry for `key`
    pub async fn insert(&self, key: &str, entry: CacheEntry) {
        self.inner.write().await.insert(key.to_string(), entry);
    }
}
