//! Process-wide ETag store
//!
//! Remembers the last-seen ETag per source so adapters can issue
//! conditional requests. Records expire after 24h and the whole store
//! resets on restart.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// How long a stored ETag stays usable
const ETAG_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
struct EtagRecord {
    etag: String,
    stored_at: DateTime<Utc>,
}

/// Shared source -> ETag map with TTL
#[derive(Clone, Default)]
pub struct EtagStore {
    inner: Arc<RwLock<HashMap<String, EtagRecord>>>,
}

impl EtagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-seen ETag for `source`, or None if absent or expired
    pub async fn get(&self, source: &str, now: DateTime<Utc>) -> Option<String> {
        let map = self.inner.read().await;
        let record = map.get(source)?;
        if now.signed_duration_since(record.stored_at) >= Duration::hours(ETAG_TTL_HOURS) {
            return None;
        }
        Some(record.etag.clone())
    }

    /// Replace the stored ETag for `source`
    pub async fn set(&self, source: &str, etag: &str, now: DateTime<Utc>) {
        let mut map = self.inner.write().await;
        map.insert(
            source.to_string(),
            EtagRecord {
                etag: etag.to_string(),
                stored_at: now,
            },
        );
    }
}
