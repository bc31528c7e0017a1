//! L2 revalidation cache: singleflight + stale-while-revalidate
//!
//! Windows, measured from the entry's assembly time:
//! - age < TTL: fresh, served with no work
//! - TTL <= age < TTL + SWR: stale but serveable; caller serves the
//!   stale payload and triggers one non-awaited refresh
//! - beyond TTL + SWR: cold; caller must block on a refresh
//!
//! Concurrent refreshes for the same key share one in-flight future
//! (`futures::future::Shared`); the owning caller clears the slot when
//! it settles, success or failure, so a failed refresh never wedges the
//! key and never poisons the last-good entry.

use super::CacheEntry;
use crate::feed::SignalFeed;
use chrono::{DateTime, Duration, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// Refresh failure surfaced to every caller sharing the flight
#[derive(Debug, Clone, Error)]
#[error("refresh failed: {0}")]
pub struct RefreshError(pub String);

type SharedRefresh = Shared<BoxFuture<'static, Result<SignalFeed, RefreshError>>>;

/// Keyed SWR cache with singleflight refresh
#[derive(Clone)]
pub struct RevalidateCache {
    ttl: Duration,
    swr: Duration,
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    inflight: Arc<Mutex<HashMap<String, SharedRefresh>>>,
}

impl RevalidateCache {
    pub fn new(ttl_secs: i64, swr_secs: i64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs),
            swr: Duration::seconds(swr_secs),
            entries: Arc::new(RwLock::new(HashMap::new())),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Entry still inside the fresh window
    pub async fn get_fresh(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let map = self.entries.read().await;
        let entry = map.get(key)?;
        if now.signed_duration_since(entry.stored_at) >= self.ttl {
            return None;
        }
        Some(entry.clone())
    }

    /// Entry past the fresh window but still inside the SWR window
    pub async fn get_stale_but_serveable(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<CacheEntry> {
        let map = self.entries.read().await;
        let entry = map.get(key)?;
        let age = now.signed_duration_since(entry.stored_at);
        if age < self.ttl || age >= self.ttl + self.swr {
            return None;
        }
        Some(entry.clone())
    }

    /// Store a freshly assembled payload for `key`
    pub async fn store(&self, key: &str, entry: CacheEntry) {
        self.entries.write().await.insert(key.to_string(), entry);
    }

    /// Run `refresher` for `key`, sharing any refresh already in flight
    ///
    /// Exactly one refresher runs per key at a time; every concurrent
    /// caller awaits the same result. On success the entry is replaced;
    /// on failure the previous entry is left untouched.
    pub async fn get_or_refresh<F>(&self, key: &str, refresher: F) -> Result<SignalFeed, RefreshError>
    where
        F: Future<Output = Result<SignalFeed, RefreshError>> + Send + 'static,
    {
        let (flight, owner) = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(key) {
                Some(existing) => (existing.clone(), false),
                None => {
                    let flight = refresher.boxed().shared();
                    inflight.insert(key.to_string(), flight.clone());
                    (flight, true)
                }
            }
        };

        let result = flight.await;

        if owner {
            // Clear the slot before publishing so a follow-up refresh
            // can start as soon as callers observe the new entry
            self.inflight.lock().await.remove(key);
            if let Ok(feed) = &result {
                self.store(key, CacheEntry::from_feed(feed.clone())).await;
            }
        }

        result
    }
}
