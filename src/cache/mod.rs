//! Two-tier signal cache
//!
//! L1 (`FreshCache`) is a short-TTL map consulted before any network
//! work. L2 (`RevalidateCache`) serves stale-but-useful payloads while
//! a singleflight background refresh runs.

mod fresh;
mod swr;

pub use fresh::FreshCache;
pub use swr::{RefreshError, RevalidateCache};

use crate::feed::SignalFeed;
use chrono::{DateTime, Utc};

/// A cached payload; replaced wholesale on refresh, never mutated
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Strong ETag of the payload
    pub etag: String,
    pub payload: SignalFeed,
    /// Assembly time of the payload; ages are measured from here
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Build an entry from a freshly assembled feed
    pub fn from_feed(feed: SignalFeed) -> Self {
        Self {
            etag: feed.strong_etag(),
            stored_at: feed.updated_at,
            payload: feed,
        }
    }
}
