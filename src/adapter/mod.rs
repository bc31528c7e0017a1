//! Signal adapters
//!
//! One adapter per upstream source. Each performs a single bounded,
//! conditional HTTP fetch and normalizes the response into `Signal`s.
//! Adapters are total: every failure mode is folded into the returned
//! `AdapterResult` so the aggregator can feed the right breaker.

mod fear_greed;
mod funding;
mod polymarket;

pub use fear_greed::{FearGreedAdapter, FEAR_GREED_API_URL};
pub use funding::{FundingAdapter, FUNDING_API_URL};
pub use polymarket::{PolymarketAdapter, GAMMA_API_URL};

use crate::etag::EtagStore;
use crate::feed::Signal;
use crate::fetch::HttpFetch;
use crate::telemetry::FetchTelemetry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Everything an adapter needs for one fetch
#[derive(Clone)]
pub struct AdapterContext {
    /// Wall-clock time the round started
    pub now: DateTime<Utc>,
    /// Per-call timeout; the underlying request is aborted at this bound
    pub timeout: Duration,
    /// Shared conditional-request ETag store
    pub etags: EtagStore,
    /// Injectable HTTP primitive
    pub http: Arc<dyn HttpFetch>,
    /// Per-fetch telemetry sink
    pub telemetry: FetchTelemetry,
}

/// Outcome of one adapter invocation; transient, never persisted
#[derive(Debug, Clone, Default)]
pub struct AdapterResult {
    pub items: Vec<Signal>,
    pub ok: bool,
    pub timed_out: bool,
    pub etag: Option<String>,
}

impl AdapterResult {
    /// Fresh data was fetched and normalized
    pub fn success(items: Vec<Signal>, etag: Option<String>) -> Self {
        Self {
            items,
            ok: true,
            timed_out: false,
            etag,
        }
    }

    /// Upstream said 304: success with no new data, not a breaker failure
    pub fn not_modified(etag: Option<String>) -> Self {
        Self {
            items: vec![],
            ok: true,
            timed_out: false,
            etag,
        }
    }

    /// HTTP or decode failure
    pub fn failure() -> Self {
        Self {
            items: vec![],
            ok: false,
            timed_out: false,
            etag: None,
        }
    }

    /// Request aborted at the timeout bound
    pub fn timeout() -> Self {
        Self {
            items: vec![],
            ok: false,
            timed_out: true,
            etag: None,
        }
    }
}

/// One upstream sentiment/market-signal source
#[async_trait]
pub trait SignalAdapter: Send + Sync {
    /// Stable source name; keys the breaker and ETag maps
    fn name(&self) -> &'static str;

    /// Perform one bounded fetch. Must not panic and must honor
    /// `ctx.timeout`.
    async fn fetch(&self, ctx: &AdapterContext) -> AdapterResult;
}
