//! Signals runtime
//!
//! Explicitly constructed owner of all process-wide mutable state:
//! breaker registry, ETag store, both cache tiers, the HTTP client,
//! and the adapter list. Passed around by `Arc` handle; nothing here
//! is a module-level singleton, so tests get full isolation.

use crate::adapter::{FearGreedAdapter, FundingAdapter, PolymarketAdapter, SignalAdapter};
use crate::aggregator::FeedAggregator;
use crate::breaker::BreakerRegistry;
use crate::cache::{RefreshError, RevalidateCache};
use crate::config::Config;
use crate::etag::EtagStore;
use crate::feed::SignalFeed;
use crate::fetch::{HttpFetch, ReqwestFetch};
use std::sync::Arc;

/// Owner of the signal-aggregation state for one process
pub struct SignalsRuntime {
    config: Config,
    pub breakers: BreakerRegistry,
    pub l2: RevalidateCache,
    aggregator: FeedAggregator,
}

impl SignalsRuntime {
    /// Build a runtime with the production HTTP client
    pub fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let http: Arc<dyn HttpFetch> = Arc::new(ReqwestFetch::new()?);
        Ok(Self::with_http(config, http))
    }

    /// Build a runtime around an injected HTTP primitive
    pub fn with_http(config: Config, http: Arc<dyn HttpFetch>) -> Arc<Self> {
        let mut adapters: Vec<Arc<dyn SignalAdapter>> = Vec::new();
        let sources = &config.sources;
        if sources.fear_greed_enabled {
            adapters.push(Arc::new(FearGreedAdapter::new(
                sources.fear_greed_url.clone(),
            )));
        }
        if sources.funding_enabled {
            adapters.push(Arc::new(FundingAdapter::new(
                sources.funding_url.clone(),
                sources.funding_symbol.clone(),
            )));
        }
        if sources.polymarket_enabled {
            adapters.push(Arc::new(PolymarketAdapter::new(
                sources.polymarket_url.clone(),
            )));
        }

        let names: Vec<&str> = adapters.iter().map(|a| a.name()).collect();
        let breakers = BreakerRegistry::new(&names);
        let etags = EtagStore::new();
        let l1 = crate::cache::FreshCache::new(config.cache.ttl_secs);
        let l2 = RevalidateCache::new(config.cache.ttl_secs, config.cache.swr_secs);

        let aggregator = FeedAggregator::new(
            adapters,
            breakers.clone(),
            etags,
            l1,
            l2.clone(),
            http,
            &config.aggregator,
        );

        Arc::new(Self {
            config,
            breakers,
            l2,
            aggregator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current signal payload; total, never errors
    pub async fn get_signals(&self, key: Option<&str>) -> SignalFeed {
        self.aggregator.get_signals(key).await
    }

    /// Refresh the L2 entry for `key` through the singleflight guard
    pub async fn refresh(self: &Arc<Self>, key: &str) -> Result<SignalFeed, RefreshError> {
        let runtime = Arc::clone(self);
        let owned_key = key.to_string();
        self.l2
            .get_or_refresh(key, async move {
                Ok(runtime.get_signals(Some(&owned_key)).await)
            })
            .await
    }
}
