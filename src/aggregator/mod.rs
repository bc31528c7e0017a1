//! Feed aggregator
//!
//! Fans out to every non-open-circuit adapter concurrently, merges the
//! settled results under a global wall-clock budget, and maintains the
//! L1 cache. The public contract is total: `get_signals` always returns
//! a valid payload, trading freshness for availability.

use crate::adapter::{AdapterContext, AdapterResult, SignalAdapter};
use crate::breaker::BreakerRegistry;
use crate::cache::{CacheEntry, FreshCache, RevalidateCache};
use crate::config::AggregatorConfig;
use crate::etag::EtagStore;
use crate::feed::SignalFeed;
use crate::fetch::HttpFetch;
use crate::telemetry::FetchTelemetry;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Cache key used when the caller does not supply one
pub const DEFAULT_KEY: &str = "default";

/// Concurrent fan-out/merge over the adapter registry
pub struct FeedAggregator {
    adapters: Vec<Arc<dyn SignalAdapter>>,
    breakers: BreakerRegistry,
    etags: EtagStore,
    l1: FreshCache,
    l2: RevalidateCache,
    http: Arc<dyn HttpFetch>,
    adapter_timeout: Duration,
    budget: Duration,
    max_items: usize,
}

impl FeedAggregator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        adapters: Vec<Arc<dyn SignalAdapter>>,
        breakers: BreakerRegistry,
        etags: EtagStore,
        l1: FreshCache,
        l2: RevalidateCache,
        http: Arc<dyn HttpFetch>,
        config: &AggregatorConfig,
    ) -> Self {
        Self {
            adapters,
            breakers,
            etags,
            l1,
            l2,
            http,
            adapter_timeout: Duration::from_millis(config.adapter_timeout_ms),
            budget: Duration::from_millis(config.budget_ms),
            max_items: config.max_items,
        }
    }

    /// Produce the current signal payload for `key`
    ///
    /// Order of service: fresh L1 entry, then (if every breaker is
    /// open) the L2 stale tier or an empty feed, then a live fan-out.
    /// Never errors.
    pub async fn get_signals(&self, key: Option<&str>) -> SignalFeed {
        let key = key.unwrap_or(DEFAULT_KEY);
        let now = Utc::now();

        if let Some(entry) = self.l1.get(key, now).await {
            tracing::debug!(key, "Serving from L1 freshness cache");
            return entry.payload;
        }

        // Breakers are consulted only after an L1 miss
        let mut live: Vec<(usize, Arc<dyn SignalAdapter>)> = Vec::new();
        for (idx, adapter) in self.adapters.iter().enumerate() {
            if !self.breakers.is_open(adapter.name(), now).await {
                live.push((idx, adapter.clone()));
            }
        }

        if live.is_empty() {
            if let Some(entry) = self.l2.get_stale_but_serveable(key, now).await {
                tracing::warn!(key, "All source breakers open; serving stale payload");
                return entry.payload;
            }
            tracing::warn!(key, "All source breakers open, no stale payload; serving empty feed");
            return SignalFeed::empty(Utc::now());
        }

        let results = self.fan_out(&live).await;

        // Merge in adapter declaration order; no re-sorting
        let mut items = Vec::new();
        for (idx, _) in &live {
            if let Some(result) = results.get(idx) {
                if result.ok {
                    items.extend(result.items.iter().cloned());
                }
            }
        }
        items.truncate(self.max_items);

        let feed = SignalFeed {
            items,
            updated_at: Utc::now(),
        };

        // An empty merge (e.g. a 304-only round) must not clobber the
        // last-good L1 entry
        if !feed.items.is_empty() || self.l1.peek(key).await.is_none() {
            self.l1.insert(key, CacheEntry::from_feed(feed.clone())).await;
        }

        feed
    }

    /// Spawn one task per live adapter and collect results until all
    /// settle or the global budget elapses
    ///
    /// Late tasks are not cancelled: they keep running so their breaker
    /// and telemetry state stays accurate, but their results are not
    /// used for this response.
    async fn fan_out(
        &self,
        live: &[(usize, Arc<dyn SignalAdapter>)],
    ) -> HashMap<usize, AdapterResult> {
        let (tx, mut rx) = mpsc::channel(live.len());

        for (idx, adapter) in live {
            let ctx = AdapterContext {
                now: Utc::now(),
                timeout: self.adapter_timeout,
                etags: self.etags.clone(),
                http: self.http.clone(),
                telemetry: FetchTelemetry,
            };
            let breakers = self.breakers.clone();
            let adapter = adapter.clone();
            let idx = *idx;
            let tx = tx.clone();

            tokio::spawn(async move {
                let source = adapter.name();
                let token = ctx.telemetry.start(source);
                let result = adapter.fetch(&ctx).await;
                let elapsed_ms = token.elapsed().as_millis() as u64;
                ctx.telemetry.end(source, result.ok, result.timed_out, token);
                breakers
                    .record_outcome(source, result.ok, elapsed_ms, Utc::now())
                    .await;
                let _ = tx.send((idx, result)).await;
            });
        }
        drop(tx);

        let mut results = HashMap::new();
        let deadline = tokio::time::Instant::now() + self.budget;
        while results.len() < live.len() {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some((idx, result))) => {
                    results.insert(idx, result);
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        settled = results.len(),
                        total = live.len(),
                        "Aggregation budget elapsed; proceeding with settled sources"
                    );
                    break;
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Signal, SignalKind};
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Adapter returning a canned result after an optional delay
    struct ScriptedAdapter {
        name: &'static str,
        delay: Duration,
        result: AdapterResult,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedAdapter {
        fn new(name: &'static str, result: AdapterResult) -> Self {
            Self {
                name,
                delay: Duration::ZERO,
                result,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl SignalAdapter for ScriptedAdapter {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self, _ctx: &AdapterContext) -> AdapterResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone()
        }
    }

    /// HttpFetch stub; never reached by ScriptedAdapter
    struct NoFetch;

    #[async_trait]
    impl HttpFetch for NoFetch {
        async fn get(
            &self,
            _url: &str,
            _etag: Option<&str>,
            _timeout: Duration,
        ) -> Result<crate::fetch::FetchOutcome, crate::fetch::FetchError> {
            Err(crate::fetch::FetchError::Transport("unused".into()))
        }
    }

    fn signal(kind: SignalKind, label: &str) -> Signal {
        Signal {
            kind,
            label: label.to_string(),
            value: None,
            prob: None,
            direction: None,
            ts: Utc::now(),
        }
    }

    fn items(kind: SignalKind, labels: &[&str]) -> Vec<Signal> {
        labels.iter().map(|l| signal(kind, l)).collect()
    }

    struct Harness {
        breakers: BreakerRegistry,
        l1: FreshCache,
        l2: RevalidateCache,
    }

    fn build(
        adapters: Vec<Arc<dyn SignalAdapter>>,
        config: &AggregatorConfig,
        l1_ttl_secs: i64,
    ) -> (FeedAggregator, Harness) {
        let names: Vec<&str> = adapters.iter().map(|a| a.name()).collect();
        let breakers = BreakerRegistry::new(&names);
        let l1 = FreshCache::new(l1_ttl_secs);
        let l2 = RevalidateCache::new(180, 120);
        let aggregator = FeedAggregator::new(
            adapters,
            breakers.clone(),
            EtagStore::new(),
            l1.clone(),
            l2.clone(),
            Arc::new(NoFetch),
            config,
        );
        (
            aggregator,
            Harness { breakers, l1, l2 },
        )
    }

    #[tokio::test]
    async fn test_merges_in_declaration_order_and_truncates() {
        let a = ScriptedAdapter::new(
            "fear_greed",
            AdapterResult::success(items(SignalKind::FearGreed, &["fg1", "fg2"]), None),
        );
        let b = ScriptedAdapter::new(
            "funding",
            AdapterResult::success(items(SignalKind::Funding, &["f1", "f2"]), None),
        );
        let c = ScriptedAdapter::new(
            "polymarket",
            AdapterResult::success(items(SignalKind::Polymarket, &["p1", "p2"]), None),
        );
        let (aggregator, _h) = build(
            vec![Arc::new(a), Arc::new(b), Arc::new(c)],
            &AggregatorConfig::default(),
            180,
        );

        let feed = aggregator.get_signals(None).await;
        assert_eq!(feed.items.len(), 5);
        let labels: Vec<&str> = feed.items.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["fg1", "fg2", "f1", "f2", "p1"]);
    }

    #[tokio::test]
    async fn test_l1_hit_skips_adapters() {
        let adapter = ScriptedAdapter::new(
            "fear_greed",
            AdapterResult::success(items(SignalKind::FearGreed, &["fresh"]), None),
        );
        let calls = adapter.calls.clone();
        let (aggregator, h) = build(vec![Arc::new(adapter)], &AggregatorConfig::default(), 180);

        let cached = SignalFeed {
            items: items(SignalKind::Sentiment, &["cached"]),
            updated_at: Utc::now(),
        };
        h.l1.insert(DEFAULT_KEY, CacheEntry::from_feed(cached)).await;

        let feed = aggregator.get_signals(None).await;
        assert_eq!(feed.items[0].label, "cached");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_l1_triggers_new_round() {
        let adapter = ScriptedAdapter::new(
            "fear_greed",
            AdapterResult::success(items(SignalKind::FearGreed, &["fresh"]), None),
        );
        let calls = adapter.calls.clone();
        // Zero TTL: any entry is already expired by the next call
        let (aggregator, h) = build(vec![Arc::new(adapter)], &AggregatorConfig::default(), 0);

        let stale = SignalFeed {
            items: items(SignalKind::Sentiment, &["old"]),
            updated_at: Utc::now(),
        };
        h.l1.insert(DEFAULT_KEY, CacheEntry::from_feed(stale)).await;

        let feed = aggregator.get_signals(None).await;
        assert_eq!(feed.items[0].label, "fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_adapter_contributes_nothing() {
        let good = ScriptedAdapter::new(
            "funding",
            AdapterResult::success(items(SignalKind::Funding, &["ok"]), None),
        );
        let bad = ScriptedAdapter::new("polymarket", AdapterResult::failure());
        let (aggregator, _h) = build(
            vec![Arc::new(good), Arc::new(bad)],
            &AggregatorConfig::default(),
            180,
        );

        let feed = aggregator.get_signals(None).await;
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].label, "ok");
    }

    #[tokio::test]
    async fn test_budget_elapsed_returns_empty_and_records_breakers() {
        let slow = |name| {
            ScriptedAdapter::new(name, AdapterResult::timeout())
                .with_delay(Duration::from_millis(150))
        };
        let config = AggregatorConfig {
            adapter_timeout_ms: 100,
            budget_ms: 50,
            max_items: 5,
        };
        let (aggregator, h) = build(
            vec![Arc::new(slow("fear_greed")), Arc::new(slow("funding"))],
            &config,
            180,
        );

        let feed = aggregator.get_signals(None).await;
        assert!(feed.items.is_empty());

        // Late tasks still settle and feed their breakers exactly once
        tokio::time::sleep(Duration::from_millis(250)).await;
        for snap in h.breakers.snapshot().await {
            assert_eq!(snap.window_count, 1, "source {}", snap.source);
        }
    }

    #[tokio::test]
    async fn test_all_open_serves_stale_l2() {
        let adapter = ScriptedAdapter::new("fear_greed", AdapterResult::failure());
        let calls = adapter.calls.clone();
        let (aggregator, h) = build(vec![Arc::new(adapter)], &AggregatorConfig::default(), 180);

        let now = Utc::now();
        for _ in 0..10 {
            h.breakers.record_outcome("fear_greed", false, 5, now).await;
        }

        let stale_feed = SignalFeed {
            items: items(SignalKind::Sentiment, &["stale"]),
            updated_at: now - ChronoDuration::seconds(200),
        };
        h.l2.store(DEFAULT_KEY, CacheEntry::from_feed(stale_feed)).await;

        let feed = aggregator.get_signals(None).await;
        assert_eq!(feed.items[0].label, "stale");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_open_without_stale_serves_empty() {
        let adapter = ScriptedAdapter::new("fear_greed", AdapterResult::failure());
        let (aggregator, h) = build(vec![Arc::new(adapter)], &AggregatorConfig::default(), 180);

        let now = Utc::now();
        for _ in 0..10 {
            h.breakers.record_outcome("fear_greed", false, 5, now).await;
        }

        let feed = aggregator.get_signals(None).await;
        assert!(feed.items.is_empty());
    }

    #[tokio::test]
    async fn test_not_modified_round_preserves_l1() {
        let adapter = ScriptedAdapter::new(
            "fear_greed",
            AdapterResult::not_modified(Some("\"abc\"".to_string())),
        );
        // Zero TTL so the old entry misses but is still present
        let (aggregator, h) = build(vec![Arc::new(adapter)], &AggregatorConfig::default(), 0);

        let good = SignalFeed {
            items: items(SignalKind::FearGreed, &["last-good"]),
            updated_at: Utc::now(),
        };
        h.l1.insert(DEFAULT_KEY, CacheEntry::from_feed(good)).await;

        let feed = aggregator.get_signals(None).await;
        assert!(feed.items.is_empty());

        // The empty 304-only merge did not overwrite the stored payload
        let kept = h.l1.peek(DEFAULT_KEY).await.unwrap();
        assert_eq!(kept.payload.items[0].label, "last-good");
    }

    #[tokio::test]
    async fn test_not_modified_does_not_fail_breaker() {
        let adapter = ScriptedAdapter::new(
            "fear_greed",
            AdapterResult::not_modified(Some("\"abc\"".to_string())),
        );
        let (aggregator, h) = build(vec![Arc::new(adapter)], &AggregatorConfig::default(), 0);

        aggregator.get_signals(None).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let snapshot = h.breakers.snapshot().await;
        assert_eq!(snapshot[0].failure_ema, 0.0);
    }
}
