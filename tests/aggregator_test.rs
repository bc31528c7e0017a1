//! End-to-end aggregation tests through the signals runtime

mod common;

use common::{healthy_fetch, ok_body, RoutedFetch};
use market_pulse::config::Config;
use market_pulse::feed::{Direction, SignalKind};
use market_pulse::fetch::FetchError;
use market_pulse::runtime::SignalsRuntime;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test]
async fn test_full_round_merges_all_sources_in_priority_order() {
    let runtime = SignalsRuntime::with_http(Config::default(), Arc::new(healthy_fetch()));
    let feed = runtime.get_signals(None).await;

    assert_eq!(feed.items.len(), 4);
    assert_eq!(feed.items[0].kind, SignalKind::FearGreed);
    assert_eq!(feed.items[0].label, "Greed (72)");
    assert_eq!(feed.items[0].value, Some(72.0));
    assert_eq!(feed.items[1].kind, SignalKind::Funding);
    assert_eq!(feed.items[1].direction, Some(Direction::Up));
    assert_eq!(feed.items[2].kind, SignalKind::Polymarket);
    assert_eq!(feed.items[2].prob, Some(0.62));
    assert_eq!(feed.items[3].prob, Some(0.41));
}

#[tokio::test]
async fn test_output_never_exceeds_max_items() {
    // Polymarket alone yields two items; pad the merge with a bigger
    // Gamma response to make sure truncation holds
    let big_gamma: String = {
        let markets: Vec<String> = (0..10)
            .map(|i| format!(r#"{{"question":"m{i}","outcomePrices":"[\"0.5\"]"}}"#))
            .collect();
        format!("[{}]", markets.join(","))
    };
    let fetch = RoutedFetch::new()
        .route("/fng/", ok_body(common::FNG_BODY))
        .route("premiumIndex", ok_body(common::FUNDING_BODY))
        .route("gamma-api", ok_body(&big_gamma));

    let runtime = SignalsRuntime::with_http(Config::default(), Arc::new(fetch));
    let feed = runtime.get_signals(None).await;
    assert!(feed.items.len() <= 5);
}

#[tokio::test]
async fn test_second_call_within_ttl_hits_l1() {
    let fetch = healthy_fetch();
    let calls = fetch.call_counter();
    let runtime = SignalsRuntime::with_http(Config::default(), Arc::new(fetch));

    let first = runtime.get_signals(None).await;
    let after_first = calls.load(Ordering::SeqCst);
    assert!(after_first >= 3);

    let second = runtime.get_signals(None).await;
    assert_eq!(calls.load(Ordering::SeqCst), after_first);
    assert_eq!(first.updated_at, second.updated_at);
}

#[tokio::test]
async fn test_one_dead_source_does_not_block_others() {
    let fetch = RoutedFetch::new()
        .route("/fng/", Err(FetchError::Status(500)))
        .route("premiumIndex", ok_body(common::FUNDING_BODY))
        .route("gamma-api", ok_body(common::GAMMA_BODY));

    let runtime = SignalsRuntime::with_http(Config::default(), Arc::new(fetch));
    let feed = runtime.get_signals(None).await;

    assert_eq!(feed.items.len(), 3);
    assert!(feed.items.iter().all(|s| s.kind != SignalKind::FearGreed));
}

#[tokio::test]
async fn test_all_sources_failing_yields_empty_feed_not_error() {
    let fetch = RoutedFetch::new()
        .route("/fng/", Err(FetchError::Status(502)))
        .route("premiumIndex", Err(FetchError::Timeout))
        .route("gamma-api", Err(FetchError::Transport("refused".into())));

    let runtime = SignalsRuntime::with_http(Config::default(), Arc::new(fetch));
    let feed = runtime.get_signals(None).await;
    assert!(feed.items.is_empty());
}

#[tokio::test]
async fn test_distinct_keys_aggregate_independently() {
    let fetch = healthy_fetch();
    let calls = fetch.call_counter();
    let runtime = SignalsRuntime::with_http(Config::default(), Arc::new(fetch));

    runtime.get_signals(Some("a")).await;
    let after_a = calls.load(Ordering::SeqCst);
    runtime.get_signals(Some("b")).await;
    assert!(calls.load(Ordering::SeqCst) > after_a);
}

#[tokio::test]
async fn test_disabled_source_is_never_fetched() {
    let mut config = Config::default();
    config.sources.polymarket_enabled = false;

    let runtime = SignalsRuntime::with_http(config, Arc::new(healthy_fetch()));
    let feed = runtime.get_signals(None).await;

    assert_eq!(feed.items.len(), 2);
    assert!(feed.items.iter().all(|s| s.kind != SignalKind::Polymarket));
}
