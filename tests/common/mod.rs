//! Shared test doubles for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use market_pulse::fetch::{FetchError, FetchOutcome, HttpFetch};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// HttpFetch double that routes by URL substring
pub struct RoutedFetch {
    routes: HashMap<&'static str, Result<FetchOutcome, FetchError>>,
    calls: Arc<AtomicUsize>,
}

impl RoutedFetch {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn route(
        mut self,
        url_fragment: &'static str,
        response: Result<FetchOutcome, FetchError>,
    ) -> Self {
        self.routes.insert(url_fragment, response);
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl HttpFetch for RoutedFetch {
    async fn get(
        &self,
        url: &str,
        _etag: Option<&str>,
        _timeout: Duration,
    ) -> Result<FetchOutcome, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for (fragment, response) in &self.routes {
            if url.contains(fragment) {
                return response.clone();
            }
        }
        Err(FetchError::Transport(format!("no route for {url}")))
    }
}

/// A 200 response with the given body and no ETag
pub fn ok_body(body: &str) -> Result<FetchOutcome, FetchError> {
    Ok(FetchOutcome::Ok {
        status: 200,
        etag: None,
        body: body.to_string(),
    })
}

pub const FNG_BODY: &str =
    r#"{"data":[{"value":"72","value_classification":"Greed","timestamp":"1719000000"}]}"#;

pub const FUNDING_BODY: &str =
    r#"{"symbol":"BTCUSDT","markPrice":"64000.10","lastFundingRate":"0.00010000"}"#;

pub const GAMMA_BODY: &str = r#"[
    {"question":"Will BTC close above 100k this year?","outcomePrices":"[\"0.62\",\"0.38\"]"},
    {"question":"Fed cut in September?","outcomePrices":"[\"0.41\",\"0.59\"]"}
]"#;

/// Fetch double wired for a fully healthy round across all sources
pub fn healthy_fetch() -> RoutedFetch {
    RoutedFetch::new()
        .route("/fng/", ok_body(FNG_BODY))
        .route("premiumIndex", ok_body(FUNDING_BODY))
        .route("gamma-api", ok_body(GAMMA_BODY))
}
