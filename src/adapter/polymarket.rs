//! Prediction-market odds adapter
//!
//! Fetches the top Polymarket markets by 24h volume from the Gamma API
//! and surfaces the YES odds of each as a probability signal.

use super::{AdapterContext, AdapterResult, SignalAdapter};
use crate::feed::{Direction, Signal, SignalKind};
use crate::fetch::{FetchError, FetchOutcome};
use async_trait::async_trait;
use serde::Deserialize;

/// Default Gamma API base URL
pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";

/// Markets surfaced per round
const MARKET_LIMIT: usize = 2;

/// Raw market from the Gamma API (fields we use)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GammaMarket {
    question: String,
    /// Outcome prices as a JSON string, e.g. "[\"0.52\", \"0.48\"]"
    outcome_prices: Option<String>,
}

/// Adapter for Polymarket odds
pub struct PolymarketAdapter {
    base_url: String,
}

impl PolymarketAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn normalize(market: &GammaMarket, ctx: &AdapterContext) -> Signal {
        let prob = market
            .outcome_prices
            .as_deref()
            .and_then(parse_yes_price)
            .map(|p| p.clamp(0.0, 1.0))
            .unwrap_or(0.5);

        let direction = if prob > 0.55 {
            Direction::Up
        } else if prob < 0.45 {
            Direction::Down
        } else {
            Direction::Neutral
        };

        Signal {
            kind: SignalKind::Polymarket,
            label: market.question.clone(),
            value: None,
            prob: Some(prob),
            direction: Some(direction),
            ts: ctx.now,
        }
    }
}

impl Default for PolymarketAdapter {
    fn default() -> Self {
        Self::new(GAMMA_API_URL)
    }
}

/// Parse the YES price out of the stringified price array
fn parse_yes_price(prices_str: &str) -> Option<f64> {
    let prices: Vec<String> = serde_json::from_str(prices_str).ok()?;
    prices.first().and_then(|p| p.parse().ok())
}

#[async_trait]
impl SignalAdapter for PolymarketAdapter {
    fn name(&self) -> &'static str {
        "polymarket"
    }

    async fn fetch(&self, ctx: &AdapterContext) -> AdapterResult {
        let prior = ctx.etags.get(self.name(), ctx.now).await;
        let url = format!(
            "{}/markets?closed=false&order=volume24hr&ascending=false&limit={}",
            self.base_url, MARKET_LIMIT
        );

        match ctx.http.get(&url, prior.as_deref(), ctx.timeout).await {
            Ok(FetchOutcome::NotModified { etag }) => AdapterResult::not_modified(etag.or(prior)),
            Ok(FetchOutcome::Ok { etag, body, .. }) => {
                let markets: Vec<GammaMarket> = match serde_json::from_str(&body) {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!(error = %e, "Gamma payload did not decode");
                        return AdapterResult::failure();
                    }
                };
                if markets.is_empty() {
                    // Well-formed but empty: no usable data
                    return AdapterResult::failure();
                }
                let items = markets
                    .iter()
                    .take(MARKET_LIMIT)
                    .map(|m| Self::normalize(m, ctx))
                    .collect();
                if let Some(etag) = &etag {
                    ctx.etags.set(self.name(), etag, ctx.now).await;
                }
                AdapterResult::success(items, etag)
            }
            Err(FetchError::Timeout) => AdapterResult::timeout(),
            Err(e) => {
                tracing::warn!(error = %e, "Gamma fetch failed");
                AdapterResult::failure()
            }
        }
    }
}
