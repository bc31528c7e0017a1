//! Perp funding-rate adapter
//!
//! Fetches the Binance futures premium index for one symbol and turns
//! the current funding rate into a directional signal. Positive funding
//! means longs pay shorts, read as crowded-long (up) pressure.

use super::{AdapterContext, AdapterResult, SignalAdapter};
use crate::feed::{Direction, Signal, SignalKind};
use crate::fetch::{FetchError, FetchOutcome};
use async_trait::async_trait;
use serde::Deserialize;

/// Default Binance futures API base URL
pub const FUNDING_API_URL: &str = "https://fapi.binance.com";

/// Premium index response (fields we use)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PremiumIndex {
    symbol: String,
    /// Funding rate as a string, e.g. "0.00010000"
    last_funding_rate: Option<String>,
}

/// Adapter for the Binance BTC funding rate
pub struct FundingAdapter {
    base_url: String,
    symbol: String,
}

impl FundingAdapter {
    pub fn new(base_url: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            symbol: symbol.into(),
        }
    }

    fn normalize(index: &PremiumIndex, ctx: &AdapterContext) -> Signal {
        let rate = index
            .last_funding_rate
            .as_deref()
            .and_then(|r| r.parse::<f64>().ok())
            .unwrap_or(0.0);

        let direction = if rate > 0.0 {
            Direction::Up
        } else if rate < 0.0 {
            Direction::Down
        } else {
            Direction::Neutral
        };

        let asset = index.symbol.strip_suffix("USDT").unwrap_or(&index.symbol);

        Signal {
            kind: SignalKind::Funding,
            label: format!("{} funding {:+.4}%", asset, rate * 100.0),
            value: Some(rate),
            prob: None,
            direction: Some(direction),
            ts: ctx.now,
        }
    }
}

impl Default for FundingAdapter {
    fn default() -> Self {
        Self::new(FUNDING_API_URL, "BTCUSDT")
    }
}

#[async_trait]
impl SignalAdapter for FundingAdapter {
    fn name(&self) -> &'static str {
        "funding"
    }

    async fn fetch(&self, ctx: &AdapterContext) -> AdapterResult {
        let prior = ctx.etags.get(self.name(), ctx.now).await;
        let url = format!(
            "{}/fapi/v1/premiumIndex?symbol={}",
            self.base_url, self.symbol
        );

        match ctx.http.get(&url, prior.as_deref(), ctx.timeout).await {
            Ok(FetchOutcome::NotModified { etag }) => AdapterResult::not_modified(etag.or(prior)),
            Ok(FetchOutcome::Ok { etag, body, .. }) => {
                let index: PremiumIndex = match serde_json::from_str(&body) {
                    Ok(i) => i,
                    Err(e) => {
                        tracing::warn!(error = %e, "Funding payload did not decode");
                        return AdapterResult::failure();
                    }
                };
                let signal = Self::normalize(&index, ctx);
                if let Some(etag) = &etag {
                    ctx.etags.set(self.name(), etag, ctx.now).await;
                }
                AdapterResult::success(vec![signal], etag)
            }
            Err(FetchError::Timeout) => AdapterResult::timeout(),
            Err(e) => {
                tracing::warn!(error = %e, "Funding fetch failed");
                AdapterResult::failure()
            }
        }
    }
}
