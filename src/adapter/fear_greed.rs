//! Crypto Fear & Greed index adapter
//!
//! Fetches the alternative.me index. The upstream reports the value as
//! a string; an unparseable value is defaulted to the neutral midpoint
//! rather than failing the call.

use super::{AdapterContext, AdapterResult, SignalAdapter};
use crate::feed::{Direction, Signal, SignalKind};
use crate::fetch::{FetchError, FetchOutcome};
use async_trait::async_trait;
use serde::Deserialize;

/// Default Fear & Greed API base URL
pub const FEAR_GREED_API_URL: &str = "https://api.alternative.me";

/// Neutral midpoint used when the upstream value does not parse
const NEUTRAL_MIDPOINT: f64 = 50.0;

/// alternative.me response envelope
#[derive(Debug, Deserialize)]
struct FngResponse {
    #[serde(default)]
    data: Vec<FngEntry>,
}

#[derive(Debug, Deserialize)]
struct FngEntry {
    /// Index value 0-100, reported as a string
    value: String,
    /// e.g. "Greed", "Extreme Fear"
    value_classification: Option<String>,
}

/// Adapter for the crypto Fear & Greed index
pub struct FearGreedAdapter {
    base_url: String,
}

impl FearGreedAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn normalize(entry: &FngEntry, ctx: &AdapterContext) -> Signal {
        let value = entry
            .value
            .parse::<f64>()
            .map(|v| v.clamp(0.0, 100.0))
            .unwrap_or(NEUTRAL_MIDPOINT);

        let classification = entry
            .value_classification
            .clone()
            .unwrap_or_else(|| classify(value).to_string());

        let direction = if value > 55.0 {
            Direction::Up
        } else if value < 45.0 {
            Direction::Down
        } else {
            Direction::Neutral
        };

        Signal {
            kind: SignalKind::FearGreed,
            label: format!("{} ({})", classification, value as i64),
            value: Some(value),
            prob: None,
            direction: Some(direction),
            ts: ctx.now,
        }
    }
}

impl Default for FearGreedAdapter {
    fn default() -> Self {
        Self::new(FEAR_GREED_API_URL)
    }
}

fn classify(value: f64) -> &'static str {
    match value {
        v if v < 25.0 => "Extreme Fear",
        v if v < 45.0 => "Fear",
        v if v <= 55.0 => "Neutral",
        v if v <= 75.0 => "Greed",
        _ => "Extreme Greed",
    }
}

#[async_trait]
impl SignalAdapter for FearGreedAdapter {
    fn name(&self) -> &'static str {
        "fear_greed"
    }

    async fn fetch(&self, ctx: &AdapterContext) -> AdapterResult {
        let prior = ctx.etags.get(self.name(), ctx.now).await;
        let url = format!("{}/fng/?limit=1", self.base_url);

        match ctx.http.get(&url, prior.as_deref(), ctx.timeout).await {
            Ok(FetchOutcome::NotModified { etag }) => AdapterResult::not_modified(etag.or(prior)),
            Ok(FetchOutcome::Ok { etag, body, .. }) => {
                let parsed: FngResponse = match serde_json::from_str(&body) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(error = %e, "Fear/greed payload did not decode");
                        return AdapterResult::failure();
                    }
                };
                let Some(entry) = parsed.data.first() else {
                    // Well-formed but empty: no usable data
                    return AdapterResult::failure();
                };
                let signal = Self::normalize(entry, ctx);
                if let Some(etag) = &etag {
                    ctx.etags.set(self.name(), etag, ctx.now).await;
                }
                AdapterResult::success(vec![signal], etag)
            }
            Err(FetchError::Timeout) => AdapterResult::timeout(),
            Err(e) => {
                tracing::warn!(error = %e, "Fear/greed fetch failed");
                AdapterResult::failure()
            }
        }
    }
}
