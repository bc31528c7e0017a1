//! Signal and feed payload types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Kind of market-context signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Crowd fear/greed index
    FearGreed,
    /// Perp funding rate
    Funding,
    /// Prediction-market odds
    Polymarket,
    /// Price trend context
    Trend,
    /// Free-form sentiment
    Sentiment,
}

/// Directional read of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

/// A single normalized market signal
///
/// Immutable once produced by an adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Signal kind
    #[serde(rename = "type")]
    pub kind: SignalKind,
    /// Human-readable label (e.g., "Greed (72)")
    pub label: String,
    /// Numeric value, if the signal carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Probability in [0, 1], for odds-style signals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prob: Option<f64>,
    /// Directional read, if meaningful
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Fetch/normalization timestamp
    pub ts: DateTime<Utc>,
}

/// Merged signal payload served to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalFeed {
    pub items: Vec<Signal>,
    /// Assembly time of this payload, not request-receipt time
    pub updated_at: DateTime<Utc>,
}

impl SignalFeed {
    /// An empty feed stamped at `now`
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            items: vec![],
            updated_at: now,
        }
    }

    /// Strong ETag for this payload: quoted, truncated SHA-256 of the
    /// serialized feed
    pub fn strong_etag(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&bytes);
        format!("\"{}\"", &hex::encode(digest)[..16])
    }
}
