//! Per-source circuit breakers
//!
//! Each upstream source gets a rolling-failure-rate state machine:
//!
//! ```text
//! Closed -> Open:      failure EMA > 0.5 with at least 10 samples
//! Open -> HalfOpen:    60s cooldown elapsed (checked lazily in is_open)
//! HalfOpen -> Closed:  next outcome is a success
//! HalfOpen -> Open:    next outcome is a failure (backoff doubles)
//! ```
//!
//! The breaker never errors; it only advises whether a source should be
//! skipped this round.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// EMA smoothing factor for the failure rate
const EMA_ALPHA: f64 = 0.1;
/// Failure EMA above which a breaker trips
const TRIP_THRESHOLD: f64 = 0.5;
/// Minimum samples before a trip is allowed; prevents premature trips
/// on low-traffic sources
const MIN_WINDOW: u32 = 10;
/// Cooldown before an open breaker allows a probe
const COOLDOWN_SECS: i64 = 60;
/// Re-trip backoff bounds (tracked for observability only)
const BACKOFF_INITIAL_MS: u64 = 500;
const BACKOFF_MAX_MS: u64 = 8_000;

/// Breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Rolling-failure-rate state machine for one source
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreaker {
    pub state: BreakerState,
    pub failure_ema: f64,
    pub window_count: u32,
    pub opened_at: Option<DateTime<Utc>>,
    pub backoff_ms: u64,
    pub last_success: Option<DateTime<Utc>>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self {
            state: BreakerState::Closed,
            failure_ema: 0.0,
            window_count: 0,
            opened_at: None,
            backoff_ms: BACKOFF_INITIAL_MS,
            last_success: None,
        }
    }
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one adapter outcome into the breaker
    pub fn record_outcome(&mut self, success: bool, now: DateTime<Utc>) {
        match self.state {
            BreakerState::HalfOpen => {
                if success {
                    // Probe succeeded: full reset
                    self.state = BreakerState::Closed;
                    self.failure_ema = 0.0;
                    self.window_count = 0;
                    self.opened_at = None;
                    self.backoff_ms = BACKOFF_INITIAL_MS;
                    self.last_success = Some(now);
                } else {
                    self.state = BreakerState::Open;
                    self.opened_at = Some(now);
                    self.backoff_ms = (self.backoff_ms * 2).min(BACKOFF_MAX_MS);
                }
            }
            BreakerState::Closed | BreakerState::Open => {
                let failure = if success { 0.0 } else { 1.0 };
                self.failure_ema = EMA_ALPHA * failure + (1.0 - EMA_ALPHA) * self.failure_ema;
                self.window_count = self.window_count.saturating_add(1);
                if success {
                    self.last_success = Some(now);
                }
                // Late results from an already-open breaker update the
                // EMA but cannot re-arm the state machine
                if self.state == BreakerState::Closed
                    && self.failure_ema > TRIP_THRESHOLD
                    && self.window_count >= MIN_WINDOW
                {
                    self.state = BreakerState::Open;
                    self.opened_at = Some(now);
                    self.backoff_ms = BACKOFF_INITIAL_MS;
                }
            }
        }
    }

    /// Whether the source should be skipped right now
    ///
    /// An open breaker whose cooldown has elapsed moves to half-open
    /// and lets the next call through as a probe.
    pub fn is_open(&mut self, now: DateTime<Utc>) -> bool {
        if self.state == BreakerState::Open {
            let cooled = self
                .opened_at
                .map(|t| now.signed_duration_since(t) >= Duration::seconds(COOLDOWN_SECS))
                .unwrap_or(true);
            if cooled {
                self.state = BreakerState::HalfOpen;
                return false;
            }
            return true;
        }
        false
    }
}

/// Snapshot of one breaker for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub source: String,
    pub state: BreakerState,
    pub failure_ema: f64,
    pub window_count: u32,
    pub backoff_ms: u64,
    pub last_success: Option<DateTime<Utc>>,
}

/// Process-wide map of source name to breaker
#[derive(Clone)]
pub struct BreakerRegistry {
    inner: Arc<RwLock<HashMap<String, CircuitBreaker>>>,
}

impl BreakerRegistry {
    /// Create a registry with a closed breaker for each known source
    pub fn new(sources: &[&str]) -> Self {
        let map = sources
            .iter()
            .map(|s| (s.to_string(), CircuitBreaker::new()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Record a call outcome for `source`
    pub async fn record_outcome(
        &self,
        source: &str,
        success: bool,
        elapsed_ms: u64,
        now: DateTime<Utc>,
    ) {
        let mut map = self.inner.write().await;
        let breaker = map.entry(source.to_string()).or_default();
        breaker.record_outcome(success, now);
        tracing::debug!(
            source,
            success,
            elapsed_ms,
            state = ?breaker.state,
            failure_ema = breaker.failure_ema,
            "Breaker outcome recorded"
        );
        crate::telemetry::set_breaker_state(source, breaker.state);
    }

    /// Whether `source` is currently open (skipped)
    pub async fn is_open(&self, source: &str, now: DateTime<Utc>) -> bool {
        let mut map = self.inner.write().await;
        map.entry(source.to_string())
            .or_default()
            .is_open(now)
    }

    /// Whether every registered breaker is open
    pub async fn all_open(&self, now: DateTime<Utc>) -> bool {
        let mut map = self.inner.write().await;
        !map.is_empty() && map.values_mut().all(|b| b.is_open(now))
    }

    /// Diagnostic snapshot of every breaker
    pub async fn snapshot(&self) -> Vec<BreakerSnapshot> {
        let map = self.inner.read().await;
        let mut out: Vec<BreakerSnapshot> = map
            .iter()
            .map(|(source, b)| BreakerSnapshot {
                source: source.clone(),
                state: b.state,
                failure_ema: b.failure_ema,
                window_count: b.window_count,
                backoff_ms: b.backoff_ms,
                last_success: b.last_success,
            })
            .collect();
        out.sort_by(|a, b| a.source.cmp(&b.source));
        out
    }
}
