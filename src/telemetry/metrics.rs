//! Prometheus metrics

use crate::breaker::BreakerState;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Which cache tier answered a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    /// Conditional request matched the current ETag
    Hit304,
    /// Served from the fresh window
    Hit,
    /// Served stale while a background refresh runs
    Stale,
    /// Cold cache, blocking refresh
    Miss,
}

impl CacheTier {
    /// Diagnostic header value for this tier
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTier::Hit304 => "HIT-304",
            CacheTier::Hit => "HIT",
            CacheTier::Stale => "STALE",
            CacheTier::Miss => "MISS",
        }
    }
}

/// Start the Prometheus exporter on `addr`
pub fn install_metrics_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;
    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Record one adapter fetch outcome
pub fn record_fetch(source: &str, ok: bool, timed_out: bool, elapsed: Duration) {
    let outcome = if timed_out {
        "timeout"
    } else if ok {
        "ok"
    } else {
        "error"
    };
    metrics::counter!(
        "pulse_adapter_fetch_total",
        "source" => source.to_string(),
        "outcome" => outcome,
    )
    .increment(1);
    metrics::histogram!("pulse_adapter_fetch_ms", "source" => source.to_string())
        .record(elapsed.as_millis() as f64);

    tracing::debug!(
        source,
        ok,
        timed_out,
        elapsed_ms = elapsed.as_millis() as u64,
        "Adapter fetch settled"
    );
}

/// Record which cache tier served a response
pub fn record_cache_tier(tier: CacheTier) {
    metrics::counter!("pulse_cache_tier_total", "tier" => tier.as_str()).increment(1);
}

/// Export the current breaker state as a gauge (0 closed, 1 half-open, 2 open)
pub fn set_breaker_state(source: &str, state: BreakerState) {
    let value = match state {
        BreakerState::Closed => 0.0,
        BreakerState::HalfOpen => 1.0,
        BreakerState::Open => 2.0,
    };
    metrics::gauge!("pulse_breaker_state", "source" => source.to_string()).set(value);
}

/// Per-fetch telemetry sink handed to the aggregator's fan-out tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTelemetry;

impl FetchTelemetry {
    /// Mark the start of a fetch; the returned token feeds `end`
    pub fn start(&self, source: &str) -> Instant {
        tracing::trace!(source, "Adapter fetch started");
        Instant::now()
    }

    /// Mark the end of a fetch
    pub fn end(&self, source: &str, ok: bool, timed_out: bool, started: Instant) {
        record_fetch(source, ok, timed_out, started.elapsed());
    }
}
