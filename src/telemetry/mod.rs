//! Telemetry module
//!
//! Structured logging plus metrics for adapter fetches, cache tiers,
//! and breaker state.

mod logging;
mod metrics;

pub use logging::init_logging;
pub use metrics::{
    install_metrics_exporter, record_cache_tier, record_fetch, set_breaker_state, CacheTier,
    FetchTelemetry,
};
