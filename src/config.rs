//! Configuration types for market-pulse

use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Upstream source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Enable the fear/greed index source
    #[serde(default = "default_true")]
    pub fear_greed_enabled: bool,
    #[serde(default = "default_fear_greed_url")]
    pub fear_greed_url: String,

    /// Enable the funding-rate source
    #[serde(default = "default_true")]
    pub funding_enabled: bool,
    #[serde(default = "default_funding_url")]
    pub funding_url: String,
    #[serde(default = "default_funding_symbol")]
    pub funding_symbol: String,

    /// Enable the prediction-market odds source
    #[serde(default = "default_true")]
    pub polymarket_enabled: bool,
    #[serde(default = "default_polymarket_url")]
    pub polymarket_url: String,
}

/// Fan-out and merge configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
    /// Per-adapter timeout (request is aborted at this bound)
    #[serde(default = "default_adapter_timeout_ms")]
    pub adapter_timeout_ms: u64,

    /// Global wall-clock budget across the whole fan-out
    #[serde(default = "default_budget_ms")]
    pub budget_ms: u64,

    /// Maximum merged item count
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

/// Cache window configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// L1 freshness TTL (also the L2 fresh window)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: i64,

    /// L2 stale-while-revalidate window past the TTL
    #[serde(default = "default_swr_secs")]
    pub swr_secs: i64,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Prometheus exporter port; disabled when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_true() -> bool {
    true
}
fn default_fear_greed_url() -> String {
    crate::adapter::FEAR_GREED_API_URL.to_string()
}
fn default_funding_url() -> String {
    crate::adapter::FUNDING_API_URL.to_string()
}
fn default_funding_symbol() -> String {
    "BTCUSDT".to_string()
}
fn default_polymarket_url() -> String {
    crate::adapter::GAMMA_API_URL.to_string()
}
fn default_adapter_timeout_ms() -> u64 {
    800
}
fn default_budget_ms() -> u64 {
    1_200
}
fn default_max_items() -> usize {
    5
}
fn default_ttl_secs() -> i64 {
    180
}
fn default_swr_secs() -> i64 {
    120
}
fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            fear_greed_enabled: true,
            fear_greed_url: default_fear_greed_url(),
            funding_enabled: true,
            funding_url: default_funding_url(),
            funding_symbol: default_funding_symbol(),
            polymarket_enabled: true,
            polymarket_url: default_polymarket_url(),
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            adapter_timeout_ms: default_adapter_timeout_ms(),
            budget_ms: default_budget_ms(),
            max_items: default_max_items(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            swr_secs: default_swr_secs(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
