//! market-pulse: resilient multi-source market sentiment aggregation
//!
//! This library provides the core components for:
//! - Per-source circuit breakers with EMA failure tracking
//! - Conditional-request ETag storage
//! - Bounded, injectable HTTP fetching
//! - Signal adapters (fear/greed index, funding rate, prediction-market
//!   odds)
//! - Concurrent fan-out aggregation under a global wall-clock budget
//! - A two-tier cache (freshness + singleflight stale-while-revalidate)
//! - An HTTP API translating conditional requests into 304/200/stale
//!   responses
//! - Structured logging and Prometheus metrics

pub mod adapter;
pub mod aggregator;
pub mod api;
pub mod breaker;
pub mod cache;
pub mod cli;
pub mod config;
pub mod etag;
pub mod feed;
pub mod fetch;
pub mod runtime;
pub mod telemetry;
