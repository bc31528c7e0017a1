//! CLI interface for market-pulse
//!
//! Provides subcommands for:
//! - `serve`: run the HTTP API
//! - `fetch`: one-shot aggregation, printed as JSON
//! - `config`: show the effective configuration

mod fetch;
mod serve;

pub use fetch::FetchArgs;
pub use serve::ServeArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "market-pulse")]
#[command(about = "Resilient multi-source market sentiment signal aggregator")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),
    /// Fetch the current signal feed once and print it
    Fetch(FetchArgs),
    /// Show the effective configuration
    Config,
}
