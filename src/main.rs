use clap::Parser;
use market_pulse::cli::{Cli, Commands};
use market_pulse::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration, falling back to defaults
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    market_pulse::telemetry::init_logging(&config.telemetry.log_level)?;

    match cli.command {
        Commands::Serve(args) => {
            tracing::info!("Starting signal API server");
            args.execute(config).await?;
        }
        Commands::Fetch(args) => {
            args.execute(config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Sources: fear_greed={} funding={} ({}) polymarket={}",
                config.sources.fear_greed_enabled,
                config.sources.funding_enabled,
                config.sources.funding_symbol,
                config.sources.polymarket_enabled
            );
            println!(
                "  Aggregator: adapter_timeout={}ms budget={}ms max_items={}",
                config.aggregator.adapter_timeout_ms,
                config.aggregator.budget_ms,
                config.aggregator.max_items
            );
            println!(
                "  Cache: ttl={}s swr={}s",
                config.cache.ttl_secs, config.cache.swr_secs
            );
            println!("  API: {}", config.api.listen);
        }
    }

    Ok(())
}
