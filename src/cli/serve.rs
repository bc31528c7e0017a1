//! Serve command implementation

use crate::config::Config;
use crate::runtime::SignalsRuntime;
use clap::Args;
use std::net::SocketAddr;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the configured listen address
    #[arg(short, long)]
    pub listen: Option<String>,
}

impl ServeArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        if let Some(port) = config.telemetry.metrics_port {
            let addr = SocketAddr::from(([127, 0, 0, 1], port));
            crate::telemetry::install_metrics_exporter(addr)?;
        }

        let listen = self
            .listen
            .clone()
            .unwrap_or_else(|| config.api.listen.clone());

        let runtime = SignalsRuntime::new(config)?;
        let app = crate::api::router(runtime);

        let listener = tokio::net::TcpListener::bind(&listen).await?;
        tracing::info!(%listen, "Signal API listening");
        axum::serve(listener, app).await?;
        Ok(())
    }
}
