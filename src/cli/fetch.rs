//! Fetch command implementation

use crate::config::Config;
use crate::runtime::SignalsRuntime;
use clap::Args;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Cache key to aggregate under
    #[arg(short, long)]
    pub key: Option<String>,
}

impl FetchArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let runtime = SignalsRuntime::new(config)?;
        let feed = runtime.get_signals(self.key.as_deref()).await;
        println!("{}", serde_json::to_string_pretty(&feed)?);
        Ok(())
    }
}
