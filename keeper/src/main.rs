//! Keeper - keep captured requests alive by replaying them on an interval.

use anyhow::Result;
use clap::Parser;

use keeper::cli::{execute, Cli};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    execute(cli).await
}
