//! # scanlog-feed
//!
//! Stands in for the camera: reads `<type> <data>` lines from stdin and runs
//! each one through the sync coordinator.
//!
//! ```text
//! $ printf 'qr ABC123\nean13 4006381333931\n' | scanlog-feed [client.toml]
//! ```
//!
//! Logs go to stderr; outcomes and the view go to stdout.

use std::path::PathBuf;

use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scanlog_db::StoreRegistry;
use scanlog_sync::feed::run_feed;
use scanlog_sync::ClientConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ClientConfig::load_or_default(std::env::args().nth(1).map(PathBuf::from));
    info!(api = %config.api.base_url, local = config.local.enabled, "Configuration loaded");

    let stdin = BufReader::new(tokio::io::stdin());
    run_feed(StoreRegistry::global(), &config, stdin).await?;

    Ok(())
}

/// Logs to stderr; `RUST_LOG` wins over the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scanlog=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
