//! # scanlog-api server
//!
//! ```text
//! config ──► SQLite pool + migrations ──► bind ──► serve until Ctrl+C / SIGTERM
//! ```

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scanlog_api::{serve, ApiConfig, AppState};
use scanlog_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting scanlog API server...");

    let config = ApiConfig::load()?;
    info!(
        port = config.port,
        database = %config.database_path,
        mount_path = %config.mount_path,
        "Configuration loaded"
    );

    let db_config = DbConfig::new(&config.database_path).max_connections(config.max_connections);
    let db = Database::new(db_config).await?;
    info!("Database ready");

    let listener = TcpListener::bind(config.socket_addr()?).await?;
    let state = AppState::new(db.clone(), config);

    serve(listener, state, shutdown_signal()).await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `info` with debug output for scanlog crates.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scanlog=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
