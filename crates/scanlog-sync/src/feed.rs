//! # Line Feed
//!
//! Drives the coordinator from a text stream of `<type> <data>` lines. This
//! is the body of the `scanlog-feed` binary.
//!
//! ```text
//! install device store ──► run lines through the coordinator ──► teardown
//!                               │ (any error)                      ▲
//!                               └──────────────────────────────────┘
//! ```
//!
//! The registry is torn down whether the run succeeds or not.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use scanlog_core::CaptureEvent;
use scanlog_db::{open_local_store, StoreRegistry};

use crate::client::HttpCodesClient;
use crate::config::ClientConfig;
use crate::coordinator::{CoordinatorConfig, ScanOutcome, SyncCoordinator};
use crate::error::{SyncError, SyncResult};
use crate::view::{EntryState, ViewSnapshot};

/// Installs the device store in `registry`, feeds every line of `input`
/// through a coordinator, then tears the store down.
///
/// ## Errors
/// Store selection, client construction, input and task failures. The store
/// is closed before any of them is returned.
pub async fn run_feed<R>(registry: &StoreRegistry, config: &ClientConfig, input: R) -> SyncResult<()>
where
    R: AsyncBufRead + Unpin,
{
    registry
        .install(open_local_store(&config.local.store_config()).await?)
        .await?;

    let result = feed_lines(registry, config, input).await;

    match registry.teardown().await {
        Ok(_) => info!("Device store closed"),
        Err(e) => warn!(error = %e, "Device store teardown failed"),
    }

    result
}

async fn feed_lines<R>(registry: &StoreRegistry, config: &ClientConfig, input: R) -> SyncResult<()>
where
    R: AsyncBufRead + Unpin,
{
    let local = registry.acquire().await?;
    info!(available = local.is_available(), "Device store ready");

    let remote = Arc::new(HttpCodesClient::new(&config.api)?);
    let coordinator = SyncCoordinator::new(remote, local, CoordinatorConfig::from(config));

    match coordinator.refresh().await {
        Ok(_) => print_view(&coordinator.view().snapshot()),
        Err(e) => warn!(error = %e, "Initial load failed; starting with an empty view"),
    }

    let (tx, rx) = mpsc::channel(32);
    let (handle, mut outcomes) = coordinator.start(rx);

    let view = coordinator.view();
    let printer = tokio::spawn(async move {
        while let Some(outcome) = outcomes.recv().await {
            print_outcome(&outcome);
            print_view(&view.snapshot());
        }
    });

    let read = read_events(input, &tx).await;

    drop(tx);
    handle.wait().await?;
    printer
        .await
        .map_err(|e| SyncError::Internal(format!("printer task failed: {e}")))?;

    read
}

async fn read_events<R>(input: R, tx: &mpsc::Sender<CaptureEvent>) -> SyncResult<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match CaptureEvent::from_line(&line) {
            Ok(event) => {
                if tx.send(event).await.is_err() {
                    warn!("Coordinator stopped; discarding remaining input");
                    break;
                }
            }
            Err(e) => warn!(line = %line, error = %e, "Skipping unreadable line"),
        }
    }
    Ok(())
}

fn print_outcome(outcome: &ScanOutcome) {
    match (&outcome.remote_id, &outcome.error) {
        (Some(id), _) => println!("scan {} -> #{}", outcome.scan_id, id),
        (None, Some(error)) => println!("scan {} failed: {}", outcome.scan_id, error),
        (None, None) => println!("scan {} not stored", outcome.scan_id),
    }
    if outcome.local_written {
        println!("  mirrored on device");
    }
}

fn print_view(snapshot: &ViewSnapshot) {
    println!(
        "view v{} ({} entries, {} pending)",
        snapshot.version,
        snapshot.entries.len(),
        snapshot.pending_count()
    );

    for entry in &snapshot.entries {
        let id = entry
            .remote_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let marker = match entry.state {
            EntryState::Confirmed => ' ',
            EntryState::Pending => '*',
        };
        println!("  {marker}{id:>5}  {:<8} {}", entry.code_type, entry.data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RemoteCodes;
    use scanlog_api::{serve, ApiConfig, AppState};
    use scanlog_db::{Database, DbConfig};
    use std::path::PathBuf;
    use tokio::net::TcpListener;

    async fn spawn_api() -> String {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(db, ApiConfig::default());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(serve(listener, state, std::future::pending()));

        format!("http://{addr}/codigos")
    }

    fn config_for(base_url: String) -> ClientConfig {
        let mut config = ClientConfig::default();
        config.api.base_url = base_url;
        config.local.path = PathBuf::from(":memory:");
        config
    }

    #[tokio::test]
    async fn test_feed_stores_lines_and_tears_down() {
        let base = spawn_api().await;
        let registry = StoreRegistry::new();
        let input: &[u8] = b"qr ABC123\n\nean13 4006381333931\n";

        run_feed(&registry, &config_for(base.clone()), input)
            .await
            .unwrap();

        assert!(!registry.is_installed().await);

        let stored = HttpCodesClient::with_base_url(base)
            .unwrap()
            .list(None)
            .await
            .unwrap();
        // Lines run concurrently, so creation order is not fixed
        let mut types: Vec<&str> = stored.iter().map(|c| c.code_type.as_str()).collect();
        types.sort_unstable();
        assert_eq!(types, vec!["ean13", "qr"]);
    }

    #[tokio::test]
    async fn test_feed_tears_down_on_error() {
        let registry = StoreRegistry::new();
        // Not an http(s) URL, so the client cannot be built
        let config = config_for("ftp://127.0.0.1/codigos".to_string());
        let input: &[u8] = b"qr ABC123\n";

        let err = run_feed(&registry, &config, input).await.unwrap_err();

        assert!(err.is_config_error(), "{err:?}");
        assert!(!registry.is_installed().await);
    }
}
