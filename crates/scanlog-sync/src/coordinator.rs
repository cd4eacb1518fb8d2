//! # Sync Coordinator
//!
//! Turns each scan into a remote create, a device-store mirror write, and a
//! refetch of the observed list.
//!
//! ## Scan Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CaptureEvent { data, type }                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  scan_id = uuid (32 hex) ───────────► view.add_pending(scan_id)        │
//! │       │                                                                 │
//! │       ├──► remote.create({data, type, scanId}) ─┐                       │
//! │       │                                          ├─ concurrently        │
//! │       └──► local.insert_with_id(scan_id, ...)  ─┘                       │
//! │                                                                         │
//! │  create ok   → view.confirm_pending(scan_id, id)                       │
//! │  create err  → error! + view.fail_pending(scan_id)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  refresh(): ticket ──► remote.list(type_filter) ──► view.apply_refresh │
//! │  (always runs, whatever the create did)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ScanOutcome { scan_id, remote_id, error, local_written, ... }         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reconciliation
//! The device store is a write-through mirror. Nothing is replayed from it to
//! the remote store; a scan whose create failed stays only on the device.
//!
//! ## Run Loop
//! [`SyncCoordinator::start`] consumes a channel of capture events. Every
//! event gets its own task, so a slow remote never holds back the next
//! scan. The view stays ordered through refresh tickets, not arrival order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use scanlog_core::validation::generate_local_id;
use scanlog_core::CaptureEvent;
use scanlog_db::LocalStore;

use crate::client::RemoteCodes;
use crate::config::ClientConfig;
use crate::error::{SyncError, SyncResult};
use crate::view::CodeView;

// =============================================================================
// Configuration & Outcome
// =============================================================================

/// Coordinator behavior, usually derived from [`ClientConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Passed as `nc` on every refetch.
    pub type_filter: Option<String>,

    /// Write every scan to the device store too.
    pub mirror_local: bool,
}

impl From<&ClientConfig> for CoordinatorConfig {
    fn from(config: &ClientConfig) -> Self {
        CoordinatorConfig {
            type_filter: config.api.type_filter.clone(),
            mirror_local: config.local.mirror_scans,
        }
    }
}

/// What happened to one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Identity shared by both stores.
    pub scan_id: String,

    /// Id assigned by the remote store, if the create succeeded.
    pub remote_id: Option<i64>,

    /// Why the create failed.
    pub error: Option<String>,

    /// The device store holds the scan.
    pub local_written: bool,

    /// The refetch that followed replaced the view.
    pub refresh_applied: bool,
}

impl ScanOutcome {
    /// True when the remote store accepted the scan.
    pub fn is_success(&self) -> bool {
        self.remote_id.is_some()
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// Ties scan events to store writes and view refreshes.
#[derive(Debug, Clone)]
pub struct SyncCoordinator {
    remote: Arc<dyn RemoteCodes>,
    local: Arc<dyn LocalStore>,
    view: Arc<CodeView>,
    config: CoordinatorConfig,
}

impl SyncCoordinator {
    pub fn new(
        remote: Arc<dyn RemoteCodes>,
        local: Arc<dyn LocalStore>,
        config: CoordinatorConfig,
    ) -> Self {
        SyncCoordinator {
            remote,
            local,
            view: Arc::new(CodeView::new()),
            config,
        }
    }

    /// The observed list this coordinator keeps current.
    pub fn view(&self) -> Arc<CodeView> {
        Arc::clone(&self.view)
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Processes one scan.
    ///
    /// Never fails: remote and device-store errors are logged and reported
    /// in the returned [`ScanOutcome`].
    pub async fn handle_scan(&self, event: CaptureEvent) -> ScanOutcome {
        let scan_id = generate_local_id();
        debug!(scan_id = %scan_id, code_type = %event.code_type, "Scan received");

        if self.is_listed(&event.code_type) {
            self.view
                .add_pending(&scan_id, &event.data, &event.code_type)
                .await;
        }

        let body = event.clone().into_new_code(scan_id.clone());
        let (created, local_written) = tokio::join!(
            self.remote.create(&body),
            self.mirror_local(&scan_id, &event)
        );

        let (remote_id, error) = match created {
            Ok(created) => {
                info!(scan_id = %scan_id, id = %created.id, "Scan stored remotely");
                self.view.confirm_pending(&scan_id, created.id).await;
                (Some(created.id), None)
            }
            Err(e) => {
                error!(
                    scan_id = %scan_id,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Remote create failed"
                );
                self.view.fail_pending(&scan_id).await;
                (None, Some(e.to_string()))
            }
        };

        let refresh_applied = match self.refresh().await {
            Ok(applied) => applied,
            Err(e) => {
                warn!(scan_id = %scan_id, error = %e, "Refetch after scan failed");
                false
            }
        };

        ScanOutcome {
            scan_id,
            remote_id,
            error,
            local_written,
            refresh_applied,
        }
    }

    /// Runs [`handle_scan`](Self::handle_scan) on its own task.
    pub fn spawn_scan(&self, event: CaptureEvent) -> JoinHandle<ScanOutcome> {
        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.handle_scan(event).await })
    }

    /// Refetches the list and offers it to the view.
    ///
    /// ## Returns
    /// `true` if the answer replaced the view, `false` if a newer refetch
    /// had already been applied.
    ///
    /// ## Errors
    /// The remote store could not be listed.
    pub async fn refresh(&self) -> SyncResult<bool> {
        let ticket = self.view.begin_refresh();
        let records = self.remote.list(self.config.type_filter.as_deref()).await?;
        debug!(ticket = ticket.value(), count = records.len(), "Refetch answered");
        Ok(self.view.apply_refresh(ticket, records).await)
    }

    /// Starts the run loop over `events`.
    ///
    /// Outcomes are sent on the returned receiver in completion order. The
    /// loop ends when `events` closes or on [`CoordinatorHandle::shutdown`];
    /// scans already in flight still finish.
    pub fn start(
        &self,
        events: mpsc::Receiver<CaptureEvent>,
    ) -> (CoordinatorHandle, mpsc::UnboundedReceiver<ScanOutcome>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(self.clone().run(events, shutdown_rx, outcome_tx));

        (CoordinatorHandle { shutdown_tx, task }, outcome_rx)
    }

    async fn run(
        self,
        mut events: mpsc::Receiver<CaptureEvent>,
        mut shutdown_rx: mpsc::Receiver<()>,
        outcomes: mpsc::UnboundedSender<ScanOutcome>,
    ) {
        info!("Sync coordinator started");
        let mut in_flight: JoinSet<ScanOutcome> = JoinSet::new();

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => {
                            let coordinator = self.clone();
                            in_flight.spawn(async move { coordinator.handle_scan(event).await });
                        }
                        None => {
                            debug!("Capture channel closed");
                            break;
                        }
                    }
                }

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    forward(joined, &outcomes);
                }

                _ = shutdown_rx.recv() => {
                    info!("Sync coordinator received shutdown");
                    break;
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            forward(joined, &outcomes);
        }

        info!("Sync coordinator stopped");
    }

    fn is_listed(&self, code_type: &str) -> bool {
        self.config
            .type_filter
            .as_deref()
            .map_or(true, |filter| filter == code_type)
    }

    async fn mirror_local(&self, scan_id: &str, event: &CaptureEvent) -> bool {
        if !self.config.mirror_local || !self.local.is_available() {
            return false;
        }

        match self
            .local
            .insert_with_id(scan_id, &event.data, &event.code_type)
            .await
        {
            Ok(result) => result.rows_affected > 0,
            Err(e) => {
                warn!(scan_id = %scan_id, error = %e, "Device store write failed");
                false
            }
        }
    }
}

fn forward(joined: Result<ScanOutcome, JoinError>, outcomes: &mpsc::UnboundedSender<ScanOutcome>) {
    match joined {
        Ok(outcome) => {
            // Receiver gone means nobody is watching; the scan is still done
            let _ = outcomes.send(outcome);
        }
        Err(e) => error!(error = %e, "Scan task failed"),
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Controls a running coordinator loop.
#[derive(Debug)]
pub struct CoordinatorHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CoordinatorHandle {
    /// Asks the loop to stop taking new events.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }

    /// Waits for the loop and its in-flight scans to finish.
    pub async fn wait(self) -> SyncResult<()> {
        self.task
            .await
            .map_err(|e| SyncError::Internal(format!("coordinator task failed: {e}")))
    }
}
