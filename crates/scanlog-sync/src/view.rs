//! # Observed Code View
//!
//! The list of codes a UI renders, kept current by the coordinator.
//!
//! ## Refresh Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  begin_refresh() hands out tickets 1, 2, 3, ... before each request.    │
//! │                                                                         │
//! │  scan A ──► refresh #1 ─────────────────────────────► answer (stale)   │
//! │  scan B ──► refresh #2 ──────► answer                                   │
//! │                                  │                        │             │
//! │                          apply(#2) ✓ version+1    apply(#1) ✗ dropped  │
//! │                                                                         │
//! │  Only answers newer than the last applied ticket replace the list, so  │
//! │  a slow, older refetch never overwrites a newer one.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pending Entries
//! A scan shows up as `pending` as soon as it is captured. It leaves the
//! pending list when:
//! - a refresh contains its `scan_id` (it is now a confirmed entry), or
//! - a refresh issued after its create succeeded does not contain it
//!   (filtered out or already deleted remotely), or
//! - its create failed.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::debug;

use scanlog_core::ScannedCode;

// =============================================================================
// Snapshot Types
// =============================================================================

/// Whether the remote store has confirmed an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Came back from a refetch.
    Confirmed,
    /// Captured locally, not yet seen in a refetch.
    Pending,
}

/// One row of the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEntry {
    /// Remote id, once known.
    pub remote_id: Option<i64>,
    pub scan_id: Option<String>,
    pub data: String,
    #[serde(rename = "type")]
    pub code_type: String,
    pub state: EntryState,
}

impl From<ScannedCode> for ViewEntry {
    fn from(code: ScannedCode) -> Self {
        ViewEntry {
            remote_id: Some(code.id),
            scan_id: code.scan_id,
            data: code.data,
            code_type: code.code_type,
            state: EntryState::Confirmed,
        }
    }
}

/// What subscribers see.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    /// Bumped on every change.
    pub version: u64,
    /// Confirmed entries in remote order, then pending ones in capture order.
    pub entries: Vec<ViewEntry>,
    /// When the last refetch was applied.
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl ViewSnapshot {
    /// Number of entries still waiting for confirmation.
    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == EntryState::Pending)
            .count()
    }
}

/// Issued by [`CodeView::begin_refresh`]; orders refetch answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

// =============================================================================
// Code View
// =============================================================================

#[derive(Debug)]
struct PendingScan {
    scan_id: String,
    remote_id: Option<i64>,
    /// Last ticket issued when the create succeeded.
    confirmed_after: Option<u64>,
    data: String,
    code_type: String,
}

#[derive(Debug, Default)]
struct ViewState {
    version: u64,
    applied_ticket: u64,
    confirmed: Vec<ScannedCode>,
    pending: Vec<PendingScan>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl ViewState {
    fn snapshot(&self) -> ViewSnapshot {
        let confirmed_ids: HashSet<&str> = self
            .confirmed
            .iter()
            .filter_map(|c| c.scan_id.as_deref())
            .collect();

        let mut entries: Vec<ViewEntry> = self
            .confirmed
            .iter()
            .cloned()
            .map(ViewEntry::from)
            .collect();

        entries.extend(
            self.pending
                .iter()
                .filter(|p| !confirmed_ids.contains(p.scan_id.as_str()))
                .map(|p| ViewEntry {
                    remote_id: p.remote_id,
                    scan_id: Some(p.scan_id.clone()),
                    data: p.data.clone(),
                    code_type: p.code_type.clone(),
                    state: EntryState::Pending,
                }),
        );

        ViewSnapshot {
            version: self.version,
            entries,
            refreshed_at: self.refreshed_at,
        }
    }
}

/// The observed record list.
#[derive(Debug)]
pub struct CodeView {
    last_ticket: AtomicU64,
    state: Mutex<ViewState>,
    tx: watch::Sender<ViewSnapshot>,
}

impl Default for CodeView {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeView {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ViewSnapshot::default());
        CodeView {
            last_ticket: AtomicU64::new(0),
            state: Mutex::new(ViewState::default()),
            tx,
        }
    }

    /// Current contents.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.tx.borrow().clone()
    }

    /// Receiver that yields every new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.tx.subscribe()
    }

    /// Takes a ticket; call before issuing the list request.
    pub fn begin_refresh(&self) -> RefreshTicket {
        RefreshTicket(self.last_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Replaces the confirmed list with a refetch answer.
    ///
    /// ## Returns
    /// `false` if a newer answer was already applied and this one was dropped.
    pub async fn apply_refresh(&self, ticket: RefreshTicket, records: Vec<ScannedCode>) -> bool {
        let mut state = self.state.lock().await;

        if ticket.0 <= state.applied_ticket {
            debug!(
                ticket = ticket.0,
                applied = state.applied_ticket,
                "Dropping stale refresh"
            );
            return false;
        }

        let seen: HashSet<&str> = records
            .iter()
            .filter_map(|c| c.scan_id.as_deref())
            .collect();
        state.pending.retain(|p| {
            let in_answer = seen.contains(p.scan_id.as_str());
            let issued_after_create = p.confirmed_after.is_some_and(|t| ticket.0 > t);
            !in_answer && !issued_after_create
        });

        state.applied_ticket = ticket.0;
        state.confirmed = records;
        state.refreshed_at = Some(Utc::now());
        self.publish(&mut state);

        debug!(ticket = ticket.0, "Refresh applied");
        true
    }

    /// Shows a just-captured scan as pending.
    pub async fn add_pending(&self, scan_id: &str, data: &str, code_type: &str) {
        let mut state = self.state.lock().await;
        state.pending.push(PendingScan {
            scan_id: scan_id.to_string(),
            remote_id: None,
            confirmed_after: None,
            data: data.to_string(),
            code_type: code_type.to_string(),
        });
        self.publish(&mut state);
    }

    /// Records that the remote create for `scan_id` succeeded.
    pub async fn confirm_pending(&self, scan_id: &str, remote_id: i64) {
        let mut state = self.state.lock().await;
        let issued = self.last_ticket.load(Ordering::SeqCst);

        if let Some(p) = state.pending.iter_mut().find(|p| p.scan_id == scan_id) {
            p.remote_id = Some(remote_id);
            p.confirmed_after = Some(issued);
            self.publish(&mut state);
        }
    }

    /// Removes the pending entry of a scan whose create failed.
    pub async fn fail_pending(&self, scan_id: &str) {
        let mut state = self.state.lock().await;
        let before = state.pending.len();
        state.pending.retain(|p| p.scan_id != scan_id);

        if state.pending.len() != before {
            self.publish(&mut state);
        }
    }

    fn publish(&self, state: &mut ViewState) {
        state.version += 1;
        self.tx.send_replace(state.snapshot());
    }
}
