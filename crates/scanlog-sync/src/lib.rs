//! # scanlog-sync: Client-Side Sync for Scanlog
//!
//! Everything a scanning device runs: an HTTP client for the remote store,
//! the observed code list, and the coordinator that ties a scan to both.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Client Sync Architecture                         │
//! │                                                                         │
//! │  Capture collaborator (camera SDK, stdin in scanlog-feed)              │
//! │       │  CaptureEvent                                                   │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    SyncCoordinator                               │  │
//! │  │                                                                  │  │
//! │  │  One task per scan: create remotely, mirror locally, refetch    │  │
//! │  └──────┬──────────────────────┬──────────────────────┬────────────┘  │
//! │         ▼                      ▼                      ▼                │
//! │  ┌────────────────┐  ┌──────────────────┐  ┌────────────────────────┐ │
//! │  │ HttpCodesClient│  │ dyn LocalStore   │  │      CodeView          │ │
//! │  │                │  │                  │  │                        │ │
//! │  │ reqwest against│  │ from the global  │  │ versioned snapshots,   │ │
//! │  │ /codigos       │  │ StoreRegistry    │  │ pending entries,       │ │
//! │  │                │  │ (Sqlite or NoOp) │  │ watch subscribers      │ │
//! │  └────────────────┘  └──────────────────┘  └────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`client`] - `RemoteCodes` trait and its HTTP implementation
//! - [`config`] - Client configuration (remote URL, device store)
//! - [`coordinator`] - Scan → create → refetch
//! - [`view`] - The observed record list
//! - [`feed`] - Line-driven capture loop behind `scanlog-feed`
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scanlog_core::CaptureEvent;
//! use scanlog_db::{open_local_store, StoreRegistry};
//! use scanlog_sync::{ClientConfig, CoordinatorConfig, HttpCodesClient, SyncCoordinator};
//!
//! let config = ClientConfig::load_or_default(None);
//! StoreRegistry::global()
//!     .install(open_local_store(&config.local.store_config()).await?)
//!     .await?;
//!
//! let coordinator = SyncCoordinator::new(
//!     Arc::new(HttpCodesClient::new(&config.api)?),
//!     StoreRegistry::global().acquire().await?,
//!     CoordinatorConfig::from(&config),
//! );
//!
//! let outcome = coordinator.handle_scan(CaptureEvent::new("ABC123", "qr")).await;
//! println!("{:?}", coordinator.view().snapshot());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod feed;
pub mod view;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::{CreatedCode, HttpCodesClient, RemoteCodes};
pub use config::{ApiSettings, ClientConfig, LocalSettings};
pub use coordinator::{CoordinatorConfig, CoordinatorHandle, ScanOutcome, SyncCoordinator};
pub use error::{SyncError, SyncResult};
pub use feed::run_feed;
pub use view::{CodeView, EntryState, RefreshTicket, ViewEntry, ViewSnapshot};
