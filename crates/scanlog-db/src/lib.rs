//! # scanlog-db: Database Layer for Scanlog
//!
//! SQLite storage for both ends of the system: the remote record store
//! served over HTTP, and the small table each scanning device keeps.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scanlog Data Flow                                │
//! │                                                                         │
//! │  scanlog-api handlers            scanlog-sync coordinator              │
//! │       │                                │                                │
//! │       ▼                                ▼                                │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    scanlog-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐   │   │
//! │  │   │   Database    │   │  LocalStore   │   │ StoreRegistry │   │   │
//! │  │   │   (pool.rs)   │   │  (local.rs)   │   │ (registry.rs) │   │   │
//! │  │   │               │   │               │   │               │   │   │
//! │  │   │ CodeRepository│   │ Sqlite / NoOp │   │ process-wide  │   │   │
//! │  │   │ migrations    │   │ `codigos`     │   │ owner         │   │   │
//! │  │   └───────────────┘   └───────────────┘   └───────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                │                                │
//! │       ▼                                ▼                                │
//! │  scanlog.db (`codes`)            scanlog-local.db (`codigos`)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded migrations for the remote store
//! - [`repository`] - Remote store queries
//! - [`local`] - Device store trait and implementations
//! - [`registry`] - Process-wide device store ownership
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scanlog_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("scanlog.db")).await?;
//! let codes = db.codes().list(Some("qr")).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod local;
pub mod migrations;
pub mod pool;
pub mod registry;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use local::{
    open_local_store, open_local_store_with, LocalStore, LocalStoreConfig, NoOpLocalStore,
    SqliteLocalStore, StorageCapability, WriteResult,
};
pub use pool::{Database, DbConfig};
pub use registry::StoreRegistry;
pub use repository::CodeRepository;
