//! # Device-Local Store
//!
//! The embedded table a scanning device keeps next to the remote store.
//!
//! ## Capability Selection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     open_local_store(config)                            │
//! │                                                                         │
//! │  StorageCapability::detect()                                           │
//! │       │                                                                 │
//! │       ├── Embedded + enabled ──► SqliteLocalStore  (table `codigos`)   │
//! │       │                                                                 │
//! │       └── Unsupported / disabled ──► NoOpLocalStore                    │
//! │                                       every call succeeds, writes      │
//! │                                       nothing, lists nothing           │
//! │                                                                         │
//! │  Both sit behind Arc<dyn LocalStore>; callers never branch on which.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Table Shape
//! ```text
//! codigos
//! ├── id    TEXT PK  DEFAULT lower(hex(randomblob(16)))   32 hex chars
//! ├── data  TEXT     DEFAULT ''
//! └── type  TEXT     DEFAULT 'QR'
//! ```

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteQueryResult;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::{create_pool, DbConfig};
use scanlog_core::LocalCode;

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS codigos (
    id   TEXT PRIMARY KEY NOT NULL DEFAULT (lower(hex(randomblob(16)))),
    data TEXT NOT NULL DEFAULT '',
    type TEXT NOT NULL DEFAULT 'QR'
)
"#;

// =============================================================================
// Write Result
// =============================================================================

/// Outcome of a write against the device store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    /// Rows the statement changed.
    pub rows_affected: u64,

    /// SQLite rowid of the last inserted row (0 when nothing was inserted).
    pub last_insert_rowid: i64,
}

impl From<SqliteQueryResult> for WriteResult {
    fn from(result: SqliteQueryResult) -> Self {
        WriteResult {
            rows_affected: result.rows_affected(),
            last_insert_rowid: result.last_insert_rowid(),
        }
    }
}

// =============================================================================
// LocalStore Trait
// =============================================================================

/// Operations the device store offers.
///
/// Implementations must be cheap to share: the coordinator and the
/// registry both hold an `Arc<dyn LocalStore>`.
#[async_trait]
pub trait LocalStore: Send + Sync + Debug {
    /// Whether writes are actually persisted.
    fn is_available(&self) -> bool;

    /// Creates the table if missing. Safe to call repeatedly.
    async fn init_schema(&self) -> DbResult<()>;

    /// Inserts a row with a store-generated id.
    async fn insert(&self, data: &str, code_type: &str) -> DbResult<WriteResult>;

    /// Inserts a row under a caller-chosen id.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - the id is already taken
    async fn insert_with_id(&self, id: &str, data: &str, code_type: &str)
        -> DbResult<WriteResult>;

    /// Returns every row in insertion order.
    async fn list_all(&self) -> DbResult<Vec<LocalCode>>;

    /// Drops the table. `init_schema` recreates it.
    async fn drop_table(&self) -> DbResult<()>;

    /// Releases the underlying handle. Later calls fail with
    /// `DbError::Closed`; closing twice is a no-op.
    async fn close(&self) -> DbResult<()>;
}

// =============================================================================
// SQLite Implementation
// =============================================================================

/// Device store backed by an embedded SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteLocalStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteLocalStore {
    /// Opens the store and ensures the table exists.
    ///
    /// The store holds exactly one connection for its whole life, whatever
    /// pool size `config` asks for.
    ///
    /// ## Arguments
    /// * `config` - Pool configuration; `run_migrations` is ignored since
    ///   the device table is created directly
    pub async fn open(config: &DbConfig) -> DbResult<Self> {
        let config = config.clone().single_connection();
        let pool = create_pool(&config).await?;
        let store = SqliteLocalStore {
            pool,
            path: config.database_path.clone(),
        };

        store.init_schema().await?;
        info!(path = %store.path.display(), "Local store ready");

        Ok(store)
    }

    /// Opens an isolated in-memory store (for testing).
    pub async fn in_memory() -> DbResult<Self> {
        SqliteLocalStore::open(&DbConfig::in_memory()).await
    }

    /// Path of the backing file (`:memory:` for in-memory stores).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks if the store can execute queries.
    pub async fn health_check(&self) -> bool {
        !self.pool.is_closed() && sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    fn ensure_open(&self) -> DbResult<()> {
        if self.pool.is_closed() {
            return Err(DbError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    fn is_available(&self) -> bool {
        true
    }

    async fn init_schema(&self) -> DbResult<()> {
        self.ensure_open()?;
        sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
        debug!("Local table ensured");
        Ok(())
    }

    async fn insert(&self, data: &str, code_type: &str) -> DbResult<WriteResult> {
        self.ensure_open()?;

        let result = sqlx::query("INSERT INTO codigos (data, type) VALUES (?1, ?2)")
            .bind(data)
            .bind(code_type)
            .execute(&self.pool)
            .await?;

        debug!(code_type = %code_type, "Local code inserted");
        Ok(result.into())
    }

    async fn insert_with_id(
        &self,
        id: &str,
        data: &str,
        code_type: &str,
    ) -> DbResult<WriteResult> {
        self.ensure_open()?;

        let result = sqlx::query("INSERT INTO codigos (id, data, type) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(data)
            .bind(code_type)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                    field,
                    value: id.to_string(),
                },
                other => other,
            })?;

        debug!(id = %id, code_type = %code_type, "Local code inserted");
        Ok(result.into())
    }

    async fn list_all(&self) -> DbResult<Vec<LocalCode>> {
        self.ensure_open()?;

        let codes =
            sqlx::query_as::<_, LocalCode>("SELECT id, data, type FROM codigos ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;

        Ok(codes)
    }

    async fn drop_table(&self) -> DbResult<()> {
        self.ensure_open()?;
        sqlx::query("DROP TABLE IF EXISTS codigos")
            .execute(&self.pool)
            .await?;
        info!(path = %self.path.display(), "Local table dropped");
        Ok(())
    }

    async fn close(&self) -> DbResult<()> {
        if self.pool.is_closed() {
            return Ok(());
        }
        info!(path = %self.path.display(), "Closing local store");
        self.pool.close().await;
        Ok(())
    }
}

// =============================================================================
// No-Op Implementation
// =============================================================================

/// Device store for platforms without embedded storage.
///
/// Every operation succeeds and nothing is kept.
#[derive(Debug, Clone, Default)]
pub struct NoOpLocalStore;

impl NoOpLocalStore {
    pub fn new() -> Self {
        NoOpLocalStore
    }
}

#[async_trait]
impl LocalStore for NoOpLocalStore {
    fn is_available(&self) -> bool {
        false
    }

    async fn init_schema(&self) -> DbResult<()> {
        Ok(())
    }

    async fn insert(&self, _data: &str, _code_type: &str) -> DbResult<WriteResult> {
        Ok(WriteResult::default())
    }

    async fn insert_with_id(
        &self,
        _id: &str,
        _data: &str,
        _code_type: &str,
    ) -> DbResult<WriteResult> {
        Ok(WriteResult::default())
    }

    async fn list_all(&self) -> DbResult<Vec<LocalCode>> {
        Ok(Vec::new())
    }

    async fn drop_table(&self) -> DbResult<()> {
        Ok(())
    }

    async fn close(&self) -> DbResult<()> {
        Ok(())
    }
}

// =============================================================================
// Capability Detection
// =============================================================================

/// Whether the current target can host the embedded store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageCapability {
    /// SQLite file storage is available.
    Embedded,
    /// No embedded storage (browser builds).
    Unsupported,
}

impl StorageCapability {
    /// Detects the capability of the compilation target.
    pub fn detect() -> Self {
        if cfg!(target_family = "wasm") {
            StorageCapability::Unsupported
        } else {
            StorageCapability::Embedded
        }
    }
}

/// `[local]` section of the client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalStoreConfig {
    /// Turn the device store off even where it is supported.
    pub enabled: bool,

    /// SQLite file for the device store, or `:memory:`.
    pub path: PathBuf,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        LocalStoreConfig {
            enabled: true,
            path: PathBuf::from("scanlog-local.db"),
        }
    }
}

/// Opens the device store appropriate for this platform.
pub async fn open_local_store(config: &LocalStoreConfig) -> DbResult<Arc<dyn LocalStore>> {
    open_local_store_with(StorageCapability::detect(), config).await
}

/// Opens the device store for an explicit capability.
pub async fn open_local_store_with(
    capability: StorageCapability,
    config: &LocalStoreConfig,
) -> DbResult<Arc<dyn LocalStore>> {
    match (capability, config.enabled) {
        (StorageCapability::Embedded, true) => {
            let store = SqliteLocalStore::open(&DbConfig::new(&config.path)).await?;
            Ok(Arc::new(store))
        }
        (StorageCapability::Unsupported, _) => {
            warn!("Embedded storage unsupported on this platform, local store disabled");
            Ok(Arc::new(NoOpLocalStore::new()))
        }
        (StorageCapability::Embedded, false) => {
            info!("Local store disabled by configuration");
            Ok(Arc::new(NoOpLocalStore::new()))
        }
    }
}
