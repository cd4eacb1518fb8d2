//! # Store Registry
//!
//! One owner for the device store per process.
//!
//! ```text
//! startup ──► StoreRegistry::global().install(store)   (once)
//!                 │
//! anywhere ──► acquire() ──► Arc<dyn LocalStore>
//!                 │
//! shutdown ──► teardown() ──► store.close(), slot emptied
//! ```
//!
//! A second `install` is refused rather than silently replacing a store that
//! other tasks may still hold.

use std::sync::{Arc, OnceLock};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::local::LocalStore;

static GLOBAL: OnceLock<StoreRegistry> = OnceLock::new();

/// Holder of the process-wide device store.
#[derive(Debug, Default)]
pub struct StoreRegistry {
    slot: RwLock<Option<Arc<dyn LocalStore>>>,
}

impl StoreRegistry {
    /// Creates an empty registry. Most callers want [`StoreRegistry::global`].
    pub fn new() -> Self {
        StoreRegistry {
            slot: RwLock::new(None),
        }
    }

    /// The registry shared by the whole process.
    pub fn global() -> &'static StoreRegistry {
        GLOBAL.get_or_init(StoreRegistry::new)
    }

    /// Installs `store` as the process store.
    ///
    /// ## Errors
    /// * `DbError::AlreadyInitialized` - a store is already installed
    pub async fn install(&self, store: Arc<dyn LocalStore>) -> DbResult<()> {
        let mut slot = self.slot.write().await;
        if slot.is_some() {
            return Err(DbError::AlreadyInitialized);
        }

        info!(available = store.is_available(), "Local store installed");
        *slot = Some(store);
        Ok(())
    }

    /// Returns the installed store.
    ///
    /// ## Errors
    /// * `DbError::NotInitialized` - nothing installed (or torn down)
    pub async fn acquire(&self) -> DbResult<Arc<dyn LocalStore>> {
        self.slot
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(DbError::NotInitialized)
    }

    /// Returns true if a store is installed.
    pub async fn is_installed(&self) -> bool {
        self.slot.read().await.is_some()
    }

    /// Closes and removes the installed store.
    ///
    /// ## Returns
    /// `true` if a store was torn down, `false` if the slot was already empty.
    pub async fn teardown(&self) -> DbResult<bool> {
        let store = self.slot.write().await.take();

        match store {
            Some(store) => {
                store.close().await?;
                info!("Local store torn down");
                Ok(true)
            }
            None => {
                debug!("Teardown with no store installed");
                Ok(false)
            }
        }
    }
}
