//! Ledger store backends.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use tracing::info;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::LedgerError;

use super::LedgerStore;

pub use memory::MemoryLedgerStore;
pub use sqlite::SqliteLedgerStore;

/// Build the store selected by `config`.
pub fn open(config: &StoreConfig) -> Result<Arc<dyn LedgerStore>, LedgerError> {
    let store: Arc<dyn LedgerStore> = match config.backend {
        StoreBackend::Sqlite => Arc::new(SqliteLedgerStore::open(&config.database_path)?),
        StoreBackend::Memory => Arc::new(MemoryLedgerStore::new()),
    };
    info!(
        backend = store.backend(),
        database_path = %config.database_path.display(),
        "ledger store ready"
    );
    Ok(store)
}
