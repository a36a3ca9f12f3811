//! `memory` store: in-process ledger, lost on restart.
//!
//! Entries live in a single `Vec` behind an `RwLock`; vector order is
//! insertion order.

use std::sync::RwLock;

use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::identity::SessionId;
use crate::ledger::{Entry, EntryId, LedgerStore};

#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    entries: RwLock<Vec<Entry>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Entry>>, LedgerError> {
        self.entries
            .read()
            .map_err(|_| LedgerError::Store("memory: lock poisoned".into()))
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn backend(&self) -> &str {
        "memory"
    }

    fn append(&self, entry: &Entry) -> Result<(), LedgerError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| LedgerError::Store("memory: lock poisoned".into()))?;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(LedgerError::Store(format!("memory: duplicate entry id {}", entry.id)));
        }
        entries.push(entry.clone());
        Ok(())
    }

    fn list_by_session(&self, session: &SessionId) -> Result<Vec<Entry>, LedgerError> {
        Ok(self
            .read()?
            .iter()
            .filter(|e| e.session_id == *session)
            .cloned()
            .collect())
    }

    fn find(&self, id: &EntryId) -> Result<Option<Entry>, LedgerError> {
        Ok(self.read()?.iter().find(|e| e.id == *id).cloned())
    }

    fn total(&self) -> Result<Decimal, LedgerError> {
        self.read()?
            .iter()
            .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.amount))
            .ok_or_else(|| LedgerError::Store("memory: sum amounts: decimal overflow".into()))
    }
}
