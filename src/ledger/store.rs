//! Store trait: the persistence contract the ledger service depends on.
//!
//! Stores are `Send + Sync` and do blocking I/O. Async callers dispatch
//! through `tokio::task::spawn_blocking` (see [`crate::http`]).

use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::identity::SessionId;

use super::{Entry, EntryId};

/// Durable, append-only record of ledger entries.
///
/// Implementations must make a completed [`append`](LedgerStore::append)
/// visible to every read issued after it returns, and must never expose a
/// partially written entry.
pub trait LedgerStore: Send + Sync {
    /// Backend name used in logs (e.g. `"sqlite"`).
    fn backend(&self) -> &str;

    fn append(&self, entry: &Entry) -> Result<(), LedgerError>;

    /// Entries owned by `session`, in insertion order.
    fn list_by_session(&self, session: &SessionId) -> Result<Vec<Entry>, LedgerError>;

    /// Look up by id alone, across all sessions.
    fn find(&self, id: &EntryId) -> Result<Option<Entry>, LedgerError>;

    /// Exact sum of every stored amount; zero when the store is empty.
    fn total(&self) -> Result<Decimal, LedgerError>;
}
