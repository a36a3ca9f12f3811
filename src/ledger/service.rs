//! [`LedgerService`]: the only place business rules live.
//!
//! Every operation takes the caller's session token explicitly. How the token
//! travels (cookie, header) is the transport's concern.
//!
//! ## Scoping
//!
//! [`list_entries`](LedgerService::list_entries) is scoped to the caller's
//! session. [`get_entry`](LedgerService::get_entry) and
//! [`summary`](LedgerService::summary) only require a valid token and then
//! operate across every session: any session can read any entry by id and
//! the balance is store-wide. This asymmetry is deliberate pending a product
//! decision and is covered by tests so it cannot change silently.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info};

use crate::error::LedgerError;
use crate::identity::{self, SessionId};

use super::{Entry, EntryId, LedgerStore, NewEntry, Summary, normalize_sign};

/// Outcome of a successful creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    /// Set when no valid token was presented and a new session was minted.
    /// The caller must hand this back to the client.
    pub issued_session: Option<SessionId>,
}

/// The store is reference-counted.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Validate `input`, resolve the owning session and append one entry.
    ///
    /// An absent or malformed token is not an error here: a new session is
    /// issued instead. Input is validated first, so a rejected request never
    /// mints a session.
    pub fn create_entry(&self, token: Option<&str>, input: NewEntry) -> Result<Created, LedgerError> {
        input.validate()?;

        let (session_id, issued) = identity::resolve_or_issue(token);
        if issued {
            info!(%session_id, "issued new session");
        }

        let entry = Entry {
            id: EntryId::new(),
            title: input.title,
            amount: normalize_sign(input.amount, input.kind),
            session_id,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        self.store.append(&entry)?;

        debug!(entry_id = %entry.id, %session_id, amount = %entry.amount, "entry created");

        Ok(Created { issued_session: issued.then_some(session_id) })
    }

    /// Every entry of the caller's session, oldest first.
    pub fn list_entries(&self, token: Option<&str>) -> Result<Vec<Entry>, LedgerError> {
        let session_id = identity::require(token)?;
        self.store.list_by_session(&session_id)
    }

    /// Fetch one entry by id. Not restricted to the caller's session.
    pub fn get_entry(&self, token: Option<&str>, entry_id: &str) -> Result<Entry, LedgerError> {
        identity::require(token)?;
        let id = EntryId::parse(entry_id)?;
        self.store.find(&id)?.ok_or(LedgerError::NotFound(id))
    }

    /// Store-wide balance. Not restricted to the caller's session.
    pub fn summary(&self, token: Option<&str>) -> Result<Summary, LedgerError> {
        identity::require(token)?;
        Ok(Summary { amount: self.store.total()? })
    }
}
