//! Anonymous session identity: issuance and validation of session tokens.
//!
//! A session is never stored as a record of its own. It exists only as the
//! `session_id` partition key carried by each ledger entry, so issuing an id
//! has no side effects and validating one says nothing about whether the
//! session owns any entries.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;

/// Opaque 128-bit session identifier, rendered as a hyphenated UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// Mint a fresh session id (UUID v4, OS randomness).
pub fn issue() -> SessionId {
    SessionId(Uuid::new_v4())
}

/// Accept `token` iff it is a hyphenated UUID.
///
/// Only the shape is checked: braced, URN and simple (no hyphen) forms are
/// rejected; only the shape [`issue`] hands out is accepted.
pub fn validate(token: &str) -> Result<SessionId, LedgerError> {
    if token.len() != 36 {
        return Err(LedgerError::InvalidSession);
    }
    Uuid::try_parse(token)
        .map(SessionId)
        .map_err(|_| LedgerError::InvalidSession)
}

/// Validate an optional token, treating absence the same as malformed.
pub fn require(token: Option<&str>) -> Result<SessionId, LedgerError> {
    token.ok_or(LedgerError::InvalidSession).and_then(validate)
}

/// Reuse a valid token or issue a new id. The flag is `true` when a new id
/// was minted and must be handed back to the client.
pub fn resolve_or_issue(token: Option<&str>) -> (SessionId, bool) {
    match token.map(validate) {
        Some(Ok(id)) => (id, false),
        _ => (issue(), true),
    }
}
