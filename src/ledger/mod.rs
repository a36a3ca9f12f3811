//! Ledger core: entry types, the sign policy, the store contract and the
//! service that owns the business rules.
//!
//! - **store**: [`LedgerStore`] trait implemented by every backend.
//! - **stores**: SQLite (durable) and in-process memory backends.
//! - **service**: [`LedgerService`]: create, list, get, summary.

mod service;
mod store;
pub mod stores;

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::identity::SessionId;

pub use service::{Created, LedgerService};
pub use store::LedgerStore;

// ── Identifiers ───────────────────────────────────────────────────────────────

/// Globally unique entry identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a caller-supplied id. A malformed id is a validation error,
    /// distinct from a well-formed id that matches nothing.
    ///
    /// Only the hyphenated form is accepted; braced, URN and simple forms
    /// are malformed.
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        let malformed = || LedgerError::Validation(format!("'{raw}' is not a valid entry id"));
        if raw.len() != 36 {
            return Err(malformed());
        }
        Uuid::try_parse(raw).map(Self).map_err(|_| malformed())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

// ── Entry kinds and sign policy ───────────────────────────────────────────────

/// Caller vocabulary for the direction of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Credit,
    Debit,
}

/// Derive the stored signed amount from a positive magnitude.
///
/// Callers never supply a sign; credits are stored as-is and debits negated,
/// so a balance is always a plain sum of stored amounts.
pub fn normalize_sign(magnitude: Decimal, kind: EntryKind) -> Decimal {
    match kind {
        EntryKind::Credit => magnitude,
        EntryKind::Debit => -magnitude,
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// One immutable ledger entry as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub title: String,
    /// Signed amount, already normalized.
    #[serde(with = "amount")]
    pub amount: Decimal,
    pub session_id: SessionId,
    /// RFC 3339 UTC insertion time.
    pub created_at: String,
}

/// Unvalidated input for a new entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEntry {
    pub title: String,
    /// Positive magnitude; the sign comes from `kind`.
    #[serde(deserialize_with = "amount::deserialize")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl NewEntry {
    pub(crate) fn validate(&self) -> Result<(), LedgerError> {
        if self.title.trim().is_empty() {
            return Err(LedgerError::Validation("title must not be empty".into()));
        }
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "amount must be a positive magnitude, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}

/// Aggregate balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    #[serde(serialize_with = "amount::serialize")]
    pub amount: Decimal,
}

/// Amounts travel as JSON numbers in both directions.
mod amount {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::{Deserialize, Deserializer, Serializer, de, ser};

    /// Integral amounts render as JSON integers, fractional ones as floats.
    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        if value.fract().is_zero() {
            if let Some(n) = value.to_i64() {
                return serializer.serialize_i64(n);
            }
        }
        let f = value.to_f64().ok_or_else(|| {
            <S::Error as ser::Error>::custom(format!("amount {value} has no float form"))
        })?;
        serializer.serialize_f64(f)
    }

    /// Numbers only; a numeric string is a type error. The float's shortest
    /// decimal rendering is parsed, so `12.5` and `0.1` arrive exact.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Decimal::from_str(&raw.to_string()).map_err(|e| {
            <D::Error as de::Error>::custom(format!("amount {raw} is out of range: {e}"))
        })
    }
}
