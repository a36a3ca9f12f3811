//! Application-wide error types.
//!
//! [`AppError`] covers process-level failures (startup, config, serving).
//! [`LedgerError`] is the classified outcome of a single ledger operation;
//! the HTTP layer maps each variant to exactly one response.

use thiserror::Error;

use crate::ledger::EntryId;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Session token absent or malformed on an operation that needs one.
    #[error("missing or malformed session token")]
    InvalidSession,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("entry {0} not found")]
    NotFound(EntryId),

    /// Storage failure. Opaque to callers and never retried.
    #[error("store error: {0}")]
    Store(String),
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        AppError::Store(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("missing field".into());
        assert!(e.to_string().contains("config error"));
        assert!(e.to_string().contains("missing field"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AppError = io_err.into();
        assert!(e.to_string().contains("io error"));
        let _: &dyn Error = &e;
    }

    #[test]
    fn not_found_names_the_entry() {
        let id = EntryId::new();
        let e = LedgerError::NotFound(id);
        assert!(e.to_string().contains(&id.to_string()));
    }

    #[test]
    fn ledger_error_lifts_into_app_error() {
        let e: AppError = LedgerError::Store("disk full".into()).into();
        assert!(matches!(e, AppError::Store(ref msg) if msg.contains("disk full")));
    }
}
