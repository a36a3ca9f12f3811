// Library root: exposes the ledger core and transport for integration tests.
// The binary entry point is src/main.rs.

pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod ledger;
pub mod logger;
