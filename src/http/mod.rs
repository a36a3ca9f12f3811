//! Axum-based HTTP transport for the ledger.
//!
//! ## URL layout
//!
//! ```text
//! GET  /health
//! GET  /transactions             : caller's entries
//! POST /transactions             : create; may set the session cookie
//! GET  /transactions/summary     : store-wide balance
//! GET  /transactions/{id}
//! ```
//!
//! The session token travels in a cookie (name and lifetime from
//! [`SessionConfig`]); handlers translate it into the explicit token the
//! ledger service expects.

mod api;
pub mod cookie;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, http::HeaderMap, routing::get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::SessionConfig;
use crate::error::AppError;
use crate::ledger::LedgerService;

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler via [`axum::extract::State`].
///
/// All fields are reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub service: LedgerService,
    pub session: Arc<SessionConfig>,
}

impl AppState {
    pub fn new(service: LedgerService, session: SessionConfig) -> Self {
        Self { service, session: Arc::new(session) }
    }

    fn session_token(&self, headers: &HeaderMap) -> Option<String> {
        cookie::read(headers, &self.session.cookie_name)
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health",               get(api::health))
        .route("/transactions",         get(api::list).post(api::create))
        .route("/transactions/summary", get(api::summary))
        .route("/transactions/{id}",    get(api::get))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Server loop ───────────────────────────────────────────────────────────────

pub struct HttpServer {
    bind_addr: SocketAddr,
    state: AppState,
}

impl HttpServer {
    pub fn new(bind_addr: SocketAddr, state: AppState) -> Self {
        Self { bind_addr, state }
    }

    /// Bind and serve until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), AppError> {
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .map_err(|e| AppError::Http(format!("bind failed on {}: {e}", self.bind_addr)))?;
        self.run_on(listener, shutdown).await
    }

    /// Serve on an already-bound listener.
    pub async fn run_on(self, listener: TcpListener, shutdown: CancellationToken) -> Result<(), AppError> {
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "http server listening");

        axum::serve(listener, build_router(self.state))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| AppError::Http(format!("server error: {e}")))?;

        info!("http server shut down");
        Ok(())
    }
}
