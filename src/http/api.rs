//! Axum handlers for the `/transactions` routes.
//!
//! Each handler pulls the session token out of the cookie jar, runs the
//! matching [`LedgerService`](crate::ledger::LedgerService) call on the
//! blocking pool and renders the result. Every [`LedgerError`] maps to
//! exactly one status code.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::LedgerError;
use crate::ledger::NewEntry;

use super::{AppState, cookie};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Build a JSON error response body.
fn json_error(code: &str, msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": code, "message": format!("{msg}") }))
}

/// Run a blocking ledger call off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T, LedgerError>
where
    F: FnOnce() -> Result<T, LedgerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| LedgerError::Store(format!("ledger task join: {e}")))?
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        match self {
            LedgerError::InvalidSession => {
                (StatusCode::UNAUTHORIZED, json_error("invalid_session", &self)).into_response()
            }
            LedgerError::Validation(ref msg) => {
                (StatusCode::BAD_REQUEST, json_error("validation", msg)).into_response()
            }
            LedgerError::NotFound(_) => {
                (StatusCode::NOT_FOUND, Json(json!({ "transaction": null }))).into_response()
            }
            LedgerError::Store(ref msg) => {
                error!("ledger store failure: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, json_error("internal", "internal error"))
                    .into_response()
            }
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /health
pub(super) async fn health() -> Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}

/// GET /transactions: the caller's entries, oldest first.
pub(super) async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, LedgerError> {
    let token = state.session_token(&headers);
    let service = state.service.clone();
    let entries = run_blocking(move || service.list_entries(token.as_deref())).await?;
    Ok((StatusCode::OK, Json(json!({ "transactions": entries }))).into_response())
}

/// GET /transactions/summary
pub(super) async fn summary(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, LedgerError> {
    let token = state.session_token(&headers);
    let service = state.service.clone();
    let summary = run_blocking(move || service.summary(token.as_deref())).await?;
    Ok((StatusCode::OK, Json(json!({ "summary": summary }))).into_response())
}

/// GET /transactions/{id}
pub(super) async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, LedgerError> {
    let token = state.session_token(&headers);
    let service = state.service.clone();
    let entry = run_blocking(move || service.get_entry(token.as_deref(), &id)).await?;
    Ok((StatusCode::OK, Json(json!({ "transaction": entry }))).into_response())
}

/// POST /transactions: `201` with an empty body; sets the session cookie
/// when a new session was issued.
pub(super) async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewEntry>, JsonRejection>,
) -> Result<Response, LedgerError> {
    let Json(input) = payload.map_err(|rejection| {
        warn!("rejected create payload: {}", rejection.body_text());
        LedgerError::Validation(rejection.body_text())
    })?;

    let token = state.session_token(&headers);
    let service = state.service.clone();
    let created = run_blocking(move || service.create_entry(token.as_deref(), input)).await?;

    let mut response = StatusCode::CREATED.into_response();
    if let Some(session) = created.issued_session {
        match cookie::issue(&state.session.cookie_name, &session, state.session.max_age) {
            Some(value) => {
                response.headers_mut().insert(SET_COOKIE, value);
            }
            None => {
                return Err(LedgerError::Store(format!(
                    "cannot encode session cookie for {session}"
                )));
            }
        }
    }
    Ok(response)
}
