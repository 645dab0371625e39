//! Mind Mosaic HTTP API
//!
//! Axum server exposing quiz sessions as explicit objects driven by discrete
//! actions. Every response carries the screen the client should draw next.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a pure
//! inner function returning `(StatusCode, body)`, so the logic is testable
//! without axum dispatch.
//!
//! Endpoints:
//! - GET    /health                — health check
//! - GET    /version               — server version info
//! - POST   /sessions              — create a session, returns the welcome screen
//! - GET    /sessions/:id          — current screen
//! - POST   /sessions/:id/actions  — apply one action (start, answer, navigate, generate_post)
//! - GET    /sessions/:id/report   — PDF report download
//! - DELETE /sessions/:id          — end a session

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use mosaic_core::report::{REPORT_FILE_NAME, REPORT_MIME};
use mosaic_core::config::SessionConfig;
use mosaic_core::{
    CompletionError, MosaicConfig, MosaicError, MosaicServices, QuizAction, SessionError,
    SessionStore,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::router;

/// Shared state for all HTTP handlers
pub struct HttpState {
    pub store: SessionStore,
    pub services: MosaicServices,
    pub config: MosaicConfig,
}

impl HttpState {
    pub fn new(services: MosaicServices, config: MosaicConfig) -> Self {
        Self {
            store: SessionStore::new(),
            services,
            config,
        }
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/sessions", post(create_session_handler))
        .route(
            "/sessions/:id",
            get(screen_handler).delete(end_session_handler),
        )
        .route("/sessions/:id/actions", post(action_handler))
        .route("/sessions/:id/report", get(report_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    services: MosaicServices,
    config: MosaicConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let session_config = config.session.clone();
    let state = Arc::new(HttpState::new(services, config));

    tokio::spawn(run_session_sweeper(
        Arc::clone(&state),
        session_config,
        shutdown.resubscribe(),
    ));

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Mind Mosaic HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

/// Periodically drop sessions idle for longer than the configured timeout.
pub async fn run_session_sweeper(
    state: Arc<HttpState>,
    config: SessionConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let max_idle = std::time::Duration::from_secs(config.idle_timeout_seconds);
    let mut ticker =
        tokio::time::interval(std::time::Duration::from_secs(config.sweep_interval_seconds.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!(
        "Session sweeper started (idle timeout: {}s)",
        config.idle_timeout_seconds
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evicted = state.store.evict_idle(max_idle).await;
                if evicted > 0 {
                    tracing::info!(evicted, "Expired idle sessions");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Session sweeper shutting down");
                break;
            }
        }
    }
}

// ============================================================================
// Error mapping
// ============================================================================

/// HTTP status for a domain error.
pub fn error_status(error: &MosaicError) -> StatusCode {
    match error {
        MosaicError::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
        MosaicError::Session(SessionError::InvalidSelection { .. }) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        MosaicError::Session(_) => StatusCode::CONFLICT,
        MosaicError::Completion(CompletionError::Api { .. })
        | MosaicError::Completion(CompletionError::Http(_))
        | MosaicError::Completion(CompletionError::EmptyResponse) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_body(error: &MosaicError) -> (StatusCode, serde_json::Value) {
    let status = error_status(error);
    if status.is_server_error() {
        tracing::error!(error = %error, "Request failed");
    } else {
        tracing::warn!(error = %error, "Request rejected");
    }
    (
        status,
        serde_json::json!({
            "error": error.to_string(),
            "status": "error",
        }),
    )
}

fn screen_body(
    result: std::result::Result<mosaic_core::Screen, MosaicError>,
    ok: StatusCode,
) -> (StatusCode, serde_json::Value) {
    match result.map(serde_json::to_value) {
        Ok(Ok(body)) => (ok, body),
        Ok(Err(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": e.to_string(), "status": "error" }),
        ),
        Err(e) => error_body(&e),
    }
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

pub async fn health_inner(state: &HttpState) -> (StatusCode, serde_json::Value) {
    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "classifier": state.services.classifier.name(),
            "completion_model": state.services.completions.model(),
            "sessions": state.store.len().await,
        }),
    )
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "mosaic/1",
    })
}

/// Create a session and render its welcome screen.
pub async fn create_session_inner(state: &HttpState) -> (StatusCode, serde_json::Value) {
    let session = state.store.create().await;
    let result = mosaic_core::views::render(&session, &state.services).await;
    if result.is_err() {
        // The welcome quote failed; don't leave an orphan session behind.
        let _ = state.store.remove(session.id).await;
    }
    screen_body(result, StatusCode::CREATED)
}

pub async fn screen_inner(state: &HttpState, id: Uuid) -> (StatusCode, serde_json::Value) {
    let result = router::current_screen(id, &state.store, &state.services).await;
    screen_body(result, StatusCode::OK)
}

pub async fn action_inner(
    state: &HttpState,
    id: Uuid,
    action: QuizAction,
) -> (StatusCode, serde_json::Value) {
    let result = router::handle_action(action, id, &state.store, &state.services).await;
    screen_body(result, StatusCode::OK)
}

pub async fn end_session_inner(state: &HttpState, id: Uuid) -> (StatusCode, serde_json::Value) {
    match state.store.remove(id).await {
        Ok(()) => (
            StatusCode::OK,
            serde_json::json!({ "ended": true, "session_id": id }),
        ),
        Err(e) => error_body(&MosaicError::from(e)),
    }
}

pub async fn report_inner(
    state: &HttpState,
    id: Uuid,
) -> std::result::Result<Vec<u8>, (StatusCode, serde_json::Value)> {
    router::report(id, &state.store, &state.services)
        .await
        .map_err(|e| error_body(&e))
}

// ============================================================================
// Axum handler wrappers
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn create_session_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = create_session_inner(&state).await;
    (status, Json(body))
}

pub async fn screen_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let (status, body) = screen_inner(&state, id).await;
    (status, Json(body))
}

pub async fn action_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<Uuid>,
    Json(action): Json<QuizAction>,
) -> impl IntoResponse {
    let (status, body) = action_inner(&state, id, action).await;
    (status, Json(body))
}

pub async fn end_session_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let (status, body) = end_session_inner(&state, id).await;
    (status, Json(body))
}

pub async fn report_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<Uuid>,
) -> Response {
    match report_inner(&state, id).await {
        Ok(pdf) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, REPORT_MIME.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{REPORT_FILE_NAME}\""),
                ),
            ],
            Bytes::from(pdf),
        )
            .into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
