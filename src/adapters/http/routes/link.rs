use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, middleware::require_user},
    app_error::{AppError, AppResult},
    application::ports::link_runtime::SurfacedError,
    domain::entities::{caller::Caller, link_session::CallbackResult, scope::ScopeSet},
};

/// Returns a router for the popup link flow.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{provider}/connect", post(connect))
        .route("/{provider}/callback", post(callback))
        .route("/{provider}/window-closed", post(window_closed))
        .route("/{provider}/status", get(status))
        .route("/{provider}/disconnect", post(disconnect))
        .route("/{provider}/handoff", post(take_handoff))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct ConnectPayload {
    #[serde(default)]
    scopes: ScopeSet,
}

#[derive(Serialize)]
struct LinkStatusResponse {
    pending: bool,
    session_id: Option<Uuid>,
    connected: bool,
    scopes: ScopeSet,
    reload: bool,
    errors: Vec<SurfacedError>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/link/{provider}/connect
/// Starts a link session; the client opens the returned URL in a named popup.
async fn connect(
    State(app_state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(provider): Path<String>,
    Json(payload): Json<ConnectPayload>,
) -> AppResult<impl IntoResponse> {
    let started = app_state
        .link_sessions
        .check_and_connect(&caller, &provider, &payload.scopes)
        .await?;
    Ok(Json(started))
}

/// POST /api/link/{provider}/callback
/// Posted by the provider's redirect page inside the popup.
async fn callback(
    State(app_state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(provider): Path<String>,
    Json(result): Json<CallbackResult>,
) -> AppResult<StatusCode> {
    app_state
        .link_sessions
        .on_provider_callback(&caller, &provider, result)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/link/{provider}/window-closed
async fn window_closed(
    State(app_state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(provider): Path<String>,
) -> AppResult<StatusCode> {
    let user_id = require_user(&caller)?;
    if !app_state.popups.report_closed(user_id, &provider) {
        tracing::debug!(%user_id, provider = %provider, "Close reported for untracked popup");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/link/{provider}/status
/// Link state plus any reload/error directives queued since the last poll.
async fn status(
    State(app_state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(provider): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user(&caller)?;
    let state = app_state.settings.link_state(user_id, &provider).await?;
    let session_id = app_state.link_sessions.live_session_id(user_id, &provider);
    let directives = app_state.session_board.drain(user_id, &provider);

    Ok(Json(LinkStatusResponse {
        pending: session_id.is_some(),
        session_id,
        connected: state.connected,
        scopes: state.scopes,
        reload: directives.reload,
        errors: directives.errors,
    }))
}

/// POST /api/link/{provider}/disconnect
async fn disconnect(
    State(app_state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(provider): Path<String>,
) -> AppResult<StatusCode> {
    app_state
        .link_sessions
        .begin_disconnect(&caller, &provider)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/link/{provider}/handoff
/// Single-use read of the scopes requested for the running connect.
async fn take_handoff(
    State(app_state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(provider): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user(&caller)?;
    let handoff = app_state
        .scope_handoff
        .take(user_id, &provider)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(handoff))
}
