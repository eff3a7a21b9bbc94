use std::collections::BTreeMap;

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    application::use_cases::account_link::GatewayResponse,
    domain::entities::{caller::Caller, provider_settings::SettingsUpdate},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services).put(update_services))
        .route("/{provider}/settings", get(get_settings).put(update_settings))
        .route("/{provider}/account", get(get_account).delete(delete_account))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
struct LinkedAccountResponse {
    linked: bool,
    external_id: Option<String>,
    created_at: Option<chrono::NaiveDateTime>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/providers
/// Non-empty settings views of every provider for the caller.
async fn list_services(
    State(app_state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<impl IntoResponse> {
    let views = app_state.settings.services_settings(&caller).await?;
    Ok(Json(views))
}

/// PUT /api/providers
/// Batch update keyed by provider name.
async fn update_services(
    State(app_state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(updates): Json<BTreeMap<String, SettingsUpdate>>,
) -> AppResult<StatusCode> {
    app_state
        .settings
        .update_services_settings(&caller, &updates)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/providers/{provider}/settings
async fn get_settings(
    State(app_state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(provider): Path<String>,
) -> AppResult<impl IntoResponse> {
    let view = app_state.settings.read(&caller, &provider).await?;
    Ok(Json(view))
}

/// PUT /api/providers/{provider}/settings
async fn update_settings(
    State(app_state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(provider): Path<String>,
    Json(update): Json<SettingsUpdate>,
) -> AppResult<StatusCode> {
    app_state.settings.update(&caller, &provider, &update).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/providers/{provider}/account
async fn get_account(
    State(app_state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(provider): Path<String>,
) -> AppResult<impl IntoResponse> {
    let account = app_state.account_links.get_account(&caller, &provider).await?;
    Ok(Json(LinkedAccountResponse {
        linked: account.is_some(),
        external_id: account.as_ref().map(|a| a.external_id.clone()),
        created_at: account.and_then(|a| a.created_at),
    }))
}

/// DELETE /api/providers/{provider}/account
/// Policy-gated unlink, answered in the gateway's response shape.
async fn delete_account(
    State(app_state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(provider): Path<String>,
) -> AppResult<impl IntoResponse> {
    app_state
        .link_sessions
        .begin_disconnect(&caller, &provider)
        .await?;
    Ok(Json(GatewayResponse::ok(true)))
}
