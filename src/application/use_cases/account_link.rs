use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::settings::require_role;
use crate::domain::entities::{caller::Caller, user_role::UserRole};

// ============================================================================
// Gateway Contract
// ============================================================================

/// Response shape of the backend's account deletion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_module: Option<String>,
}

impl GatewayResponse {
    pub fn ok(result: bool) -> Self {
        Self {
            result,
            error_code: None,
            error_module: None,
        }
    }

    pub fn failure(code: i32, module: impl Into<String>) -> Self {
        Self {
            result: false,
            error_code: Some(code),
            error_module: Some(module.into()),
        }
    }
}

/// Backend capability that removes a linked provider account.
#[async_trait]
pub trait AccountLinkGateway: Send + Sync {
    async fn delete_account(&self, caller: &Caller, provider: &str) -> GatewayResponse;
}

// ============================================================================
// Repository Traits
// ============================================================================

#[derive(Debug, Clone)]
pub struct LinkedAccountProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub external_id: String,
    pub created_at: Option<NaiveDateTime>,
}

/// Linked accounts written by the provider integration after a handshake.
#[async_trait]
pub trait LinkedAccountRepo: Send + Sync {
    async fn get(&self, user_id: Uuid, provider: &str) -> AppResult<Option<LinkedAccountProfile>>;
    /// Returns whether a row was removed.
    async fn delete(&self, user_id: Uuid, provider: &str) -> AppResult<bool>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct AccountLinkUseCases {
    repo: Arc<dyn LinkedAccountRepo>,
}

impl AccountLinkUseCases {
    pub fn new(repo: Arc<dyn LinkedAccountRepo>) -> Self {
        Self { repo }
    }

    /// Linked account of the calling user, if any.
    #[instrument(skip(self))]
    pub async fn get_account(
        &self,
        caller: &Caller,
        provider: &str,
    ) -> AppResult<Option<LinkedAccountProfile>> {
        let user_id = normal_user_id(caller)?;
        self.repo.get(user_id, provider).await
    }

    /// Remove the calling user's linked account. `Ok(false)` when nothing was linked.
    #[instrument(skip(self))]
    pub async fn delete_account(&self, caller: &Caller, provider: &str) -> AppResult<bool> {
        let user_id = normal_user_id(caller)?;
        let removed = self.repo.delete(user_id, provider).await?;
        if removed {
            tracing::info!(%user_id, provider, "Linked account deleted");
        }
        Ok(removed)
    }
}

#[async_trait]
impl AccountLinkGateway for AccountLinkUseCases {
    async fn delete_account(&self, caller: &Caller, provider: &str) -> GatewayResponse {
        match AccountLinkUseCases::delete_account(self, caller, provider).await {
            // No row means the integration holds nothing for this user: unlinked either way.
            Ok(removed) => {
                if !removed {
                    tracing::debug!(provider, "No linked account to delete");
                }
                GatewayResponse::ok(true)
            }
            Err(err) => {
                tracing::warn!(provider, error = %err, "Account deletion failed");
                GatewayResponse::failure(err.code().numeric(), provider)
            }
        }
    }
}

fn normal_user_id(caller: &Caller) -> AppResult<Uuid> {
    require_role(caller, UserRole::NormalUser)?;
    caller.user_id.ok_or(AppError::AuthorizationDenied)
}
