use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::domain::entities::{
    caller::Caller,
    provider_settings::{
        ProviderSettings, SettingsUpdate, SettingsView, SuperAdminView, TenantAdminView,
        UserLinkState, UserView,
    },
    scope::ScopeSet,
    user_role::UserRole,
};

// ============================================================================
// Repository Traits
// ============================================================================

#[async_trait]
pub trait ProviderSettingsRepo: Send + Sync {
    async fn get(&self, provider: &str) -> AppResult<Option<ProviderSettings>>;
    async fn list(&self) -> AppResult<Vec<ProviderSettings>>;
    /// Apply an admin change to an existing provider in a single write.
    /// `None` when no such provider is configured.
    async fn update(
        &self,
        provider: &str,
        update: &SettingsUpdate,
    ) -> AppResult<Option<ProviderSettings>>;
}

#[async_trait]
pub trait UserLinkRepo: Send + Sync {
    async fn get(&self, user_id: Uuid, provider: &str) -> AppResult<Option<UserLinkState>>;
    async fn upsert(&self, user_id: Uuid, provider: &str, state: &UserLinkState) -> AppResult<()>;
}

// ============================================================================
// Use Cases
// ============================================================================

/// Role-scoped access to provider settings and per-user link state.
#[derive(Clone)]
pub struct SettingsStore {
    provider_repo: Arc<dyn ProviderSettingsRepo>,
    user_link_repo: Arc<dyn UserLinkRepo>,
}

impl SettingsStore {
    pub fn new(
        provider_repo: Arc<dyn ProviderSettingsRepo>,
        user_link_repo: Arc<dyn UserLinkRepo>,
    ) -> Self {
        Self {
            provider_repo,
            user_link_repo,
        }
    }

    /// Settings for one provider, shaped by the caller's role.
    #[instrument(skip(self))]
    pub async fn read(&self, caller: &Caller, provider: &str) -> AppResult<SettingsView> {
        let settings = self.provider(provider).await?;
        self.view_for(caller, &settings).await
    }

    /// Non-empty views of every provider, for the aggregated services panel.
    #[instrument(skip(self))]
    pub async fn services_settings(&self, caller: &Caller) -> AppResult<Vec<SettingsView>> {
        let mut views = Vec::new();
        for settings in self.provider_repo.list().await? {
            let view = self.view_for(caller, &settings).await?;
            if !view.is_empty() {
                views.push(view);
            }
        }
        Ok(views)
    }

    /// Replace a provider's credentials, and its default scopes when given
    /// (tenant admin or above).
    #[instrument(skip(self, update), fields(enable_module = update.enable_module))]
    pub async fn update(
        &self,
        caller: &Caller,
        provider: &str,
        update: &SettingsUpdate,
    ) -> AppResult<()> {
        require_role(caller, UserRole::TenantAdmin)?;

        match self.provider_repo.update(provider, update).await {
            Ok(Some(_)) => {
                tracing::info!(provider, "Provider settings updated");
                Ok(())
            }
            Ok(None) => Err(AppError::NotFound),
            Err(err) => {
                tracing::error!(provider, error = %err, "Failed to persist provider settings");
                Err(AppError::PersistenceFailure)
            }
        }
    }

    /// Apply a batch of updates keyed by provider name.
    ///
    /// Stops at the first failure; providers before it stay updated.
    #[instrument(skip(self, updates))]
    pub async fn update_services_settings(
        &self,
        caller: &Caller,
        updates: &BTreeMap<String, SettingsUpdate>,
    ) -> AppResult<()> {
        require_role(caller, UserRole::TenantAdmin)?;
        for (provider, update) in updates {
            self.update(caller, provider, update).await?;
        }
        Ok(())
    }

    /// Persist a user's scope selection after a confirmed link or unlink.
    ///
    /// Names the provider no longer declares are dropped, so an admin edit
    /// made mid-session can't void a confirmed result.
    #[instrument(skip(self, scopes))]
    pub async fn update_scopes(
        &self,
        user_id: Uuid,
        provider: &str,
        connected: bool,
        scopes: &ScopeSet,
    ) -> AppResult<()> {
        let defaults = self.default_scopes(provider).await?;
        let state = UserLinkState {
            connected,
            scopes: defaults.select_declared(scopes),
        };

        self.user_link_repo
            .upsert(user_id, provider, &state)
            .await
            .map_err(|err| {
                tracing::error!(provider, %user_id, error = %err, "Failed to persist user scopes");
                AppError::PersistenceFailure
            })
    }

    /// Tenant-wide default scopes for a provider.
    pub async fn default_scopes(&self, provider: &str) -> AppResult<ScopeSet> {
        Ok(self.provider(provider).await?.scopes)
    }

    /// Last confirmed link state, or the initial state for users who never linked.
    pub async fn link_state(&self, user_id: Uuid, provider: &str) -> AppResult<UserLinkState> {
        match self.user_link_repo.get(user_id, provider).await? {
            Some(state) => Ok(state),
            None => Ok(UserLinkState::initial(&self.default_scopes(provider).await?)),
        }
    }

    pub async fn provider(&self, provider: &str) -> AppResult<ProviderSettings> {
        self.provider_repo
            .get(provider)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn view_for(&self, caller: &Caller, settings: &ProviderSettings) -> AppResult<SettingsView> {
        let connected = match (caller.role, caller.user_id) {
            (UserRole::NormalUser, Some(user_id)) => {
                Some(self.link_state(user_id, &settings.name).await?.connected)
            }
            _ => None,
        };
        Ok(project(settings, caller.role, connected))
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub(crate) fn require_role(caller: &Caller, required: UserRole) -> AppResult<()> {
    if caller.role.is_at_least(required) {
        Ok(())
    } else {
        Err(AppError::AuthorizationDenied)
    }
}

/// Least-privilege projection of provider settings.
///
/// `connected` is only meaningful for normal users; without it a normal user
/// gets the empty view.
fn project(settings: &ProviderSettings, role: UserRole, connected: Option<bool>) -> SettingsView {
    match (role, connected) {
        (UserRole::SuperAdmin, _) => SettingsView::SuperAdmin(SuperAdminView {
            name: settings.name.clone(),
            display_name: settings.display_name.clone(),
            enable_module: settings.enable_module,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.expose_secret().to_string(),
            scopes: settings.scopes.clone(),
        }),
        (UserRole::TenantAdmin, _) => SettingsView::TenantAdmin(TenantAdminView {
            name: settings.name.clone(),
            display_name: settings.display_name.clone(),
            enable_module: settings.enable_module,
            client_id: settings.client_id.clone(),
            scopes: settings.scopes.clone(),
        }),
        (UserRole::NormalUser, Some(connected)) => SettingsView::User(UserView {
            enable_module: settings.enable_module,
            connected,
        }),
        _ => SettingsView::Anonymous,
    }
}
