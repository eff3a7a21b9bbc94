//! In-memory mock implementations for settings and linked account repositories.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        account_link::{LinkedAccountProfile, LinkedAccountRepo},
        settings::{ProviderSettingsRepo, UserLinkRepo},
    },
    domain::entities::provider_settings::{ProviderSettings, SettingsUpdate, UserLinkState},
};

fn apply_update(existing: &ProviderSettings, update: &SettingsUpdate) -> ProviderSettings {
    ProviderSettings {
        name: existing.name.clone(),
        display_name: existing.display_name.clone(),
        enable_module: update.enable_module,
        client_id: update.client_id.clone(),
        client_secret: SecretString::new(update.client_secret.expose_secret().into()),
        scopes: update
            .scopes
            .clone()
            .unwrap_or_else(|| existing.scopes.clone()),
    }
}

/// In-memory implementation of ProviderSettingsRepo for testing.
#[derive(Default)]
pub struct InMemoryProviderSettingsRepo {
    pub providers: Mutex<BTreeMap<String, ProviderSettings>>,
}

impl InMemoryProviderSettingsRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repo with initial providers for testing.
    pub fn with_providers(providers: Vec<ProviderSettings>) -> Self {
        let map = providers.into_iter().map(|p| (p.name.clone(), p)).collect();
        Self {
            providers: Mutex::new(map),
        }
    }
}

#[async_trait]
impl ProviderSettingsRepo for InMemoryProviderSettingsRepo {
    async fn get(&self, provider: &str) -> AppResult<Option<ProviderSettings>> {
        Ok(self.providers.lock().unwrap().get(provider).cloned())
    }

    async fn list(&self) -> AppResult<Vec<ProviderSettings>> {
        Ok(self.providers.lock().unwrap().values().cloned().collect())
    }

    async fn update(
        &self,
        provider: &str,
        update: &SettingsUpdate,
    ) -> AppResult<Option<ProviderSettings>> {
        let mut providers = self.providers.lock().unwrap();
        let Some(existing) = providers.get_mut(provider) else {
            return Ok(None);
        };
        *existing = apply_update(existing, update);
        Ok(Some(existing.clone()))
    }
}

/// Reads succeed, every write fails.
pub struct FailingProviderSettingsRepo {
    provider: ProviderSettings,
}

impl FailingProviderSettingsRepo {
    pub fn new(provider: ProviderSettings) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ProviderSettingsRepo for FailingProviderSettingsRepo {
    async fn get(&self, provider: &str) -> AppResult<Option<ProviderSettings>> {
        Ok((self.provider.name == provider).then(|| self.provider.clone()))
    }

    async fn list(&self) -> AppResult<Vec<ProviderSettings>> {
        Ok(vec![self.provider.clone()])
    }

    async fn update(
        &self,
        _provider: &str,
        _update: &SettingsUpdate,
    ) -> AppResult<Option<ProviderSettings>> {
        Err(AppError::Database("connection reset".into()))
    }
}

/// In-memory implementation of UserLinkRepo for testing.
#[derive(Default)]
pub struct InMemoryUserLinkRepo {
    pub links: Mutex<HashMap<(Uuid, String), UserLinkState>>,
}

impl InMemoryUserLinkRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserLinkRepo for InMemoryUserLinkRepo {
    async fn get(&self, user_id: Uuid, provider: &str) -> AppResult<Option<UserLinkState>> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .get(&(user_id, provider.to_string()))
            .cloned())
    }

    async fn upsert(&self, user_id: Uuid, provider: &str, state: &UserLinkState) -> AppResult<()> {
        self.links
            .lock()
            .unwrap()
            .insert((user_id, provider.to_string()), state.clone());
        Ok(())
    }
}

/// In-memory implementation of LinkedAccountRepo for testing.
#[derive(Default)]
pub struct InMemoryLinkedAccountRepo {
    pub accounts: Mutex<Vec<LinkedAccountProfile>>,
}

impl InMemoryLinkedAccountRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: Vec<LinkedAccountProfile>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
        }
    }
}

#[async_trait]
impl LinkedAccountRepo for InMemoryLinkedAccountRepo {
    async fn get(&self, user_id: Uuid, provider: &str) -> AppResult<Option<LinkedAccountProfile>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.user_id == user_id && a.provider == provider)
            .cloned())
    }

    async fn delete(&self, user_id: Uuid, provider: &str) -> AppResult<bool> {
        let mut accounts = self.accounts.lock().unwrap();
        let before = accounts.len();
        accounts.retain(|a| !(a.user_id == user_id && a.provider == provider));
        Ok(accounts.len() != before)
    }
}
