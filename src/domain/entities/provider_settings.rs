use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::scope::ScopeSet;

/// Application credentials and default scopes for one provider.
#[derive(Debug)]
pub struct ProviderSettings {
    pub name: String,
    pub display_name: String,
    pub enable_module: bool,
    pub client_id: String,
    pub client_secret: SecretString,
    /// Tenant-wide default scope state.
    pub scopes: ScopeSet,
}

impl Clone for ProviderSettings {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            enable_module: self.enable_module,
            client_id: self.client_id.clone(),
            client_secret: SecretString::new(self.client_secret.expose_secret().into()),
            scopes: self.scopes.clone(),
        }
    }
}

/// A user's confirmed link state for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLinkState {
    pub connected: bool,
    pub scopes: ScopeSet,
}

impl UserLinkState {
    /// Initial state for a user who never linked: disconnected, provider defaults selected.
    pub fn initial(defaults: &ScopeSet) -> Self {
        Self {
            connected: false,
            scopes: defaults.clone(),
        }
    }
}

/// Admin-submitted settings change.
#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    pub enable_module: bool,
    pub client_id: String,
    #[serde(deserialize_with = "deserialize_secret")]
    pub client_secret: SecretString,
    /// `None` keeps the stored default scopes.
    #[serde(default)]
    pub scopes: Option<ScopeSet>,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    String::deserialize(deserializer).map(|s| SecretString::new(s.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub enable_module: bool,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantAdminView {
    pub name: String,
    pub display_name: String,
    pub enable_module: bool,
    pub client_id: String,
    pub scopes: ScopeSet,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SuperAdminView {
    pub name: String,
    pub display_name: String,
    pub enable_module: bool,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: ScopeSet,
}

impl std::fmt::Debug for SuperAdminView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperAdminView")
            .field("name", &self.name)
            .field("enable_module", &self.enable_module)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Provider settings projected for the caller's authorization level.
///
/// Each variant carries only the fields that level may see; the client secret
/// exists only on [`SettingsView::SuperAdmin`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum SettingsView {
    Anonymous,
    User(UserView),
    TenantAdmin(TenantAdminView),
    SuperAdmin(SuperAdminView),
}

impl SettingsView {
    pub fn is_empty(&self) -> bool {
        matches!(self, SettingsView::Anonymous)
    }

    pub fn client_secret(&self) -> Option<&str> {
        match self {
            SettingsView::SuperAdmin(view) => Some(view.client_secret.as_str()),
            _ => None,
        }
    }
}
