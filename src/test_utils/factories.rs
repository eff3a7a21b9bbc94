//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::NaiveDateTime;
use secrecy::SecretString;
use uuid::Uuid;

use crate::{
    application::use_cases::account_link::LinkedAccountProfile,
    domain::entities::{provider_settings::ProviderSettings, scope::ScopeSet},
};

/// Create test provider settings: disabled, `auth` on by default.
pub fn create_test_provider(
    name: &str,
    overrides: impl FnOnce(&mut ProviderSettings),
) -> ProviderSettings {
    let mut provider = ProviderSettings {
        name: name.to_string(),
        display_name: display_name_for(name),
        enable_module: false,
        client_id: format!("{name}-client"),
        client_secret: SecretString::new(format!("{name}-secret").into()),
        scopes: ScopeSet::from_pairs(&[("auth", true)]).unwrap(),
    };
    overrides(&mut provider);
    provider
}

/// Create a test linked account for the given user and provider.
pub fn create_test_linked_account(
    user_id: Uuid,
    provider: &str,
    overrides: impl FnOnce(&mut LinkedAccountProfile),
) -> LinkedAccountProfile {
    let mut account = LinkedAccountProfile {
        id: Uuid::new_v4(),
        user_id,
        provider: provider.to_string(),
        external_id: "10002345".to_string(),
        created_at: Some(test_datetime()),
    };
    overrides(&mut account);
    account
}

// ============================================================================
// Helper Functions
// ============================================================================

/// `facebook` -> `Facebook`.
fn display_name_for(provider: &str) -> String {
    let mut chars = provider.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Returns a consistent test datetime (2024-01-15 12:00:00 UTC).
fn test_datetime() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2024-01-15 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_create_provider_with_defaults() {
        let provider = create_test_provider("facebook", |_| {});
        assert_eq!(provider.display_name, "Facebook");
        assert_eq!(provider.client_id, "facebook-client");
        assert_eq!(provider.client_secret.expose_secret(), "facebook-secret");
        assert!(!provider.enable_module);
        assert!(provider.scopes.auth_enabled());
    }

    #[test]
    fn test_create_provider_with_overrides() {
        let provider = create_test_provider("passport", |p| {
            p.enable_module = true;
            p.display_name = "Passport".to_string();
        });
        assert!(provider.enable_module);
        assert_eq!(provider.name, "passport");
    }

    #[test]
    fn test_create_linked_account_with_defaults() {
        let user_id = Uuid::new_v4();
        let account = create_test_linked_account(user_id, "facebook", |_| {});
        assert_eq!(account.user_id, user_id);
        assert_eq!(account.provider, "facebook");
        assert!(account.created_at.is_some());
    }
}
