//! Test app state builder for HTTP-level testing.
//!
//! This module provides `TestAppStateBuilder` which creates an `AppState`
//! wired exactly like production, with in-memory repositories underneath.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    application::{jwt, use_cases::account_link::LinkedAccountProfile},
    domain::entities::{provider_settings::ProviderSettings, user_role::UserRole},
    infra::{
        config::AppConfig,
        setup::{Backends, build_app_state},
    },
    test_utils::{
        InMemoryLinkedAccountRepo, InMemoryProviderSettingsRepo, InMemoryScopeHandoffStore,
        InMemoryUserLinkRepo,
    },
};

/// Builder for creating test AppState instances.
pub struct TestAppStateBuilder {
    providers: Vec<ProviderSettings>,
    linked_accounts: Vec<LinkedAccountProfile>,
    deletion_available: bool,
    poll_interval: Duration,
    max_session_age: Option<Duration>,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            linked_accounts: Vec::new(),
            deletion_available: false,
            poll_interval: Duration::from_millis(1000),
            max_session_age: None,
        }
    }

    pub fn with_provider(mut self, provider: ProviderSettings) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_linked_account(mut self, account: LinkedAccountProfile) -> Self {
        self.linked_accounts.push(account);
        self
    }

    pub fn with_deletion_available(mut self, available: bool) -> Self {
        self.deletion_available = available;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_session_age(mut self, age: Duration) -> Self {
        self.max_session_age = Some(age);
        self
    }

    pub fn build(self) -> AppState {
        let config = AppConfig {
            jwt_secret: SecretString::new("test-jwt-secret".into()),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: "postgres://localhost/account_link_test".to_string(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            app_origin: Url::parse("https://app.example.com/").unwrap(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            link_poll_interval: self.poll_interval,
            link_max_session_age: self.max_session_age,
            scope_handoff_ttl_secs: 300,
            account_deletion_available: self.deletion_available,
        };

        build_app_state(
            config,
            Backends {
                provider_settings: Arc::new(InMemoryProviderSettingsRepo::with_providers(
                    self.providers,
                )),
                user_links: Arc::new(InMemoryUserLinkRepo::new()),
                linked_accounts: Arc::new(InMemoryLinkedAccountRepo::with_accounts(
                    self.linked_accounts,
                )),
                scope_handoff: Arc::new(InMemoryScopeHandoffStore::new()),
            },
        )
    }

    /// Issue an access token the state's middleware will accept.
    pub fn token_for(app_state: &AppState, user_id: Uuid, role: UserRole) -> String {
        jwt::issue(
            user_id,
            role,
            &app_state.config.jwt_secret,
            time::Duration::hours(1),
        )
        .expect("Failed to issue test token")
    }
}
