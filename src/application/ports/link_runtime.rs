use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::app_error::AppResult;

// ============================================================================
// Port Types
// ============================================================================

/// Where the popup should return to once the provider is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectIntent {
    Connect,
    Login,
}

/// Values handed to the popup across the navigation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeHandoff {
    /// Requested scope names joined with `|`.
    pub scopes: String,
    pub redirect: RedirectIntent,
}

impl ScopeHandoff {
    pub fn connect(scopes: &[String]) -> Self {
        Self {
            scopes: scopes.join("|"),
            redirect: RedirectIntent::Connect,
        }
    }

    pub fn scope_names(&self) -> Vec<String> {
        self.scopes
            .split('|')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Error surfaced to the user, keyed by provider error code and module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfacedError {
    pub code: i32,
    pub module: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// Ports
// ============================================================================

/// A popup window whose liveness can be observed.
pub trait AuthWindow: Send + Sync {
    fn is_closed(&self) -> bool;
}

/// Opens named authorization popups.
#[async_trait]
pub trait PopupOpener: Send + Sync {
    async fn open(
        &self,
        user_id: Uuid,
        provider: &str,
        url: &Url,
        window_name: &str,
    ) -> AppResult<Arc<dyn AuthWindow>>;
}

/// Forces the hosting page to re-fetch all state from scratch.
pub trait PageReloader: Send + Sync {
    fn force_reload(&self, user_id: Uuid, provider: &str);
}

/// Shows errors to the user.
pub trait UserNotifier: Send + Sync {
    fn show_error(&self, user_id: Uuid, provider: &str, error: SurfacedError);
}

/// Short-lived key/value channel readable across the popup's navigation.
#[async_trait]
pub trait ScopeHandoffStore: Send + Sync {
    async fn put(
        &self,
        user_id: Uuid,
        provider: &str,
        handoff: &ScopeHandoff,
        ttl_secs: u64,
    ) -> AppResult<()>;

    async fn clear(&self, user_id: Uuid, provider: &str) -> AppResult<()>;

    /// Single-use read.
    async fn take(&self, user_id: Uuid, provider: &str) -> AppResult<Option<ScopeHandoff>>;
}

/// Whether account removal/recovery is currently permitted.
pub trait DeletionCapability: Send + Sync {
    fn is_available(&self) -> bool;
}

/// Deletion capability fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct StaticDeletionCapability(pub bool);

impl DeletionCapability for StaticDeletionCapability {
    fn is_available(&self) -> bool {
        self.0
    }
}
