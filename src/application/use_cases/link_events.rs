use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Mutable request broadcast before a connect; any observer may veto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub service: String,
    pub scopes: Vec<String>,
    pub allow_connect: bool,
}

/// Mutable request broadcast before a disconnect; any observer may veto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectRequest {
    pub service: String,
    pub allow_disconnect: bool,
}

/// Emitted after a confirmed link state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountLinkChanged {
    pub user_id: Uuid,
    pub provider: String,
    pub connected: bool,
}

/// Extension point for other modules. All hooks default to no-ops.
pub trait LinkObserver: Send + Sync {
    fn before_connect(&self, _request: &mut ConnectRequest) {}

    fn before_disconnect(&self, _request: &mut DisconnectRequest) {}

    fn account_link_changed(&self, _event: &AccountLinkChanged) {}
}

/// Fan-out for link events: synchronous observers plus a broadcast channel
/// for async subscribers.
pub struct LinkEventBus {
    observers: RwLock<Vec<Arc<dyn LinkObserver>>>,
    changes: broadcast::Sender<AccountLinkChanged>,
}

impl Default for LinkEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkEventBus {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            observers: RwLock::new(Vec::new()),
            changes,
        }
    }

    pub fn register(&self, observer: Arc<dyn LinkObserver>) {
        self.observers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(observer);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AccountLinkChanged> {
        self.changes.subscribe()
    }

    pub fn before_connect(&self, request: &mut ConnectRequest) {
        for observer in self.snapshot() {
            observer.before_connect(request);
        }
    }

    pub fn before_disconnect(&self, request: &mut DisconnectRequest) {
        for observer in self.snapshot() {
            observer.before_disconnect(request);
        }
    }

    pub fn account_link_changed(&self, event: AccountLinkChanged) {
        for observer in self.snapshot() {
            observer.account_link_changed(&event);
        }
        // No receivers is fine.
        let _ = self.changes.send(event);
    }

    fn snapshot(&self) -> Vec<Arc<dyn LinkObserver>> {
        self.observers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Logs every confirmed link change.
pub struct AuditLogObserver;

impl LinkObserver for AuditLogObserver {
    fn account_link_changed(&self, event: &AccountLinkChanged) {
        tracing::info!(
            user_id = %event.user_id,
            provider = %event.provider,
            connected = event.connected,
            "Account link changed"
        );
    }
}
