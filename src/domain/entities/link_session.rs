use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scope::ScopeSet;

/// Outcome the provider's redirect page reports for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackResult {
    pub success: bool,
    #[serde(default)]
    pub error_code: i32,
    #[serde(default)]
    pub module: String,
}

impl CallbackResult {
    pub fn success(module: impl Into<String>) -> Self {
        Self {
            success: true,
            error_code: 0,
            module: module.into(),
        }
    }

    pub fn failure(error_code: i32, module: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code,
            module: module.into(),
        }
    }
}

/// What a liveness observation decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Window still open. Keep polling.
    Pending,
    /// Window closed without any callback; local state can't be trusted.
    Ambiguous,
    /// Window closed after the callback fired.
    Resolved(CallbackResult),
    /// A terminal outcome was already produced for this session.
    AlreadyFinalized,
}

impl TickOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TickOutcome::Ambiguous | TickOutcome::Resolved(_))
    }
}

/// One popup-based authorization attempt.
///
/// Pure state: window handles and timers belong to the coordinator. The
/// session produces at most one terminal [`TickOutcome`] over its lifetime.
#[derive(Debug, Clone)]
pub struct LinkSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    /// Full scope selection the user submitted.
    pub selection: ScopeSet,
    /// Scope names handed to the provider after observers had their say.
    pub requested_scopes: Vec<String>,
    pub started_at: DateTime<Utc>,
    callback: Option<CallbackResult>,
    finalized: bool,
}

impl LinkSession {
    pub fn new(
        user_id: Uuid,
        provider: impl Into<String>,
        selection: ScopeSet,
        requested_scopes: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            provider: provider.into(),
            selection,
            requested_scopes,
            started_at: Utc::now(),
            callback: None,
            finalized: false,
        }
    }

    pub fn callback_fired(&self) -> bool {
        self.callback.is_some()
    }

    pub fn callback(&self) -> Option<&CallbackResult> {
        self.callback.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Record the provider callback. Returns `false` if ignored: a result was
    /// already recorded, or the session is finalized.
    pub fn record_callback(&mut self, result: CallbackResult) -> bool {
        if self.finalized || self.callback.is_some() {
            return false;
        }
        self.callback = Some(result);
        true
    }

    /// Apply one liveness observation of the popup window.
    pub fn observe(&mut self, window_closed: bool) -> TickOutcome {
        if self.finalized {
            return TickOutcome::AlreadyFinalized;
        }
        if !window_closed {
            return TickOutcome::Pending;
        }
        self.finalized = true;
        match &self.callback {
            Some(result) => TickOutcome::Resolved(result.clone()),
            None => TickOutcome::Ambiguous,
        }
    }

    /// Finalize a session that outlived its maximum age, as if the window closed.
    pub fn expire(&mut self) -> TickOutcome {
        self.observe(true)
    }

    /// The selection to persist once the link is confirmed.
    pub fn confirmed_scopes(&self) -> ScopeSet {
        self.selection.restricted_to(&self.requested_scopes)
    }
}
