//! Server-side stand-ins for the browser runtime.
//!
//! The popup lives in the user's browser, so its liveness is whatever the
//! client last reported, and reloads/errors are queued as directives the
//! client picks up from the status endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::Instant;
use url::Url;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    application::ports::link_runtime::{
        AuthWindow, PageReloader, PopupOpener, SurfacedError, UserNotifier,
    },
};

type Key = (Uuid, String);

/// Directives nobody polled for within this long are dropped.
const DIRECTIVE_TTL: Duration = Duration::from_secs(600);
/// Oldest errors are dropped past this many per client.
const MAX_QUEUED_ERRORS: usize = 16;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Popup windows
// ============================================================================

/// A popup window known only through client reports.
#[derive(Debug, Default)]
pub struct ReportedWindow {
    closed: AtomicBool,
}

impl ReportedWindow {
    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl AuthWindow for ReportedWindow {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Tracks the current popup per user and provider. Opening a new one
/// replaces the previous handle.
///
/// Only the session polling a window keeps it alive; entries whose session
/// has ended are pruned on the next open.
#[derive(Default)]
pub struct ReportedPopupOpener {
    windows: Mutex<HashMap<Key, Weak<ReportedWindow>>>,
}

impl ReportedPopupOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when no live popup is tracked for the pair.
    pub fn report_closed(&self, user_id: Uuid, provider: &str) -> bool {
        match lock(&self.windows)
            .remove(&(user_id, provider.to_string()))
            .and_then(|window| window.upgrade())
        {
            Some(window) => {
                window.mark_closed();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        lock(&self.windows).len()
    }
}

#[async_trait]
impl PopupOpener for ReportedPopupOpener {
    async fn open(
        &self,
        user_id: Uuid,
        provider: &str,
        url: &Url,
        window_name: &str,
    ) -> AppResult<Arc<dyn AuthWindow>> {
        let window = Arc::new(ReportedWindow::default());
        {
            let mut windows = lock(&self.windows);
            windows.retain(|_, tracked| tracked.strong_count() > 0);
            let previous = windows.insert((user_id, provider.to_string()), Arc::downgrade(&window));
            // The client reuses the named window; the old handle is gone.
            if let Some(previous) = previous.and_then(|w| w.upgrade()) {
                previous.mark_closed();
            }
        }
        tracing::debug!(%user_id, provider, %url, window_name, "Popup requested");
        Ok(window)
    }
}

// ============================================================================
// Client directives
// ============================================================================

/// Work the client must do on its next status poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientDirectives {
    pub reload: bool,
    pub errors: Vec<SurfacedError>,
}

impl ClientDirectives {
    pub fn is_empty(&self) -> bool {
        !self.reload && self.errors.is_empty()
    }
}

struct Queued {
    directives: ClientDirectives,
    touched_at: Instant,
}

/// Queues reloads and errors until the client drains them.
pub struct SessionBoard {
    pending: Mutex<HashMap<Key, Queued>>,
    ttl: Duration,
}

impl Default for SessionBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBoard {
    pub fn new() -> Self {
        Self::with_ttl(DIRECTIVE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn drain(&self, user_id: Uuid, provider: &str) -> ClientDirectives {
        lock(&self.pending)
            .remove(&(user_id, provider.to_string()))
            .filter(|queued| queued.touched_at.elapsed() < self.ttl)
            .map(|queued| queued.directives)
            .unwrap_or_default()
    }

    fn queue(&self, user_id: Uuid, provider: &str, apply: impl FnOnce(&mut ClientDirectives)) {
        let now = Instant::now();
        let mut pending = lock(&self.pending);
        pending.retain(|_, queued| now.duration_since(queued.touched_at) < self.ttl);
        let queued = pending
            .entry((user_id, provider.to_string()))
            .or_insert_with(|| Queued {
                directives: ClientDirectives::default(),
                touched_at: now,
            });
        queued.touched_at = now;
        apply(&mut queued.directives);
    }

    #[cfg(test)]
    fn queued_clients(&self) -> usize {
        lock(&self.pending).len()
    }
}

impl PageReloader for SessionBoard {
    fn force_reload(&self, user_id: Uuid, provider: &str) {
        self.queue(user_id, provider, |directives| directives.reload = true);
    }
}

impl UserNotifier for SessionBoard {
    fn show_error(&self, user_id: Uuid, provider: &str, error: SurfacedError) {
        self.queue(user_id, provider, |directives| {
            if directives.errors.len() == MAX_QUEUED_ERRORS {
                directives.errors.remove(0);
            }
            directives.errors.push(error);
        });
    }
}
