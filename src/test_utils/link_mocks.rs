//! Recording fakes for the link session ports.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    application::{
        ports::link_runtime::{
            AuthWindow, PageReloader, PopupOpener, ScopeHandoff, ScopeHandoffStore,
            SurfacedError, UserNotifier,
        },
        use_cases::account_link::{AccountLinkGateway, GatewayResponse},
    },
    domain::entities::caller::Caller,
};

type Key = (Uuid, String);

fn key(user_id: Uuid, provider: &str) -> Key {
    (user_id, provider.to_string())
}

/// Popup window the test closes by hand.
#[derive(Default)]
pub struct FakeWindow {
    closed: AtomicBool,
}

impl FakeWindow {
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl AuthWindow for FakeWindow {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Hands out [`FakeWindow`]s and remembers the most recent per user and provider.
#[derive(Default)]
pub struct FakePopupOpener {
    windows: Mutex<HashMap<Key, Arc<FakeWindow>>>,
    urls: Mutex<Vec<Url>>,
    opens: AtomicUsize,
}

impl FakePopupOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(&self, user_id: Uuid, provider: &str) -> Arc<FakeWindow> {
        self.windows
            .lock()
            .unwrap()
            .get(&key(user_id, provider))
            .cloned()
            .expect("no popup opened for this user and provider")
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn opened_urls(&self) -> Vec<Url> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PopupOpener for FakePopupOpener {
    async fn open(
        &self,
        user_id: Uuid,
        provider: &str,
        url: &Url,
        _window_name: &str,
    ) -> AppResult<Arc<dyn AuthWindow>> {
        let window = Arc::new(FakeWindow::default());
        self.windows
            .lock()
            .unwrap()
            .insert(key(user_id, provider), window.clone());
        self.urls.lock().unwrap().push(url.clone());
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(window)
    }
}

/// Counts forced reloads.
#[derive(Default)]
pub struct RecordingReloader {
    reloads: Mutex<HashMap<Key, usize>>,
}

impl RecordingReloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, user_id: Uuid, provider: &str) -> usize {
        self.reloads
            .lock()
            .unwrap()
            .get(&key(user_id, provider))
            .copied()
            .unwrap_or(0)
    }
}

impl PageReloader for RecordingReloader {
    fn force_reload(&self, user_id: Uuid, provider: &str) {
        *self
            .reloads
            .lock()
            .unwrap()
            .entry(key(user_id, provider))
            .or_default() += 1;
    }
}

/// Keeps every error shown to a user.
#[derive(Default)]
pub struct RecordingNotifier {
    errors: Mutex<Vec<(Key, SurfacedError)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self, user_id: Uuid, provider: &str) -> Vec<SurfacedError> {
        let wanted = key(user_id, provider);
        self.errors
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == wanted)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

impl UserNotifier for RecordingNotifier {
    fn show_error(&self, user_id: Uuid, provider: &str, error: SurfacedError) {
        self.errors
            .lock()
            .unwrap()
            .push((key(user_id, provider), error));
    }
}

/// In-memory implementation of ScopeHandoffStore. TTLs are ignored.
#[derive(Default)]
pub struct InMemoryScopeHandoffStore {
    entries: Mutex<HashMap<Key, ScopeHandoff>>,
}

impl InMemoryScopeHandoffStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read without consuming (for test assertions).
    pub fn peek(&self, user_id: Uuid, provider: &str) -> Option<ScopeHandoff> {
        self.entries
            .lock()
            .unwrap()
            .get(&key(user_id, provider))
            .cloned()
    }
}

#[async_trait]
impl ScopeHandoffStore for InMemoryScopeHandoffStore {
    async fn put(
        &self,
        user_id: Uuid,
        provider: &str,
        handoff: &ScopeHandoff,
        _ttl_secs: u64,
    ) -> AppResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key(user_id, provider), handoff.clone());
        Ok(())
    }

    async fn clear(&self, user_id: Uuid, provider: &str) -> AppResult<()> {
        self.entries.lock().unwrap().remove(&key(user_id, provider));
        Ok(())
    }

    async fn take(&self, user_id: Uuid, provider: &str) -> AppResult<Option<ScopeHandoff>> {
        Ok(self.entries.lock().unwrap().remove(&key(user_id, provider)))
    }
}

/// Gateway returning a configurable canned response.
pub struct StubGateway {
    response: Mutex<GatewayResponse>,
    calls: AtomicUsize,
}

impl StubGateway {
    pub fn new(response: GatewayResponse) -> Self {
        Self {
            response: Mutex::new(response),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_response(&self, response: GatewayResponse) {
        *self.response.lock().unwrap() = response;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountLinkGateway for StubGateway {
    async fn delete_account(&self, _caller: &Caller, _provider: &str) -> GatewayResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.lock().unwrap().clone()
    }
}
