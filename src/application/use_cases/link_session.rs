use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult, ErrorCode};
use crate::application::ports::link_runtime::{
    AuthWindow, PageReloader, PopupOpener, ScopeHandoff, ScopeHandoffStore, SurfacedError,
    UserNotifier,
};
use crate::application::use_cases::{
    account_link::AccountLinkGateway,
    link_events::{AccountLinkChanged, ConnectRequest, DisconnectRequest, LinkEventBus},
    scope_policy::ScopeConsistencyPolicy,
    settings::{SettingsStore, require_role},
};
use crate::domain::entities::{
    caller::Caller,
    link_session::{CallbackResult, LinkSession, TickOutcome},
    scope::ScopeSet,
    user_role::UserRole,
};

/// Poll cadence and lifetime bounds for link sessions.
#[derive(Debug, Clone, Copy)]
pub struct SessionTimings {
    pub poll_interval: Duration,
    /// Sessions older than this are finalized as if the window had closed.
    pub max_session_age: Option<Duration>,
    pub handoff_ttl_secs: u64,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            max_session_age: None,
            handoff_ttl_secs: 300,
        }
    }
}

/// Returned once the popup is open and the poll is armed.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectStarted {
    pub session_id: Uuid,
    pub authorize_url: Url,
    pub window_name: String,
    pub requested_scopes: Vec<String>,
}

/// External collaborators the coordinator drives.
pub struct LinkRuntime {
    pub popups: Arc<dyn PopupOpener>,
    pub handoff: Arc<dyn ScopeHandoffStore>,
    pub reloader: Arc<dyn PageReloader>,
    pub notifier: Arc<dyn UserNotifier>,
}

type SessionKey = (Uuid, String);

enum SessionSignal {
    Callback(CallbackResult),
}

struct LiveSession {
    id: Uuid,
    signals: mpsc::UnboundedSender<SessionSignal>,
    poll: JoinHandle<()>,
}

struct Inner {
    settings: Arc<SettingsStore>,
    policy: ScopeConsistencyPolicy,
    gateway: Arc<dyn AccountLinkGateway>,
    runtime: LinkRuntime,
    events: Arc<LinkEventBus>,
    timings: SessionTimings,
    app_origin: Url,
    sessions: Mutex<HashMap<SessionKey, LiveSession>>,
}

/// Runs popup-based link sessions, at most one per user and provider.
///
/// Each session is owned by one poll task. Provider callbacks reach it through
/// the session's channel, so callback, poll tick and deadline are handled one
/// at a time. A session finalizes only if the registry still maps its key to
/// its id, which makes the terminal transition happen at most once and never
/// for a superseded session.
#[derive(Clone)]
pub struct LinkSessionCoordinator {
    inner: Arc<Inner>,
}

impl LinkSessionCoordinator {
    pub fn new(
        settings: Arc<SettingsStore>,
        policy: ScopeConsistencyPolicy,
        gateway: Arc<dyn AccountLinkGateway>,
        runtime: LinkRuntime,
        events: Arc<LinkEventBus>,
        timings: SessionTimings,
        app_origin: Url,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                policy,
                gateway,
                runtime,
                events,
                timings,
                app_origin,
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    // ========================================================================
    // Connect
    // ========================================================================

    /// Apply the scope policy to the user's selection, then start a session.
    #[instrument(skip(self, selection))]
    pub async fn check_and_connect(
        &self,
        caller: &Caller,
        provider: &str,
        selection: &ScopeSet,
    ) -> AppResult<ConnectStarted> {
        caller_user_id(caller)?;
        let settings = self.inner.settings.provider(provider).await?;
        if !settings.enable_module {
            return Err(AppError::ActionNotPermitted(format!(
                "{} is not enabled",
                settings.display_name
            )));
        }

        let current = settings.scopes.select(selection)?;
        let mut request = ConnectRequest {
            service: provider.to_string(),
            scopes: current.enabled_names(),
            allow_connect: true,
        };

        if !self
            .inner
            .policy
            .can_connect(&mut request, &current, &settings.scopes)
        {
            return Err(AppError::ActionNotPermitted(
                "Turning off login through this provider requires account deletion to be available"
                    .into(),
            ));
        }

        self.begin_connect(caller, provider, current, request.scopes)
            .await
    }

    /// Open the authorization popup and arm the liveness poll.
    ///
    /// A live session for the same user and provider is cancelled before any
    /// side effect, so it can no longer finalize once the popup is reused.
    #[instrument(skip(self, selection))]
    pub async fn begin_connect(
        &self,
        caller: &Caller,
        provider: &str,
        selection: ScopeSet,
        scopes: Vec<String>,
    ) -> AppResult<ConnectStarted> {
        let user_id = caller_user_id(caller)?;
        let settings = self.inner.settings.provider(provider).await?;
        let key = (user_id, provider.to_string());

        self.inner.supersede(&key);

        let handoff = &self.inner.runtime.handoff;
        handoff.clear(user_id, provider).await?;
        handoff
            .put(
                user_id,
                provider,
                &ScopeHandoff::connect(&scopes),
                self.inner.timings.handoff_ttl_secs,
            )
            .await?;

        let authorize_url = self.inner.authorize_url(provider);
        let window = self
            .inner
            .runtime
            .popups
            .open(user_id, provider, &authorize_url, &settings.display_name)
            .await?;

        let session = LinkSession::new(user_id, provider, selection, scopes.clone());
        let session_id = session.id;
        let (signals, receiver) = mpsc::unbounded_channel();

        {
            let mut sessions = self.inner.lock_sessions();
            // Spawned under the lock so the task can't finalize before it is registered.
            let poll = tokio::spawn(drive_session(
                self.inner.clone(),
                session,
                window,
                receiver,
            ));
            let live = LiveSession {
                id: session_id,
                signals,
                poll,
            };
            // A concurrent connect for the same pair may have registered in the meantime.
            if let Some(raced) = sessions.insert(key, live) {
                raced.poll.abort();
                tracing::info!(%user_id, provider, stale_session = %raced.id, "Superseded live link session");
            }
        }

        tracing::info!(%user_id, provider, %session_id, "Link session started");

        Ok(ConnectStarted {
            session_id,
            authorize_url,
            window_name: settings.display_name,
            requested_scopes: scopes,
        })
    }

    /// Entry point for the provider's redirect page.
    ///
    /// A failed result is shown to the user right away; the session itself
    /// stays live until the window closes.
    #[instrument(skip(self))]
    pub async fn on_provider_callback(
        &self,
        caller: &Caller,
        provider: &str,
        result: CallbackResult,
    ) -> AppResult<()> {
        let user_id = caller_user_id(caller)?;
        let sessions = self.inner.lock_sessions();
        let live = sessions
            .get(&(user_id, provider.to_string()))
            .ok_or(AppError::NotFound)?;
        live.signals
            .send(SessionSignal::Callback(result))
            .map_err(|_| AppError::NotFound)
    }

    pub fn live_session_id(&self, user_id: Uuid, provider: &str) -> Option<Uuid> {
        self.inner
            .lock_sessions()
            .get(&(user_id, provider.to_string()))
            .map(|live| live.id)
    }

    pub fn has_live_session(&self, user_id: Uuid, provider: &str) -> bool {
        self.live_session_id(user_id, provider).is_some()
    }

    // ========================================================================
    // Disconnect
    // ========================================================================

    /// Unlink the provider account, gated by the scope policy.
    ///
    /// Everything that can be refused is checked before the gateway runs; a
    /// gateway that finds no account to remove counts as a confirmed unlink.
    #[instrument(skip(self))]
    pub async fn begin_disconnect(&self, caller: &Caller, provider: &str) -> AppResult<()> {
        let user_id = caller_user_id(caller)?;
        if self.has_live_session(user_id, provider) {
            return Err(AppError::SessionInProgress);
        }

        let settings = &self.inner.settings;
        let state = settings.link_state(user_id, provider).await?;
        if !state.connected {
            return Err(AppError::NotConnected);
        }

        let global = settings.default_scopes(provider).await?;
        let mut request = DisconnectRequest {
            service: provider.to_string(),
            allow_disconnect: true,
        };
        if !self.inner.policy.can_disconnect(&mut request, &global) {
            return Err(AppError::ActionNotPermitted(
                "This provider is a required login method and account deletion is unavailable"
                    .into(),
            ));
        }

        let unlinked = global.cleared();
        let response = self.inner.gateway.delete_account(caller, provider).await;
        if !response.result {
            let err = AppError::Gateway {
                code: response.error_code,
                module: response.error_module.clone(),
            };
            tracing::warn!(%user_id, provider, error = %err, ?response, "Disconnect rejected by gateway");
            self.inner.runtime.notifier.show_error(
                user_id,
                provider,
                SurfacedError {
                    code: response
                        .error_code
                        .unwrap_or_else(|| ErrorCode::GatewayError.numeric()),
                    module: response
                        .error_module
                        .unwrap_or_else(|| provider.to_string()),
                    message: None,
                },
            );
            return Err(err);
        }

        settings
            .update_scopes(user_id, provider, false, &unlinked)
            .await?;

        self.inner.events.account_link_changed(AccountLinkChanged {
            user_id,
            provider: provider.to_string(),
            connected: false,
        });
        tracing::info!(%user_id, provider, "Account unlinked");
        Ok(())
    }
}

impl Inner {
    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<SessionKey, LiveSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn authorize_url(&self, provider: &str) -> Url {
        let mut url = self.app_origin.clone();
        url.set_query(None);
        url.query_pairs_mut().append_pair("oauth", provider);
        url
    }

    /// Unregister and cancel the live session for `key`, if any. Once removed
    /// it fails `release`, even if its task is mid-tick on another worker.
    fn supersede(&self, key: &SessionKey) {
        if let Some(stale) = self.lock_sessions().remove(key) {
            stale.poll.abort();
            tracing::info!(user_id = %key.0, provider = %key.1, stale_session = %stale.id, "Superseded live link session");
        }
    }

    /// Drop the registry entry if it still belongs to `session_id`.
    fn release(&self, key: &SessionKey, session_id: Uuid) -> bool {
        let mut sessions = self.lock_sessions();
        match sessions.get(key) {
            Some(live) if live.id == session_id => {
                sessions.remove(key);
                true
            }
            _ => false,
        }
    }

    fn on_signal(&self, session: &mut LinkSession, signal: SessionSignal) {
        match signal {
            SessionSignal::Callback(result) => {
                if !session.record_callback(result.clone()) {
                    tracing::debug!(session_id = %session.id, "Ignoring repeated provider callback");
                    return;
                }
                if result.success {
                    tracing::info!(session_id = %session.id, provider = %session.provider, "Provider reported success");
                    return;
                }
                let err = AppError::ProviderCallback {
                    code: result.error_code,
                    module: result.module.clone(),
                };
                tracing::warn!(session_id = %session.id, error = %err, "Provider reported failure");
                self.runtime.notifier.show_error(
                    session.user_id,
                    &session.provider,
                    SurfacedError {
                        code: result.error_code,
                        module: result.module,
                        message: Some(err.to_string()),
                    },
                );
            }
        }
    }

    async fn finalize(&self, session: LinkSession, outcome: TickOutcome) {
        let key = (session.user_id, session.provider.clone());
        if !self.release(&key, session.id) {
            tracing::debug!(session_id = %session.id, "Session already finalized or superseded");
            return;
        }

        match outcome {
            TickOutcome::Ambiguous => {
                tracing::warn!(
                    session_id = %session.id,
                    provider = %session.provider,
                    error = %AppError::AmbiguousSessionOutcome,
                    "Reloading client state"
                );
                self.runtime
                    .reloader
                    .force_reload(session.user_id, &session.provider);
            }
            TickOutcome::Resolved(result) if result.success => {
                let scopes = session.confirmed_scopes();
                match self
                    .settings
                    .update_scopes(session.user_id, &session.provider, true, &scopes)
                    .await
                {
                    Ok(()) => {
                        tracing::info!(session_id = %session.id, provider = %session.provider, "Account linked");
                        self.events.account_link_changed(AccountLinkChanged {
                            user_id: session.user_id,
                            provider: session.provider.clone(),
                            connected: true,
                        });
                    }
                    Err(err) => {
                        tracing::error!(session_id = %session.id, error = %err, "Failed to record linked account");
                        self.runtime.notifier.show_error(
                            session.user_id,
                            &session.provider,
                            SurfacedError {
                                code: err.code().numeric(),
                                module: session.provider.clone(),
                                message: Some(err.to_string()),
                            },
                        );
                    }
                }
            }
            TickOutcome::Resolved(_) => {
                tracing::debug!(session_id = %session.id, "Session closed after provider error");
            }
            TickOutcome::Pending | TickOutcome::AlreadyFinalized => {}
        }
    }
}

async fn drive_session(
    inner: Arc<Inner>,
    mut session: LinkSession,
    window: Arc<dyn AuthWindow>,
    mut signals: mpsc::UnboundedReceiver<SessionSignal>,
) {
    let period = inner.timings.poll_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let deadline = inner.timings.max_session_age.map(|age| Instant::now() + age);

    loop {
        let outcome = tokio::select! {
            // Callbacks that already arrived count before the window check.
            biased;

            Some(signal) = signals.recv() => {
                inner.on_signal(&mut session, signal);
                continue;
            }
            _ = ticker.tick() => session.observe(window.is_closed()),
            _ = deadline_reached(deadline) => {
                tracing::warn!(session_id = %session.id, "Link session exceeded its maximum age");
                session.expire()
            }
        };

        if outcome.is_terminal() {
            inner.finalize(session, outcome).await;
            return;
        }
    }
}

async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn caller_user_id(caller: &Caller) -> AppResult<Uuid> {
    require_role(caller, UserRole::NormalUser)?;
    caller.user_id.ok_or(AppError::AuthorizationDenied)
}
