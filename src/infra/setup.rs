use crate::{
    adapters::{
        http::app_state::AppState,
        link_runtime::{ReportedPopupOpener, SessionBoard},
    },
    application::{
        ports::link_runtime::{ScopeHandoffStore, StaticDeletionCapability},
        use_cases::{
            account_link::{AccountLinkUseCases, LinkedAccountRepo},
            link_events::{AuditLogObserver, LinkEventBus},
            link_session::{LinkRuntime, LinkSessionCoordinator},
            scope_policy::ScopeConsistencyPolicy,
            settings::{ProviderSettingsRepo, SettingsStore, UserLinkRepo},
        },
    },
    infra::{
        config::AppConfig, postgres_persistence, redis_connection,
        scope_handoff::RedisScopeHandoffStore,
    },
};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Repositories and stores the application state is assembled from.
pub struct Backends {
    pub provider_settings: Arc<dyn ProviderSettingsRepo>,
    pub user_links: Arc<dyn UserLinkRepo>,
    pub linked_accounts: Arc<dyn LinkedAccountRepo>,
    pub scope_handoff: Arc<dyn ScopeHandoffStore>,
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);
    let redis = redis_connection(&config.redis_url).await?;

    let backends = Backends {
        provider_settings: postgres_arc.clone() as Arc<dyn ProviderSettingsRepo>,
        user_links: postgres_arc.clone() as Arc<dyn UserLinkRepo>,
        linked_accounts: postgres_arc.clone() as Arc<dyn LinkedAccountRepo>,
        scope_handoff: Arc::new(RedisScopeHandoffStore::new(redis)),
    };

    Ok(build_app_state(config, backends))
}

/// Wire use cases and link runtime adapters over the given backends.
pub fn build_app_state(config: AppConfig, backends: Backends) -> AppState {
    let settings = Arc::new(SettingsStore::new(
        backends.provider_settings,
        backends.user_links,
    ));
    let account_links = Arc::new(AccountLinkUseCases::new(backends.linked_accounts));

    let link_events = Arc::new(LinkEventBus::new());
    link_events.register(Arc::new(AuditLogObserver));

    let policy = ScopeConsistencyPolicy::new(
        link_events.clone(),
        Arc::new(StaticDeletionCapability(config.account_deletion_available)),
    );

    let popups = Arc::new(ReportedPopupOpener::new());
    let session_board = Arc::new(SessionBoard::new());

    let link_sessions = LinkSessionCoordinator::new(
        settings.clone(),
        policy,
        account_links.clone(),
        LinkRuntime {
            popups: popups.clone(),
            handoff: backends.scope_handoff.clone(),
            reloader: session_board.clone(),
            notifier: session_board.clone(),
        },
        link_events.clone(),
        config.session_timings(),
        config.app_origin.clone(),
    );

    AppState {
        config: Arc::new(config),
        settings,
        account_links,
        link_sessions,
        link_events,
        scope_handoff: backends.scope_handoff,
        popups,
        session_board,
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "account_link=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don’t show target (module path)
        .with_level(true)
        .pretty();

    // File (structured JSON logs), skipped when the file can't be created
    let json_layer = match File::create("app.log") {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true),
        ),
        Err(err) => {
            eprintln!("cannot create app.log, JSON logs disabled: {err}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
