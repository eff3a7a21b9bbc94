use std::sync::Arc;

use crate::{
    adapters::link_runtime::{ReportedPopupOpener, SessionBoard},
    application::{
        ports::link_runtime::ScopeHandoffStore,
        use_cases::{
            account_link::AccountLinkUseCases, link_events::LinkEventBus,
            link_session::LinkSessionCoordinator, settings::SettingsStore,
        },
    },
    infra::config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub settings: Arc<SettingsStore>,
    pub account_links: Arc<AccountLinkUseCases>,
    pub link_sessions: LinkSessionCoordinator,
    pub link_events: Arc<LinkEventBus>,
    pub scope_handoff: Arc<dyn ScopeHandoffStore>,
    pub popups: Arc<ReportedPopupOpener>,
    pub session_board: Arc<SessionBoard>,
}
