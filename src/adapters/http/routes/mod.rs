pub mod link;
pub mod settings;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/providers", settings::router())
        .nest("/link", link::router())
}
