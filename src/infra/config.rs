use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

use crate::application::use_cases::link_session::SessionTimings;

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub redis_url: String,
    /// Page the authorization popup is pointed at (`?oauth=<provider>` is appended).
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub link_poll_interval: Duration,
    /// Sessions still pending after this long are finalized as abandoned.
    pub link_max_session_age: Option<Duration>,
    pub scope_handoff_ttl_secs: u64,
    /// Whether users may delete or recover their account. Gates turning off
    /// provider login against the tenant default.
    pub account_deletion_available: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());

        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3001)));
        let database_url: String = get_env("DATABASE_URL");
        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let app_origin: Url = get_env("APP_ORIGIN");

        let cors_origin_raw: String = get_env_default("CORS_ORIGIN", DEFAULT_CORS_ORIGIN.to_string());
        let cors_origin = HeaderValue::from_str(&cors_origin_raw).unwrap_or_else(|_| {
            tracing::warn!(value = %cors_origin_raw, "CORS_ORIGIN is not a valid header value, using default");
            HeaderValue::from_static(DEFAULT_CORS_ORIGIN)
        });

        let link_poll_interval_ms: u64 = get_env_default("LINK_POLL_INTERVAL_MS", 1000);
        let link_max_session_age_raw: String = get_env_default("LINK_MAX_SESSION_AGE_SECS", String::new());
        let link_max_session_age = parse_max_session_age(&link_max_session_age_raw);
        let scope_handoff_ttl_secs: u64 = get_env_default("SCOPE_HANDOFF_TTL_SECS", 300);
        let account_deletion_available: bool = get_env_default("ACCOUNT_DELETION_AVAILABLE", false);

        Self {
            jwt_secret,
            bind_addr,
            database_url,
            redis_url,
            app_origin,
            cors_origin,
            link_poll_interval: Duration::from_millis(link_poll_interval_ms.max(1)),
            link_max_session_age,
            scope_handoff_ttl_secs,
            account_deletion_available,
        }
    }

    pub fn session_timings(&self) -> SessionTimings {
        SessionTimings {
            poll_interval: self.link_poll_interval,
            max_session_age: self.link_max_session_age,
            handoff_ttl_secs: self.scope_handoff_ttl_secs,
        }
    }
}

/// Empty or `0` disables the limit.
fn parse_max_session_age(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u64>() {
        Ok(0) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            tracing::warn!(value = %raw, "LINK_MAX_SESSION_AGE_SECS is not a number of seconds, sessions will not expire");
            None
        }
    }
}
