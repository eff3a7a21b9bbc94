pub mod caller;
pub mod link_session;
pub mod provider_settings;
pub mod scope;
pub mod user_role;
