pub mod account_link;
pub mod link_events;
pub mod link_session;
pub mod scope_policy;
pub mod settings;
