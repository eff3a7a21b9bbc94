pub mod http;
pub mod link_runtime;
pub mod persistence;
