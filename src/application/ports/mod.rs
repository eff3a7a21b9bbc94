pub mod link_runtime;
