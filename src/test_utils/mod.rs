//! Test utilities for unit and route testing.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory repository implementations for mocking persistence
//! - Recording fakes for the popup, reload and notification ports
//! - A builder for an `AppState` wired entirely to the fakes

mod app_state_builder;
mod factories;
mod link_mocks;
mod settings_mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use link_mocks::*;
pub use settings_mocks::*;
