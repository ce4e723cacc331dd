//! # Configuration
//!
//! Controller-level configuration loaded from environment variables.

mod controller;

pub use controller::ControllerConfig;

use std::sync::Arc;

/// Configuration shared between the reconciler, handlers and the error policy
pub type SharedControllerConfig = Arc<ControllerConfig>;
