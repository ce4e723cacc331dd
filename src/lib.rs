//! Build Controller Library
//!
//! Converges `Build` resources into a per-organization CI namespace and an
//! Argo Workflow, and reports workflow progress back into Build status.
//!
//! ## Quick Start
//!
//! ```rust
//! use build_controller::prelude::*;
//! ```
//!
//! The convergence engine itself lives in [`controller::dataplane`] and is
//! independent of the Build domain.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod runtime;
