//! # Reconciler
//!
//! Reconciliation of `Build` resources.
//!
//! The reconciler:
//! - Resolves each Build's owning Component and DeploymentTrack
//! - Runs the convergence pass that keeps the CI namespace and Argo workflow in place
//! - Reports workflow step progress and the pushed image in Build status
//! - Leaves retry timing to the error policy

pub mod context;
pub mod reconcile;
pub mod status;
pub mod types;

pub use context::resolve_build_context;
pub use reconcile::{classify_pass, reconcile, PassDecision};
pub use types::{BackoffRegistry, BackoffState, Reconciler, ReconcilerError};
