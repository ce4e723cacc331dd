//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use build_controller::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Convergence engine
pub use crate::controller::dataplane::{
    AggregateResult, ConvergenceAction, ErrorClass, HandlerError, HandlerOutcome, HandlerStatus,
    KubeStore, ObservedState, Orchestrator, ResourceHandler, ResourceKey, ResourceKind,
    ResourceStore, StepPhase, StoreError,
};

// Build integration
pub use crate::controller::build::argo::{WorkflowHandler, WorkflowProgress, WorkflowSettings};
pub use crate::controller::build::{build_orchestrator, BuildContext, NamespaceHandler};

// Reconciler types
pub use crate::controller::reconciler::{
    reconcile, BackoffRegistry, BackoffState, Reconciler, ReconcilerError,
};

// Config types
pub use crate::config::{ControllerConfig, SharedControllerConfig};
