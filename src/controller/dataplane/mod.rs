//! # Dataplane Convergence Engine
//!
//! Generic engine that converges externally managed resources toward the
//! intent described by a context.
//!
//! - `handler`: the per-resource-kind contract and observed-state type
//! - `orchestrator`: ordered, sequential convergence pass and its aggregate result
//! - `store`: backend store seam and its Kubernetes implementation
//! - `naming`: deterministic, length-bounded resource names
//! - `phase`: abstract step phase reported by status translators
//! - `error`: store and handler errors with their transient/permanent class

pub mod error;
pub mod handler;
pub mod naming;
pub mod orchestrator;
pub mod phase;
pub mod store;

pub use error::{ErrorClass, HandlerError, OrchestratorError, StoreError};
pub use handler::{ObservedState, ResourceHandler};
pub use orchestrator::{
    decide, AggregateResult, ConvergenceAction, HandlerOutcome, HandlerStatus, Orchestrator, Stage,
};
pub use phase::StepPhase;
pub use store::{KubeStore, ResourceKey, ResourceKind, ResourceStore};
