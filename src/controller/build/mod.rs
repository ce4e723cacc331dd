//! # Build Integration
//!
//! Resources converged for every `Build`, in order:
//!
//! 1. `Namespace` - the organization's CI namespace
//! 2. `ArgoWorkflow` - the clone/build/push workflow, inside that namespace
//!
//! The order is fixed here so the dependency between the two stays visible.

pub mod argo;
mod context;
pub mod names;
pub mod namespace;

pub use context::BuildContext;
pub use namespace::{NamespaceHandler, NAMESPACE_KIND};

use crate::config::ControllerConfig;
use crate::controller::dataplane::{Orchestrator, OrchestratorError, ResourceStore};
use argo::{WorkflowHandler, WorkflowSettings};
use std::sync::Arc;

/// Assemble the ordered handler list for Build reconciliation
pub fn build_orchestrator(
    store: &Arc<dyn ResourceStore>,
    config: &ControllerConfig,
) -> Result<Orchestrator<BuildContext>, OrchestratorError> {
    Orchestrator::new(config.handler_timeout())
        .with_handler(NamespaceHandler::new(
            Arc::clone(store),
            config.ci_namespace_prefix.clone(),
        ))?
        .with_handler(WorkflowHandler::new(
            Arc::clone(store),
            WorkflowSettings::from_config(config),
        ))
}
