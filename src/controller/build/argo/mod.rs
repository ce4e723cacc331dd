//! # Argo Workflows Integration
//!
//! - `types`: the `Workflow` fields this controller writes and reads
//! - `workflow`: the `ArgoWorkflow` resource handler
//! - `phase`: node phase translation and per-step progress

pub mod phase;
pub mod types;
pub mod workflow;

pub use phase::{
    get_image_name_from_workflow, get_step_by_template_name, step_phase, BuildWorkflowStep,
    WorkflowProgress,
};
pub use types::{
    NodePhase, NodeStatus, Outputs, Parameter, Workflow, WorkflowStatus, WORKFLOW_KIND,
};
pub use workflow::{make_argo_workflow, WorkflowHandler, WorkflowSettings};
