//! # Workflow Status Translation
//!
//! Maps Argo node phases onto [`StepPhase`] and extracts per-step progress
//! and the pushed image from a workflow's status.
//!
//! | Argo phase               | Step phase |
//! |--------------------------|------------|
//! | Running, Pending, unset  | Running    |
//! | Failed, Error, Skipped   | Failed     |
//! | Succeeded                | Succeeded  |
//! | Omitted, anything else   | Succeeded  |
//!
//! Phases in the last row keep reporting `Succeeded`, but each occurrence is
//! logged and counted so a new Argo phase does not pass unnoticed.

use crate::controller::build::argo::types::{NodePhase, NodeStatus, Outputs, Workflow};
use crate::controller::dataplane::StepPhase;
use crate::observability::metrics;
use std::collections::BTreeMap;
use tracing::warn;

/// Output parameter the push step writes the image reference to
const IMAGE_OUTPUT_PARAMETER: &str = "image";

#[must_use]
pub fn step_phase(phase: &NodePhase) -> StepPhase {
    match phase {
        NodePhase::Running | NodePhase::Pending => StepPhase::Running,
        NodePhase::Failed | NodePhase::Error | NodePhase::Skipped => StepPhase::Failed,
        NodePhase::Succeeded => StepPhase::Succeeded,
        NodePhase::Omitted | NodePhase::Unknown(_) => {
            warn!(
                "Unrecognized workflow node phase {:?}, reporting Succeeded",
                phase.as_str()
            );
            metrics::increment_unrecognized_step_phase(phase.as_str());
            StepPhase::Succeeded
        }
    }
}

/// Steps of the build workflow template, by template name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuildWorkflowStep {
    Clone,
    Build,
    Push,
}

impl BuildWorkflowStep {
    pub const ALL: [BuildWorkflowStep; 3] = [
        BuildWorkflowStep::Clone,
        BuildWorkflowStep::Build,
        BuildWorkflowStep::Push,
    ];

    #[must_use]
    pub fn template_name(&self) -> &'static str {
        match self {
            BuildWorkflowStep::Clone => "clone-step",
            BuildWorkflowStep::Build => "build-step",
            BuildWorkflowStep::Push => "push-step",
        }
    }
}

/// First node (by node id) that ran the given step's template
#[must_use]
pub fn get_step_by_template_name(
    nodes: &BTreeMap<String, NodeStatus>,
    step: BuildWorkflowStep,
) -> Option<&NodeStatus> {
    nodes
        .values()
        .find(|node| node.template_name.as_deref() == Some(step.template_name()))
}

/// Value of the `image` output parameter, if the step produced one
#[must_use]
pub fn get_image_name_from_workflow(outputs: &Outputs) -> Option<&str> {
    outputs
        .parameters
        .iter()
        .find(|p| p.name == IMAGE_OUTPUT_PARAMETER)
        .and_then(|p| p.value.as_deref())
}

/// Point-in-time progress of a build workflow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowProgress {
    /// Phase of each step that has a node yet
    pub steps: BTreeMap<BuildWorkflowStep, StepPhase>,
    /// Image reported by the push step
    pub image: Option<String>,
}

impl WorkflowProgress {
    #[must_use]
    pub fn from_workflow(workflow: &Workflow) -> Self {
        let Some(status) = workflow.status.as_ref() else {
            return Self::default();
        };

        let steps = BuildWorkflowStep::ALL
            .iter()
            .filter_map(|step| {
                get_step_by_template_name(&status.nodes, *step)
                    .map(|node| (*step, step_phase(&node.phase)))
            })
            .collect();

        let image = get_step_by_template_name(&status.nodes, BuildWorkflowStep::Push)
            .and_then(|node| node.outputs.as_ref())
            .and_then(get_image_name_from_workflow)
            .map(str::to_string);

        Self { steps, image }
    }

    #[must_use]
    pub fn step(&self, step: BuildWorkflowStep) -> Option<StepPhase> {
        self.steps.get(&step).copied()
    }

    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.steps.values().any(|phase| *phase == StepPhase::Failed)
    }

    /// Push step succeeded
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.step(BuildWorkflowStep::Push) == Some(StepPhase::Succeeded)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.is_completed() || self.has_failed()
    }
}
