//! # Build Status
//!
//! Translates a convergence pass and the workflow's progress into Build
//! status conditions, and writes them only when something changed.

use crate::constants::FIELD_MANAGER;
use crate::controller::build::argo::{BuildWorkflowStep, WorkflowProgress};
use crate::controller::dataplane::{AggregateResult, StepPhase};
use crate::crd::{Build, BuildStatus, Condition, ConditionStatus, ImageStatus};
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use tracing::debug;

pub const CONDITION_CONVERGED: &str = "Converged";
pub const CONDITION_COMPLETED: &str = "Completed";

fn step_condition_type(step: BuildWorkflowStep) -> &'static str {
    match step {
        BuildWorkflowStep::Clone => "StepCloneSucceeded",
        BuildWorkflowStep::Build => "StepBuildSucceeded",
        BuildWorkflowStep::Push => "StepPushSucceeded",
    }
}

fn step_condition(step: BuildWorkflowStep, phase: StepPhase) -> Condition {
    let (status, reason) = match phase {
        StepPhase::Running => (ConditionStatus::Unknown, "StepRunning"),
        StepPhase::Failed => (ConditionStatus::False, "StepFailed"),
        StepPhase::Succeeded => (ConditionStatus::True, "StepSucceeded"),
    };
    Condition::new(
        step_condition_type(step),
        status,
        reason,
        &format!("{} is {}", step.template_name(), phase),
    )
}

fn converged_condition(result: &AggregateResult) -> Condition {
    if result.is_success() {
        return Condition::new(
            CONDITION_CONVERGED,
            ConditionStatus::True,
            "Converged",
            &result.summary(),
        );
    }
    let reason = if result.has_permanent_failure() {
        "PermanentFailure"
    } else {
        "TransientFailure"
    };
    Condition::new(
        CONDITION_CONVERGED,
        ConditionStatus::False,
        reason,
        &result.summary(),
    )
}

fn completed_condition(progress: &WorkflowProgress) -> Condition {
    if progress.is_completed() {
        Condition::new(
            CONDITION_COMPLETED,
            ConditionStatus::True,
            "BuildCompleted",
            "image built and pushed",
        )
    } else if progress.has_failed() {
        Condition::new(
            CONDITION_COMPLETED,
            ConditionStatus::False,
            "BuildFailed",
            "a workflow step failed",
        )
    } else {
        Condition::new(
            CONDITION_COMPLETED,
            ConditionStatus::Unknown,
            "BuildInProgress",
            "workflow is running",
        )
    }
}

/// Desired conditions for a pass, ordered steps first
#[must_use]
pub fn build_conditions(
    result: &AggregateResult,
    progress: Option<&WorkflowProgress>,
) -> Vec<Condition> {
    let mut conditions = Vec::new();
    if let Some(progress) = progress {
        for step in BuildWorkflowStep::ALL {
            if let Some(phase) = progress.step(step) {
                conditions.push(step_condition(step, phase));
            }
        }
        conditions.push(completed_condition(progress));
    }
    conditions.push(converged_condition(result));
    conditions
}

/// Carry over transition times of conditions whose state did not change
#[must_use]
pub fn merge_conditions(existing: &[Condition], desired: Vec<Condition>) -> Vec<Condition> {
    desired
        .into_iter()
        .map(|condition| {
            existing
                .iter()
                .find(|current| current.same_state(&condition))
                .cloned()
                .unwrap_or(condition)
        })
        .collect()
}

/// Next status of `build`, or `None` when it would not change
#[must_use]
pub fn next_status(
    build: &Build,
    result: &AggregateResult,
    progress: Option<&WorkflowProgress>,
) -> Option<BuildStatus> {
    let current = build.status.clone().unwrap_or_default();
    let conditions = merge_conditions(&current.conditions, build_conditions(result, progress));
    let image_status = progress
        .and_then(|p| p.image.clone())
        .map(|image| ImageStatus { image })
        .or_else(|| current.image_status.clone());

    let next = BuildStatus {
        conditions,
        observed_generation: build.metadata.generation,
        image_status,
    };

    let unchanged = current.observed_generation == next.observed_generation
        && current.image_status == next.image_status
        && current.conditions == next.conditions;
    if unchanged {
        None
    } else {
        Some(next)
    }
}

/// Write `status` to the Build's status subresource
pub async fn patch_status(
    client: &Client,
    build: &Build,
    status: &BuildStatus,
) -> Result<(), kube::Error> {
    let namespace = build.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<Build> = Api::namespaced(client.clone(), &namespace);
    let patch = serde_json::json!({ "status": status });

    api.patch_status(
        &build.name_any(),
        &PatchParams::apply(FIELD_MANAGER),
        &Patch::Merge(patch),
    )
    .await?;

    debug!("Updated status of Build {}/{}", namespace, build.name_any());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::dataplane::{ConvergenceAction, HandlerOutcome, HandlerStatus};
    use crate::crd::{BuildOwner, BuildSpec};

    fn converged() -> AggregateResult {
        AggregateResult {
            outcomes: vec![HandlerOutcome {
                handler: "ArgoWorkflow",
                status: HandlerStatus::Done {
                    action: ConvergenceAction::Update,
                    changed: false,
                },
            }],
        }
    }

    fn build() -> Build {
        let mut build = Build::new(
            "reading-list-build-1",
            BuildSpec {
                owner: BuildOwner {
                    project_name: "library".to_string(),
                    component_name: "reading-list".to_string(),
                    deployment_track_name: "main".to_string(),
                },
                branch: None,
                git_revision: None,
                path: None,
                build_configuration: None,
            },
        );
        build.metadata.generation = Some(1);
        build
    }

    fn running_progress() -> WorkflowProgress {
        WorkflowProgress {
            steps: [
                (BuildWorkflowStep::Clone, StepPhase::Succeeded),
                (BuildWorkflowStep::Build, StepPhase::Running),
            ]
            .into_iter()
            .collect(),
            image: None,
        }
    }

    #[test]
    fn test_conditions_for_running_workflow() {
        let conditions = build_conditions(&converged(), Some(&running_progress()));
        let types: Vec<&str> = conditions.iter().map(|c| c.r#type.as_str()).collect();
        assert_eq!(
            types,
            vec![
                "StepCloneSucceeded",
                "StepBuildSucceeded",
                CONDITION_COMPLETED,
                CONDITION_CONVERGED
            ]
        );
        assert_eq!(conditions[1].status, "Unknown");
        assert_eq!(conditions[3].status, "True");
    }

    #[test]
    fn test_next_status_is_none_when_unchanged() {
        let mut build = build();
        let first = next_status(&build, &converged(), Some(&running_progress()))
            .expect("first status differs from empty");
        build.status = Some(first);
        assert!(next_status(&build, &converged(), Some(&running_progress())).is_none());
    }

    #[test]
    fn test_image_status_is_kept_once_known() {
        let mut build = build();
        build.status = Some(BuildStatus {
            image_status: Some(ImageStatus {
                image: "registry.local/app:v1".to_string(),
            }),
            ..BuildStatus::default()
        });
        let status = next_status(&build, &converged(), None).expect("conditions added");
        assert_eq!(
            status.image_status.map(|s| s.image).as_deref(),
            Some("registry.local/app:v1")
        );
    }
}
