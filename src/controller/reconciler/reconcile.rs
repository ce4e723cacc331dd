//! # Reconciliation Logic
//!
//! One reconciliation of a `Build`:
//!
//! 1. Resolve the owning Component and DeploymentTrack into a [`BuildContext`]
//! 2. Run the convergence pass (CI namespace, then Argo workflow)
//! 3. Take the workflow progress the pass observed
//! 4. Patch Build status if conditions or image changed
//! 5. Decide when to look at the Build again
//!
//! Transient failures are returned as errors so the error policy applies
//! per-resource Fibonacci backoff. Permanent failures are reported in status
//! and the Build waits for a spec change.

use crate::controller::build::argo::WorkflowProgress;
use crate::controller::dataplane::AggregateResult;
use crate::controller::reconciler::context::resolve_build_context;
use crate::controller::reconciler::status::{next_status, patch_status};
use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::crd::Build;
use crate::observability::metrics;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

/// What to do with a Build after a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassDecision {
    /// Converged and the workflow is still running; poll again
    Requeue(Duration),
    /// Nothing left to do until the Build changes
    AwaitChange,
    /// Transient failure; retry with backoff
    Retry(String),
}

/// Decide the follow-up for a finished pass
#[must_use]
pub fn classify_pass(
    result: &AggregateResult,
    progress: Option<&WorkflowProgress>,
    running_requeue: Duration,
) -> PassDecision {
    if result.has_transient_failure() {
        return PassDecision::Retry(result.summary());
    }
    if result.has_permanent_failure() {
        return PassDecision::AwaitChange;
    }
    match progress {
        Some(progress) if progress.is_finished() => PassDecision::AwaitChange,
        // Running, or created but not visible yet
        _ => PassDecision::Requeue(running_requeue),
    }
}

/// Main reconciliation function
/// Errors are handled by `error_policy` in the runtime, which owns backoff
pub async fn reconcile(
    build: Arc<Build>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let name = build.name_any();
    let namespace = build.namespace().unwrap_or_else(|| "default".to_string());
    let span = tracing::span!(
        tracing::Level::INFO,
        "reconcile",
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        resource.kind = "Build"
    );

    async move {
        let start = Instant::now();
        metrics::increment_reconciliations();
        info!("Reconciling Build {}/{}", namespace, name);

        let build_ctx = resolve_build_context(&ctx.client, Arc::clone(&build)).await?;
        let result = ctx.orchestrator.reconcile(&build_ctx).await;
        debug!("Convergence pass: {}", result.summary());

        // Absent when the workflow was just created or could not be fetched
        let progress = build_ctx.workflow_progress();

        if let Some(status) = next_status(&build, &result, progress) {
            patch_status(&ctx.client, &build, &status).await?;
        }

        metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

        match classify_pass(
            &result,
            progress,
            ctx.config.running_workflow_requeue_duration(),
        ) {
            PassDecision::Retry(summary) => Err(ReconcilerError::ConvergenceIncomplete(summary)),
            PassDecision::AwaitChange => {
                ctx.reset_backoff(&format!("{namespace}/{name}"));
                if result.is_success() {
                    info!("Build {}/{} converged", namespace, name);
                } else {
                    warn!(
                        "Build {}/{} has a permanent failure, waiting for a spec change: {}",
                        namespace,
                        name,
                        result.summary()
                    );
                }
                Ok(Action::await_change())
            }
            PassDecision::Requeue(after) => {
                ctx.reset_backoff(&format!("{namespace}/{name}"));
                metrics::increment_requeues_total("workflow-running");
                debug!("Workflow still running, checking again in {}s", after.as_secs());
                Ok(Action::requeue(after))
            }
        }
    }
    .instrument(span)
    .await
}
