//! # Error Policy
//!
//! Turns a failed reconciliation into a requeue with per-resource Fibonacci
//! backoff.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::Build;
use crate::observability::metrics;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Requeue `obj` after the next delay of its own backoff sequence
///
/// Backoff state is keyed by `namespace/name` so one failing Build never
/// slows down another.
pub fn handle_reconciliation_error(
    obj: Arc<Build>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = obj.metadata.name.as_deref().unwrap_or("unknown");
    let namespace = obj.metadata.namespace.as_deref().unwrap_or("default");

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = name,
        resource.namespace = namespace,
        error = %error
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}/{}: {}", namespace, name, error);
    metrics::increment_reconciliation_errors();

    let resource_key = format!("{namespace}/{name}");
    let (delay, error_count) = ctx
        .backoff
        .record_failure(
            &resource_key,
            ctx.config.backoff_min_minutes,
            ctx.config.backoff_max_minutes,
        )
        .unwrap_or_else(|| {
            warn!("Backoff state unavailable, using default backoff");
            (ctx.config.reconciliation_error_requeue_duration(), 0)
        });
    let backoff_seconds = delay.as_secs();
    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

    info!(
        "Retrying {}/{} in {}s (error count: {}, next attempt at {})",
        namespace,
        name,
        backoff_seconds,
        error_count,
        next_trigger_time.to_rfc3339()
    );

    metrics::increment_requeues_total("error-backoff");
    Action::requeue(delay)
}
