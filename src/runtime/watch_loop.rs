//! # Watch Loop
//!
//! Watches `Build` resources in every namespace and drives reconciliation
//! until a shutdown signal arrives.

use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::Build;
use crate::runtime::error_policy::handle_reconciliation_error;
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Run the Build controller until SIGINT/SIGTERM
///
/// Readiness is withdrawn once the controller stream ends so the pod stops
/// receiving probe traffic during shutdown.
pub async fn run_watch_loop(
    builds: Api<Build>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) {
    let watch_span = tracing::span!(
        tracing::Level::INFO,
        "controller.watch",
        operation = "watch_loop",
        resource.kind = "Build"
    );

    async {
        info!("Starting controller watch loop...");
        Controller::new(builds, watcher::Config::default().any_semantic())
            .shutdown_on_signal()
            .run(reconcile, handle_reconciliation_error, reconciler)
            .for_each(|result| async move {
                match result {
                    Ok((object, action)) => {
                        debug!("Reconciled {}: {:?}", object.name, action);
                    }
                    // Reconcile errors were already handled by the error policy
                    Err(kube_runtime::controller::Error::ReconcilerFailed(_, object)) => {
                        debug!("Reconcile of {} failed, backoff scheduled", object.name);
                    }
                    Err(e) => warn!("Controller stream error: {}", e),
                }
            })
            .await;
    }
    .instrument(watch_span)
    .await;

    server_state.set_ready(false);
    info!("Controller watch loop stopped");
}
