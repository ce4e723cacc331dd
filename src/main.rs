//! # Build Controller
//!
//! Watches `Build` resources and converges each one into a CI namespace and
//! an Argo Workflow running the clone, build and push steps.
//!
//! ## Environment
//!
//! - `METRICS_PORT`: probe and metrics port (default 5000)
//! - `LOG_LEVEL`: default log level when `RUST_LOG` is unset
//! - `HANDLER_TIMEOUT_SECS`: upper bound of a single handler step
//! - `CI_NAMESPACE_PREFIX`, `WORKFLOW_TEMPLATE_NAME`, `WORKFLOW_SERVICE_ACCOUNT`,
//!   `WORKFLOW_TTL_SECONDS_AFTER_COMPLETION`, `IMAGE_REGISTRY`: workflow shape

use build_controller::runtime::{initialization, watch_loop};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let init = initialization::initialize().await?;

    watch_loop::run_watch_loop(init.builds, init.reconciler, init.server_state).await;

    Ok(())
}
