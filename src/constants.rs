//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default requeue interval for reconciliation errors (seconds)
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 60;

/// Default upper bound for a single handler step (fetch, create, update or delete)
pub const DEFAULT_HANDLER_TIMEOUT_SECS: u64 = 30;

/// Fibonacci backoff lower bound (minutes)
pub const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;

/// Fibonacci backoff upper bound (minutes)
pub const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;

/// Requeue interval while a workflow is still running (seconds)
pub const DEFAULT_RUNNING_WORKFLOW_REQUEUE_SECS: u64 = 20;

/// Field manager name used for server-side apply and status patches
pub const FIELD_MANAGER: &str = "build-controller";

/// Prefix of the per-organization CI namespace
pub const DEFAULT_CI_NAMESPACE_PREFIX: &str = "choreo-ci";

/// Argo `ClusterWorkflowTemplate` that every build workflow references
pub const DEFAULT_WORKFLOW_TEMPLATE_NAME: &str = "choreo-build-template";

/// Service account the workflow pods run as
pub const DEFAULT_WORKFLOW_SERVICE_ACCOUNT: &str = "workflow-sa";

/// How long a finished workflow is kept before Argo garbage-collects it
pub const DEFAULT_WORKFLOW_TTL_SECONDS_AFTER_COMPLETION: i64 = 3600;

/// Registry the push step publishes images to
pub const DEFAULT_IMAGE_REGISTRY: &str = "registry.choreo-system:5000";

/// Kubernetes DNS-1123 label length limit
pub const MAX_RESOURCE_NAME_LENGTH: usize = 63;

/// Label keys stamped on every managed resource
pub mod labels {
    pub const ORGANIZATION: &str = "core.choreo.dev/organization";
    pub const PROJECT: &str = "core.choreo.dev/project";
    pub const COMPONENT: &str = "core.choreo.dev/component";
    pub const DEPLOYMENT_TRACK: &str = "core.choreo.dev/deployment-track";
    pub const BUILD: &str = "core.choreo.dev/build";
    pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
}
