//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_BACKOFF_MAX_MINUTES, DEFAULT_BACKOFF_MIN_MINUTES, DEFAULT_CI_NAMESPACE_PREFIX,
    DEFAULT_HANDLER_TIMEOUT_SECS, DEFAULT_IMAGE_REGISTRY, DEFAULT_METRICS_PORT,
    DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS, DEFAULT_RUNNING_WORKFLOW_REQUEUE_SECS,
    DEFAULT_WORKFLOW_SERVICE_ACCOUNT, DEFAULT_WORKFLOW_TEMPLATE_NAME,
    DEFAULT_WORKFLOW_TTL_SECONDS_AFTER_COMPLETION,
};
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// HTTP port for `/metrics`, `/healthz` and `/readyz`
    pub metrics_port: u16,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Reconciliation error requeue interval (seconds)
    /// Used when the backoff state for a resource cannot be read
    pub reconciliation_error_requeue_secs: u64,
    /// Upper bound for a single handler step (seconds)
    /// A step that exceeds it is reported as a transient failure
    pub handler_timeout_secs: u64,
    /// Fibonacci backoff lower bound (minutes)
    pub backoff_min_minutes: u64,
    /// Fibonacci backoff upper bound (minutes)
    pub backoff_max_minutes: u64,
    /// Requeue interval while a build workflow is still running (seconds)
    pub running_workflow_requeue_secs: u64,
    /// Prefix for per-organization CI namespaces
    pub ci_namespace_prefix: String,
    /// Name of the ClusterWorkflowTemplate referenced by every build workflow
    pub workflow_template_name: String,
    /// Service account the workflow pods run as
    pub workflow_service_account: String,
    /// TTL for finished workflows (seconds)
    pub workflow_ttl_seconds_after_completion: i64,
    /// Registry the push step publishes to
    pub image_registry: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            log_level: "INFO".to_string(),
            reconciliation_error_requeue_secs: DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            handler_timeout_secs: DEFAULT_HANDLER_TIMEOUT_SECS,
            backoff_min_minutes: DEFAULT_BACKOFF_MIN_MINUTES,
            backoff_max_minutes: DEFAULT_BACKOFF_MAX_MINUTES,
            running_workflow_requeue_secs: DEFAULT_RUNNING_WORKFLOW_REQUEUE_SECS,
            ci_namespace_prefix: DEFAULT_CI_NAMESPACE_PREFIX.to_string(),
            workflow_template_name: DEFAULT_WORKFLOW_TEMPLATE_NAME.to_string(),
            workflow_service_account: DEFAULT_WORKFLOW_SERVICE_ACCOUNT.to_string(),
            workflow_ttl_seconds_after_completion: DEFAULT_WORKFLOW_TTL_SECONDS_AFTER_COMPLETION,
            image_registry: DEFAULT_IMAGE_REGISTRY.to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
            reconciliation_error_requeue_secs: env_var_or_default(
                "RECONCILIATION_ERROR_REQUEUE_SECS",
                DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            ),
            handler_timeout_secs: env_var_or_default(
                "HANDLER_TIMEOUT_SECS",
                DEFAULT_HANDLER_TIMEOUT_SECS,
            ),
            backoff_min_minutes: env_var_or_default(
                "BACKOFF_MIN_MINUTES",
                DEFAULT_BACKOFF_MIN_MINUTES,
            ),
            backoff_max_minutes: env_var_or_default(
                "BACKOFF_MAX_MINUTES",
                DEFAULT_BACKOFF_MAX_MINUTES,
            ),
            running_workflow_requeue_secs: env_var_or_default(
                "RUNNING_WORKFLOW_REQUEUE_SECS",
                DEFAULT_RUNNING_WORKFLOW_REQUEUE_SECS,
            ),
            ci_namespace_prefix: env_var_or_default_str(
                "CI_NAMESPACE_PREFIX",
                DEFAULT_CI_NAMESPACE_PREFIX,
            ),
            workflow_template_name: env_var_or_default_str(
                "WORKFLOW_TEMPLATE_NAME",
                DEFAULT_WORKFLOW_TEMPLATE_NAME,
            ),
            workflow_service_account: env_var_or_default_str(
                "WORKFLOW_SERVICE_ACCOUNT",
                DEFAULT_WORKFLOW_SERVICE_ACCOUNT,
            ),
            workflow_ttl_seconds_after_completion: env_var_or_default(
                "WORKFLOW_TTL_SECONDS_AFTER_COMPLETION",
                DEFAULT_WORKFLOW_TTL_SECONDS_AFTER_COMPLETION,
            ),
            image_registry: env_var_or_default_str("IMAGE_REGISTRY", DEFAULT_IMAGE_REGISTRY),
        }
    }

    /// Get reconciliation error requeue duration
    #[must_use]
    pub fn reconciliation_error_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.reconciliation_error_requeue_secs)
    }

    /// Get handler step timeout
    #[must_use]
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_timeout_secs)
    }

    /// Get requeue duration for builds whose workflow is still running
    #[must_use]
    pub fn running_workflow_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.running_workflow_requeue_secs)
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
