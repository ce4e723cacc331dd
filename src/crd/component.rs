//! # Component
//!
//! A deployable unit and the repository its source lives in.

use serde::{Deserialize, Serialize};

/// Component Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: core.choreo.dev/v1
/// kind: Component
/// metadata:
///   name: reading-list
///   namespace: default-org
///   labels:
///     core.choreo.dev/organization: default-org
/// spec:
///   type: Service
///   owner:
///     projectName: library
///   source:
///     gitRepository:
///       url: https://github.com/acme/reading-list
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Component",
    group = "core.choreo.dev",
    version = "v1",
    namespaced,
    shortname = "comp"
)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    /// Component type (e.g. "Service", "WebApplication", "ScheduledTask")
    pub r#type: String,
    /// Logical owner of the component
    pub owner: ComponentOwner,
    /// Where the component's source code lives
    pub source: ComponentSource,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentOwner {
    /// Project the component belongs to
    pub project_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSource {
    pub git_repository: GitRepository,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitRepository {
    /// Clone URL of the repository
    pub url: String,
}
