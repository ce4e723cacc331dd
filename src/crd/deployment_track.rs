//! # DeploymentTrack
//!
//! A branch-bound lane of a component. Builds inherit the track's build
//! template when they do not override it.

use serde::{Deserialize, Serialize};

#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "DeploymentTrack",
    group = "core.choreo.dev",
    version = "v1",
    namespaced,
    shortname = "dt"
)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTrackSpec {
    pub owner: DeploymentTrackOwner,
    /// Build defaults for builds created on this track
    #[serde(default)]
    pub build_template_spec: Option<BuildTemplateSpec>,
    /// Whether new images are promoted automatically
    #[serde(default)]
    pub auto_deploy: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTrackOwner {
    pub project_name: String,
    pub component_name: String,
}

/// Defaults a Build falls back to
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildTemplateSpec {
    /// Git branch to build from
    #[serde(default)]
    pub branch: Option<String>,
    /// Path of the application inside the repository
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub build_configuration: Option<crate::crd::BuildConfiguration>,
}
