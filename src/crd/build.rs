//! # Build
//!
//! One requested container image build for a deployment track.

use crate::crd::Condition;
use serde::{Deserialize, Serialize};

/// Build Custom Resource Definition
///
/// The controller converges every Build into a CI namespace and an Argo
/// `Workflow` that clones, builds and pushes the image.
///
/// # Example
///
/// ```yaml
/// apiVersion: core.choreo.dev/v1
/// kind: Build
/// metadata:
///   name: reading-list-main-build-1
///   namespace: default-org
/// spec:
///   owner:
///     projectName: library
///     componentName: reading-list
///     deploymentTrackName: main
///   branch: main
///   path: /service
///   buildConfiguration:
///     docker:
///       context: /service
///       dockerfilePath: /service/Dockerfile
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Build",
    group = "core.choreo.dev",
    version = "v1",
    namespaced,
    status = "crate::crd::BuildStatus",
    shortname = "bld",
    printcolumn = r#"{"name":"Image", "type":"string", "jsonPath":".status.imageStatus.image"}, {"name":"Completed", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Completed\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BuildSpec {
    pub owner: BuildOwner,
    /// Git branch to build; falls back to the track's build template, then "main"
    #[serde(default)]
    pub branch: Option<String>,
    /// Specific commit to build (optional, defaults to branch head)
    #[serde(default)]
    pub git_revision: Option<String>,
    /// Application path inside the repository; falls back to the track, then "/"
    #[serde(default)]
    pub path: Option<String>,
    /// How to build the image; falls back to the track's build template
    #[serde(default)]
    pub build_configuration: Option<BuildConfiguration>,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildOwner {
    pub project_name: String,
    pub component_name: String,
    pub deployment_track_name: String,
}

/// Exactly one of `docker` or `buildpack` must be set
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfiguration {
    #[serde(default)]
    pub docker: Option<DockerConfiguration>,
    #[serde(default)]
    pub buildpack: Option<BuildpackConfiguration>,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DockerConfiguration {
    /// Docker build context relative to the repository root
    pub context: String,
    /// Dockerfile path relative to the repository root
    pub dockerfile_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildpackConfiguration {
    /// Buildpack language name (e.g. "Go", "Java", "NodeJS")
    pub name: String,
    /// Language runtime version
    #[serde(default)]
    pub version: Option<String>,
}

/// Status of the Build resource
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildStatus {
    /// Step and convergence conditions
    /// Types: StepCloneSucceeded, StepBuildSucceeded, StepPushSucceeded, Completed, Converged
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Observed generation
    #[serde(default)]
    pub observed_generation: Option<i64>,
    /// Image produced by the push step
    #[serde(default)]
    pub image_status: Option<ImageStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageStatus {
    pub image: String,
}
