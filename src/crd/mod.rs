//! # Custom Resource Definitions
//!
//! CRD types the build controller reads and reports on.
//!
//! ## Module Structure
//!
//! - `component.rs` - Component (source repository of a deployable unit)
//! - `deployment_track.rs` - DeploymentTrack (a branch-bound lane of a component)
//! - `build.rs` - Build (one requested image build for a track)
//! - `status.rs` - Shared status condition types

mod build;
mod component;
mod deployment_track;
mod status;

pub use build::{
    Build, BuildConfiguration, BuildOwner, BuildSpec, BuildStatus, BuildpackConfiguration,
    DockerConfiguration, ImageStatus,
};
pub use component::{Component, ComponentOwner, ComponentSource, ComponentSpec, GitRepository};
pub use deployment_track::{
    BuildTemplateSpec, DeploymentTrack, DeploymentTrackOwner, DeploymentTrackSpec,
};
pub use status::{Condition, ConditionStatus};

/// API group shared by every CRD in this controller
pub const API_GROUP: &str = "core.choreo.dev";

/// API version shared by every CRD in this controller
pub const API_VERSION: &str = "v1";
