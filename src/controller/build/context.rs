//! # Build Context
//!
//! Snapshot of the three custom resources one Build pass converges.
//! The reconciler resolves it fresh on every pass. Handlers read it, and the
//! workflow handler leaves the progress it observed behind for status.

use crate::constants::labels;
use crate::controller::build::argo::WorkflowProgress;
use crate::controller::dataplane::naming::generate_k8s_name;
use crate::crd::{Build, BuildConfiguration, Component, DeploymentTrack};
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

const DEFAULT_BRANCH: &str = "main";
const DEFAULT_APP_PATH: &str = "/";

/// The owning Component and DeploymentTrack of a Build, plus the Build itself
///
/// Equal triples always derive equal resource names.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub component: Arc<Component>,
    pub deployment_track: Arc<DeploymentTrack>,
    pub build: Arc<Build>,
    workflow_progress: OnceLock<WorkflowProgress>,
}

impl BuildContext {
    #[must_use]
    pub fn new(
        component: Arc<Component>,
        deployment_track: Arc<DeploymentTrack>,
        build: Arc<Build>,
    ) -> Self {
        Self {
            component,
            deployment_track,
            build,
            workflow_progress: OnceLock::new(),
        }
    }

    /// Keep the first workflow progress observed during this pass
    pub fn record_workflow_progress(&self, progress: WorkflowProgress) {
        let _ = self.workflow_progress.set(progress);
    }

    /// Progress of the workflow as fetched by this pass, if it was present
    #[must_use]
    pub fn workflow_progress(&self) -> Option<&WorkflowProgress> {
        self.workflow_progress.get()
    }

    /// Organization label of the component, falling back to its namespace
    #[must_use]
    pub fn organization(&self) -> String {
        self.component
            .labels()
            .get(labels::ORGANIZATION)
            .cloned()
            .or_else(|| self.component.namespace())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.build.spec.owner.project_name
    }

    #[must_use]
    pub fn component_name(&self) -> &str {
        &self.build.spec.owner.component_name
    }

    #[must_use]
    pub fn deployment_track_name(&self) -> &str {
        &self.build.spec.owner.deployment_track_name
    }

    #[must_use]
    pub fn build_name(&self) -> &str {
        self.build.metadata.name.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn repository_url(&self) -> &str {
        &self.component.spec.source.git_repository.url
    }

    /// Build branch, then the track's template branch, then `main`
    #[must_use]
    pub fn branch(&self) -> &str {
        self.build
            .spec
            .branch
            .as_deref()
            .or_else(|| {
                self.deployment_track
                    .spec
                    .build_template_spec
                    .as_ref()
                    .and_then(|t| t.branch.as_deref())
            })
            .unwrap_or(DEFAULT_BRANCH)
    }

    #[must_use]
    pub fn git_revision(&self) -> Option<&str> {
        self.build.spec.git_revision.as_deref()
    }

    /// Build path, then the track's template path, then the repository root
    #[must_use]
    pub fn app_path(&self) -> &str {
        self.build
            .spec
            .path
            .as_deref()
            .or_else(|| {
                self.deployment_track
                    .spec
                    .build_template_spec
                    .as_ref()
                    .and_then(|t| t.path.as_deref())
            })
            .unwrap_or(DEFAULT_APP_PATH)
    }

    /// Build configuration, falling back to the track's template
    #[must_use]
    pub fn build_configuration(&self) -> Option<&BuildConfiguration> {
        self.build.spec.build_configuration.as_ref().or_else(|| {
            self.deployment_track
                .spec
                .build_template_spec
                .as_ref()
                .and_then(|t| t.build_configuration.as_ref())
        })
    }

    /// Labels stamped on every resource converged for this build
    #[must_use]
    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                labels::ORGANIZATION.to_string(),
                generate_k8s_name(&[&self.organization()]),
            ),
            (
                labels::PROJECT.to_string(),
                generate_k8s_name(&[self.project_name()]),
            ),
            (
                labels::COMPONENT.to_string(),
                generate_k8s_name(&[self.component_name()]),
            ),
            (
                labels::DEPLOYMENT_TRACK.to_string(),
                generate_k8s_name(&[self.deployment_track_name()]),
            ),
            (
                labels::BUILD.to_string(),
                generate_k8s_name(&[self.build_name()]),
            ),
            (
                labels::MANAGED_BY.to_string(),
                crate::constants::FIELD_MANAGER.to_string(),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{
        BuildOwner, BuildSpec, BuildTemplateSpec, ComponentOwner, ComponentSource, ComponentSpec,
        DeploymentTrackOwner, DeploymentTrackSpec, DockerConfiguration, GitRepository,
    };

    fn context(build_spec: BuildSpec, template: Option<BuildTemplateSpec>) -> BuildContext {
        let mut component = Component::new(
            "reading-list",
            ComponentSpec {
                r#type: "Service".to_string(),
                owner: ComponentOwner {
                    project_name: "library".to_string(),
                },
                source: ComponentSource {
                    git_repository: GitRepository {
                        url: "https://github.com/acme/reading-list".to_string(),
                    },
                },
            },
        );
        component.metadata.namespace = Some("acme".to_string());

        let track = DeploymentTrack::new(
            "main",
            DeploymentTrackSpec {
                owner: DeploymentTrackOwner {
                    project_name: "library".to_string(),
                    component_name: "reading-list".to_string(),
                },
                build_template_spec: template,
                auto_deploy: false,
            },
        );

        let build = Build::new("reading-list-build-1", build_spec);
        BuildContext::new(Arc::new(component), Arc::new(track), Arc::new(build))
    }

    fn owner() -> BuildOwner {
        BuildOwner {
            project_name: "library".to_string(),
            component_name: "reading-list".to_string(),
            deployment_track_name: "main".to_string(),
        }
    }

    fn bare_spec() -> BuildSpec {
        BuildSpec {
            owner: owner(),
            branch: None,
            git_revision: None,
            path: None,
            build_configuration: None,
        }
    }

    #[test]
    fn test_organization_falls_back_to_namespace() {
        let ctx = context(bare_spec(), None);
        assert_eq!(ctx.organization(), "acme");
    }

    #[test]
    fn test_defaults_without_template() {
        let ctx = context(bare_spec(), None);
        assert_eq!(ctx.branch(), "main");
        assert_eq!(ctx.app_path(), "/");
        assert!(ctx.build_configuration().is_none());
    }

    #[test]
    fn test_track_template_fills_gaps() {
        let template = BuildTemplateSpec {
            branch: Some("release".to_string()),
            path: Some("/service".to_string()),
            build_configuration: Some(BuildConfiguration {
                docker: Some(DockerConfiguration {
                    context: "/service".to_string(),
                    dockerfile_path: "/service/Dockerfile".to_string(),
                }),
                buildpack: None,
            }),
        };
        let mut spec = bare_spec();
        spec.branch = Some("hotfix".to_string());
        let ctx = context(spec, Some(template));

        assert_eq!(ctx.branch(), "hotfix");
        assert_eq!(ctx.app_path(), "/service");
        assert!(ctx
            .build_configuration()
            .and_then(|c| c.docker.as_ref())
            .is_some());
    }

    #[test]
    fn test_labels_identify_the_build() {
        let ctx = context(bare_spec(), None);
        let stamped = ctx.labels();
        assert_eq!(stamped[labels::ORGANIZATION], "acme");
        assert_eq!(stamped[labels::BUILD], "reading-list-build-1");
        assert_eq!(stamped[labels::MANAGED_BY], "build-controller");
    }
}
