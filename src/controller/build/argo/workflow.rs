//! # Argo Workflow Handler
//!
//! Converges the Argo `Workflow` that clones, builds and pushes the image
//! for one Build. The workflow references a cluster-scoped
//! `ClusterWorkflowTemplate` and passes the build inputs as parameters.
//!
//! Workflows are one-shot executions: once submitted they are never updated.
//! A changed Build spec produces a new Build, and therefore a new workflow.

use crate::config::ControllerConfig;
use crate::controller::build::argo::phase::WorkflowProgress;
use crate::controller::build::argo::types::{
    Arguments, Parameter, TtlStrategy, Workflow, WorkflowSpec, WorkflowTemplateRef, WORKFLOW_KIND,
};
use crate::controller::build::names::{make_image_name, make_namespace_name, make_workflow_name};
use crate::controller::build::BuildContext;
use crate::controller::dataplane::{
    HandlerError, ObservedState, ResourceHandler, ResourceKey, ResourceStore,
};
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::DynamicObject;
use std::sync::Arc;

/// Length of the commit prefix used as image tag
const SHORT_REVISION_LEN: usize = 8;

/// Workflow submission settings taken from controller configuration
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub namespace_prefix: String,
    pub template_name: String,
    pub service_account: String,
    pub ttl_seconds_after_completion: i64,
    pub image_registry: String,
}

impl WorkflowSettings {
    #[must_use]
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            namespace_prefix: config.ci_namespace_prefix.clone(),
            template_name: config.workflow_template_name.clone(),
            service_account: config.workflow_service_account.clone(),
            ttl_seconds_after_completion: config.workflow_ttl_seconds_after_completion,
            image_registry: config.image_registry.clone(),
        }
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default())
    }
}

fn image_tag(ctx: &BuildContext) -> String {
    match ctx.git_revision() {
        Some(revision) if !revision.is_empty() => {
            revision.chars().take(SHORT_REVISION_LEN).collect()
        }
        _ => make_workflow_name(ctx),
    }
}

/// Build the desired workflow for a build
///
/// # Errors
///
/// `InvalidDesiredState` when the build (and its track template) configure
/// neither or both of docker and buildpack.
pub fn make_argo_workflow(
    ctx: &BuildContext,
    settings: &WorkflowSettings,
) -> Result<Workflow, HandlerError> {
    let configuration = ctx.build_configuration().ok_or_else(|| {
        HandlerError::InvalidDesiredState(format!(
            "build {} has no build configuration",
            ctx.build_name()
        ))
    })?;

    let mut parameters = vec![
        Parameter::new("git-repo", ctx.repository_url()),
        Parameter::new("branch", ctx.branch()),
        Parameter::new("git-revision", ctx.git_revision().unwrap_or_default()),
        Parameter::new("app-path", ctx.app_path()),
        Parameter::new(
            "image-name",
            format!("{}/{}", settings.image_registry, make_image_name(ctx)),
        ),
        Parameter::new("image-tag", image_tag(ctx)),
    ];

    match (&configuration.docker, &configuration.buildpack) {
        (Some(docker), None) => {
            parameters.push(Parameter::new("build-mode", "docker"));
            parameters.push(Parameter::new("docker-context", docker.context.as_str()));
            parameters.push(Parameter::new(
                "dockerfile-path",
                docker.dockerfile_path.as_str(),
            ));
        }
        (None, Some(buildpack)) => {
            parameters.push(Parameter::new("build-mode", "buildpack"));
            parameters.push(Parameter::new("buildpack", buildpack.name.as_str()));
            parameters.push(Parameter::new(
                "buildpack-version",
                buildpack.version.as_deref().unwrap_or_default(),
            ));
        }
        (Some(_), Some(_)) => {
            return Err(HandlerError::InvalidDesiredState(format!(
                "build {} configures both docker and buildpack",
                ctx.build_name()
            )));
        }
        (None, None) => {
            return Err(HandlerError::InvalidDesiredState(format!(
                "build {} configures neither docker nor buildpack",
                ctx.build_name()
            )));
        }
    }

    Ok(Workflow {
        metadata: ObjectMeta {
            name: Some(make_workflow_name(ctx)),
            namespace: Some(make_namespace_name(&settings.namespace_prefix, ctx)),
            labels: Some(ctx.labels()),
            ..ObjectMeta::default()
        },
        spec: WorkflowSpec {
            workflow_template_ref: Some(WorkflowTemplateRef {
                name: settings.template_name.clone(),
                cluster_scope: true,
            }),
            service_account_name: Some(settings.service_account.clone()),
            ttl_strategy: Some(TtlStrategy {
                seconds_after_completion: Some(settings.ttl_seconds_after_completion),
            }),
            arguments: Arguments { parameters },
        },
        status: None,
    })
}

/// Render a typed workflow as a store body
fn to_dynamic(workflow: &Workflow) -> Result<DynamicObject, HandlerError> {
    let mut value = serde_json::to_value(workflow)
        .map_err(|e| HandlerError::InvalidDesiredState(format!("unencodable workflow: {e}")))?;
    if let Some(object) = value.as_object_mut() {
        object.insert("apiVersion".to_string(), WORKFLOW_KIND.api_version().into());
        object.insert("kind".to_string(), WORKFLOW_KIND.kind.into());
    }
    serde_json::from_value(value)
        .map_err(|e| HandlerError::InvalidDesiredState(format!("unencodable workflow: {e}")))
}

fn from_dynamic(object: DynamicObject) -> Result<Workflow, HandlerError> {
    let value = serde_json::to_value(object).map_err(|source| HandlerError::Decode {
        kind: WORKFLOW_KIND.kind,
        source,
    })?;
    serde_json::from_value(value).map_err(|source| HandlerError::Decode {
        kind: WORKFLOW_KIND.kind,
        source,
    })
}

pub struct WorkflowHandler {
    store: Arc<dyn ResourceStore>,
    settings: WorkflowSettings,
}

impl std::fmt::Debug for WorkflowHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowHandler")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl WorkflowHandler {
    #[must_use]
    pub fn new(store: Arc<dyn ResourceStore>, settings: WorkflowSettings) -> Self {
        Self { store, settings }
    }

    fn key(&self, ctx: &BuildContext) -> ResourceKey {
        ResourceKey::namespaced(
            make_namespace_name(&self.settings.namespace_prefix, ctx),
            make_workflow_name(ctx),
        )
    }
}

#[async_trait]
impl ResourceHandler<BuildContext> for WorkflowHandler {
    type State = Workflow;

    fn name(&self) -> &'static str {
        "ArgoWorkflow"
    }

    fn hard_dependencies(&self) -> &'static [&'static str] {
        &["Namespace"]
    }

    fn supports_update(&self) -> bool {
        false
    }

    fn is_required(&self, _ctx: &BuildContext) -> bool {
        true
    }

    async fn get_current_state(
        &self,
        ctx: &BuildContext,
    ) -> Result<ObservedState<Workflow>, HandlerError> {
        match self.store.get(&WORKFLOW_KIND, &self.key(ctx)).await? {
            Some(object) => {
                let workflow = from_dynamic(object)?;
                ctx.record_workflow_progress(WorkflowProgress::from_workflow(&workflow));
                Ok(ObservedState::Present(workflow))
            }
            None => Ok(ObservedState::Absent),
        }
    }

    async fn create(&self, ctx: &BuildContext) -> Result<(), HandlerError> {
        let workflow = make_argo_workflow(ctx, &self.settings)?;
        self.store
            .create(&WORKFLOW_KIND, &to_dynamic(&workflow)?)
            .await?;
        Ok(())
    }

    async fn update(&self, _ctx: &BuildContext, _observed: &Workflow) -> Result<bool, HandlerError> {
        Ok(false)
    }

    async fn delete(&self, ctx: &BuildContext) -> Result<(), HandlerError> {
        match self.store.delete(&WORKFLOW_KIND, &self.key(ctx)).await {
            Ok(()) => Ok(()),
            Err(error) => {
                let error = HandlerError::from(error);
                if error.is_not_found() {
                    Ok(())
                } else {
                    Err(error)
                }
            }
        }
    }
}
