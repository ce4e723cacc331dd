//! Build handlers against an in-memory store: progress read-back,
//! immutability of submitted workflows and namespace label repair.

mod common;

use build_controller::constants::labels;
use build_controller::controller::build::argo::{
    BuildWorkflowStep, WorkflowHandler, WorkflowProgress, WorkflowSettings, WORKFLOW_KIND,
};
use build_controller::controller::build::{BuildContext, NamespaceHandler, NAMESPACE_KIND};
use build_controller::controller::dataplane::{
    ObservedState, Orchestrator, ResourceHandler, ResourceKey, ResourceStore, StepPhase,
};
use common::{build_context, docker_configuration, MemoryStore, Op};
use kube::core::DynamicObject;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn workflow_key() -> ResourceKey {
    ResourceKey::namespaced("choreo-ci-acme", "reading-list-build-1")
}

fn stored_workflow(nodes: serde_json::Value) -> DynamicObject {
    serde_json::from_value(json!({
        "apiVersion": "argoproj.io/v1alpha1",
        "kind": "Workflow",
        "metadata": {
            "name": "reading-list-build-1",
            "namespace": "choreo-ci-acme"
        },
        "spec": {
            "workflowTemplateRef": { "name": "an-older-template", "clusterScope": true }
        },
        "status": {
            "phase": "Running",
            "nodes": nodes
        }
    }))
    .expect("valid workflow object")
}

#[tokio::test]
async fn test_progress_is_read_back_from_stored_workflow() {
    let store = MemoryStore::new();
    store.insert(
        &WORKFLOW_KIND,
        stored_workflow(json!({
            "n1": { "id": "n1", "name": "clone", "templateName": "clone-step", "phase": "Succeeded" },
            "n2": { "id": "n2", "name": "build", "templateName": "build-step", "phase": "Succeeded" },
            "n3": {
                "id": "n3",
                "name": "push",
                "templateName": "push-step",
                "phase": "Succeeded",
                "outputs": {
                    "parameters": [
                        { "name": "image", "value": "registry.choreo-system:5000/acme-library:0123abcd" }
                    ]
                }
            }
        })),
    );
    let handler = WorkflowHandler::new(store.clone(), WorkflowSettings::default());
    let ctx = build_context("reading-list-build-1", Some(docker_configuration()));

    let observed = handler
        .get_current_state(&ctx)
        .await
        .expect("fetch succeeds");
    let ObservedState::Present(workflow) = observed else {
        panic!("workflow should be present");
    };
    let progress = WorkflowProgress::from_workflow(&workflow);

    assert!(progress.is_completed());
    assert!(progress.is_finished());
    assert_eq!(
        progress.image.as_deref(),
        Some("registry.choreo-system:5000/acme-library:0123abcd")
    );
}

#[tokio::test]
async fn test_error_node_fails_the_build_and_unknown_phase_does_not() {
    let store = MemoryStore::new();
    store.insert(
        &WORKFLOW_KIND,
        stored_workflow(json!({
            "n1": { "id": "n1", "name": "clone", "templateName": "clone-step", "phase": "Omitted" },
            "n2": { "id": "n2", "name": "build", "templateName": "build-step", "phase": "Error" }
        })),
    );
    let handler = WorkflowHandler::new(store.clone(), WorkflowSettings::default());
    let ctx = build_context("reading-list-build-1", Some(docker_configuration()));

    let ObservedState::Present(workflow) = handler
        .get_current_state(&ctx)
        .await
        .expect("fetch succeeds")
    else {
        panic!("workflow should be present");
    };
    let progress = WorkflowProgress::from_workflow(&workflow);

    assert_eq!(progress.step(BuildWorkflowStep::Clone), Some(StepPhase::Succeeded));
    assert_eq!(progress.step(BuildWorkflowStep::Build), Some(StepPhase::Failed));
    assert_eq!(progress.step(BuildWorkflowStep::Push), None);
    assert!(progress.has_failed());
    assert!(!progress.is_completed());
}

#[tokio::test]
async fn test_submitted_workflow_is_never_patched() {
    let store = MemoryStore::new();
    store.insert(&WORKFLOW_KIND, stored_workflow(json!({})));
    let dyn_store: Arc<dyn ResourceStore> = store.clone();
    let orchestrator = Orchestrator::<BuildContext>::new(Duration::from_secs(5))
        .with_handler(NamespaceHandler::new(Arc::clone(&dyn_store), "choreo-ci"))
        .and_then(|o| o.with_handler(WorkflowHandler::new(dyn_store, WorkflowSettings::default())))
        .expect("handlers register in dependency order");
    let ctx = build_context("reading-list-build-1", Some(docker_configuration()));

    let result = orchestrator.reconcile(&ctx).await;

    assert!(result.is_success(), "{}", result.summary());
    assert_eq!(store.count_for(Op::Update, &WORKFLOW_KIND), 0);
    assert_eq!(store.count_for(Op::Create, &WORKFLOW_KIND), 0);
    let kept = store
        .object(&WORKFLOW_KIND, &workflow_key())
        .expect("workflow kept");
    assert_eq!(
        kept.data["spec"]["workflowTemplateRef"]["name"],
        "an-older-template"
    );
}

#[tokio::test]
async fn test_pass_leaves_observed_progress_on_context() {
    let store = MemoryStore::new();
    store.insert(
        &WORKFLOW_KIND,
        stored_workflow(json!({
            "n1": { "id": "n1", "name": "clone", "templateName": "clone-step", "phase": "Succeeded" },
            "n2": { "id": "n2", "name": "build", "templateName": "build-step", "phase": "Running" }
        })),
    );
    let dyn_store: Arc<dyn ResourceStore> = store.clone();
    let orchestrator = Orchestrator::<BuildContext>::new(Duration::from_secs(5))
        .with_handler(NamespaceHandler::new(Arc::clone(&dyn_store), "choreo-ci"))
        .and_then(|o| o.with_handler(WorkflowHandler::new(dyn_store, WorkflowSettings::default())))
        .expect("handlers register in dependency order");
    let ctx = build_context("reading-list-build-1", Some(docker_configuration()));

    let result = orchestrator.reconcile(&ctx).await;

    assert!(result.is_success(), "{}", result.summary());
    let progress = ctx.workflow_progress().expect("progress observed");
    assert_eq!(progress.step(BuildWorkflowStep::Build), Some(StepPhase::Running));
    assert!(!progress.is_finished());
    // The pass fetched the workflow once and nothing reads it again
    assert_eq!(store.count_for(Op::Get, &WORKFLOW_KIND), 1);
}

#[tokio::test]
async fn test_pass_creating_workflow_observes_no_progress() {
    let store = MemoryStore::new();
    let dyn_store: Arc<dyn ResourceStore> = store.clone();
    let orchestrator = Orchestrator::<BuildContext>::new(Duration::from_secs(5))
        .with_handler(NamespaceHandler::new(Arc::clone(&dyn_store), "choreo-ci"))
        .and_then(|o| o.with_handler(WorkflowHandler::new(dyn_store, WorkflowSettings::default())))
        .expect("handlers register in dependency order");
    let ctx = build_context("reading-list-build-1", Some(docker_configuration()));

    orchestrator.reconcile(&ctx).await;

    assert!(ctx.workflow_progress().is_none());
    assert_eq!(store.count_for(Op::Create, &WORKFLOW_KIND), 1);
}

#[tokio::test]
async fn test_workflow_delete_is_idempotent() {
    let store = MemoryStore::new();
    store.insert(&WORKFLOW_KIND, stored_workflow(json!({})));
    let handler = WorkflowHandler::new(store.clone(), WorkflowSettings::default());
    let ctx = build_context("reading-list-build-1", Some(docker_configuration()));

    handler.delete(&ctx).await.expect("first delete");
    handler.delete(&ctx).await.expect("second delete");

    assert!(!store.contains(&WORKFLOW_KIND, &workflow_key()));
    assert_eq!(store.count(Op::Delete), 2);
}

#[tokio::test]
async fn test_namespace_label_drift_is_repaired_once() {
    let store = MemoryStore::new();
    let mut namespace: DynamicObject = serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": "choreo-ci-acme",
            "labels": { "core.choreo.dev/organization": "someone-else" }
        }
    }))
    .expect("valid namespace object");
    namespace.metadata.namespace = None;
    store.insert(&NAMESPACE_KIND, namespace);

    let handler = NamespaceHandler::new(store.clone(), "choreo-ci");
    let orchestrator = Orchestrator::<BuildContext>::new(Duration::from_secs(5))
        .with_handler(handler)
        .expect("single handler");
    let ctx = build_context("reading-list-build-1", Some(docker_configuration()));

    let first = orchestrator.reconcile(&ctx).await;
    let second = orchestrator.reconcile(&ctx).await;

    assert!(first.changed());
    assert!(!second.changed());
    assert_eq!(store.count(Op::Update), 1);

    let repaired = store
        .object(&NAMESPACE_KIND, &ResourceKey::cluster("choreo-ci-acme"))
        .expect("namespace kept");
    let repaired_labels = repaired.metadata.labels.expect("labels");
    assert_eq!(
        repaired_labels.get(labels::ORGANIZATION).map(String::as_str),
        Some("acme")
    );
    assert_eq!(
        repaired_labels.get(labels::MANAGED_BY).map(String::as_str),
        Some("build-controller")
    );
}
