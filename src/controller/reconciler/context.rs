//! # Context Resolution
//!
//! Looks up the Component and DeploymentTrack a Build names as its owners.
//! Owners live in the Build's namespace and are matched by their
//! `core.choreo.dev/*` name label, or by object name when the label is absent.

use crate::constants::labels;
use crate::controller::build::BuildContext;
use crate::controller::reconciler::types::ReconcilerError;
use crate::crd::{Build, Component, DeploymentTrack};
use anyhow::Context;
use kube::api::{Api, ListParams};
use kube::{Client, Resource, ResourceExt};
use std::sync::Arc;

/// First object whose `label` (or, failing that, name) equals `name`
pub(crate) fn find_owner<K>(items: Vec<K>, label: &str, name: &str) -> Option<K>
where
    K: Resource,
{
    let (labelled, unlabelled): (Vec<K>, Vec<K>) = items
        .into_iter()
        .partition(|item| item.labels().contains_key(label));

    labelled
        .into_iter()
        .find(|item| item.labels().get(label).map(String::as_str) == Some(name))
        .or_else(|| unlabelled.into_iter().find(|item| item.name_any() == name))
}

/// Resolve the owning Component and DeploymentTrack of `build`
pub async fn resolve_build_context(
    client: &Client,
    build: Arc<Build>,
) -> Result<BuildContext, ReconcilerError> {
    let namespace = build.namespace().unwrap_or_else(|| "default".to_string());
    let owner = &build.spec.owner;

    let components: Api<Component> = Api::namespaced(client.clone(), &namespace);
    let component_list = components
        .list(&ListParams::default())
        .await
        .with_context(|| format!("Failed to list Components in namespace {namespace}"))?;
    let component = find_owner(component_list.items, labels::COMPONENT, &owner.component_name)
        .ok_or_else(|| ReconcilerError::OwnerNotFound {
            kind: "Component",
            name: owner.component_name.clone(),
            build: build.name_any(),
        })?;

    let tracks: Api<DeploymentTrack> = Api::namespaced(client.clone(), &namespace);
    let track_list = tracks
        .list(&ListParams::default())
        .await
        .with_context(|| format!("Failed to list DeploymentTracks in namespace {namespace}"))?;
    let candidates = track_list
        .items
        .into_iter()
        .filter(|track| track.spec.owner.component_name == owner.component_name)
        .collect();
    let deployment_track = find_owner(
        candidates,
        labels::DEPLOYMENT_TRACK,
        &owner.deployment_track_name,
    )
    .ok_or_else(|| ReconcilerError::OwnerNotFound {
        kind: "DeploymentTrack",
        name: owner.deployment_track_name.clone(),
        build: build.name_any(),
    })?;

    Ok(BuildContext::new(
        Arc::new(component),
        Arc::new(deployment_track),
        build,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{DeploymentTrackOwner, DeploymentTrackSpec};

    fn track(object_name: &str, label: Option<&str>) -> DeploymentTrack {
        let mut track = DeploymentTrack::new(
            object_name,
            DeploymentTrackSpec {
                owner: DeploymentTrackOwner {
                    project_name: "library".to_string(),
                    component_name: "reading-list".to_string(),
                },
                build_template_spec: None,
                auto_deploy: false,
            },
        );
        if let Some(value) = label {
            track
                .labels_mut()
                .insert(labels::DEPLOYMENT_TRACK.to_string(), value.to_string());
        }
        track
    }

    #[test]
    fn test_find_owner_prefers_label() {
        let items = vec![
            track("main", Some("legacy")),
            track("reading-list-main-x7f", Some("main")),
        ];
        let found = find_owner(items, labels::DEPLOYMENT_TRACK, "main").expect("owner found");
        assert_eq!(found.name_any(), "reading-list-main-x7f");
    }

    #[test]
    fn test_find_owner_falls_back_to_name() {
        let items = vec![track("main", None), track("dev", None)];
        let found = find_owner(items, labels::DEPLOYMENT_TRACK, "dev").expect("owner found");
        assert_eq!(found.name_any(), "dev");
    }

    #[test]
    fn test_find_owner_missing() {
        let items = vec![track("main", None)];
        assert!(find_owner(items, labels::DEPLOYMENT_TRACK, "release").is_none());
    }
}
