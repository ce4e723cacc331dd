//! # CI Namespace Handler
//!
//! Converges the per-organization namespace that hosts build workflows.
//! Namespaces are shared by every build of an organization and may carry
//! labels written by other tools, so updates only add or correct the labels
//! this controller owns.

use crate::constants::labels;
use crate::controller::build::names::make_namespace_name;
use crate::controller::build::BuildContext;
use crate::controller::dataplane::{
    HandlerError, ObservedState, ResourceHandler, ResourceKey, ResourceKind, ResourceStore,
};
use async_trait::async_trait;
use kube::core::DynamicObject;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub const NAMESPACE_KIND: ResourceKind = ResourceKind {
    group: "",
    version: "v1",
    kind: "Namespace",
    plural: "namespaces",
    namespaced: false,
};

pub struct NamespaceHandler {
    store: Arc<dyn ResourceStore>,
    prefix: String,
}

impl std::fmt::Debug for NamespaceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceHandler")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl NamespaceHandler {
    #[must_use]
    pub fn new(store: Arc<dyn ResourceStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn key(&self, ctx: &BuildContext) -> ResourceKey {
        ResourceKey::cluster(make_namespace_name(&self.prefix, ctx))
    }

    fn desired_labels(ctx: &BuildContext) -> BTreeMap<String, String> {
        ctx.labels()
            .into_iter()
            .filter(|(key, _)| key == labels::ORGANIZATION || key == labels::MANAGED_BY)
            .collect()
    }

    fn desired(&self, ctx: &BuildContext) -> DynamicObject {
        let mut namespace = DynamicObject::new(&self.key(ctx).name, &NAMESPACE_KIND.api_resource());
        namespace.metadata.labels = Some(Self::desired_labels(ctx));
        namespace
    }
}

/// Labels in `desired` that are missing or different on `observed`
fn label_drift(
    desired: &BTreeMap<String, String>,
    observed: &DynamicObject,
) -> BTreeMap<String, String> {
    let current = observed.metadata.labels.as_ref();
    desired
        .iter()
        .filter(|(key, value)| current.and_then(|l| l.get(*key)) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[async_trait]
impl ResourceHandler<BuildContext> for NamespaceHandler {
    type State = DynamicObject;

    fn name(&self) -> &'static str {
        "Namespace"
    }

    fn is_required(&self, _ctx: &BuildContext) -> bool {
        true
    }

    async fn get_current_state(
        &self,
        ctx: &BuildContext,
    ) -> Result<ObservedState<DynamicObject>, HandlerError> {
        let observed = self.store.get(&NAMESPACE_KIND, &self.key(ctx)).await?;
        Ok(observed.into())
    }

    async fn create(&self, ctx: &BuildContext) -> Result<(), HandlerError> {
        self.store.create(&NAMESPACE_KIND, &self.desired(ctx)).await?;
        Ok(())
    }

    async fn update(
        &self,
        ctx: &BuildContext,
        observed: &DynamicObject,
    ) -> Result<bool, HandlerError> {
        let drift = label_drift(&Self::desired_labels(ctx), observed);
        if drift.is_empty() {
            return Ok(false);
        }

        debug!("Namespace label drift: {:?}", drift.keys().collect::<Vec<_>>());
        let key = self.key(ctx);
        self.store
            .update(&NAMESPACE_KIND, &key, &self.desired(ctx))
            .await?;
        Ok(true)
    }

    async fn delete(&self, ctx: &BuildContext) -> Result<(), HandlerError> {
        match self.store.delete(&NAMESPACE_KIND, &self.key(ctx)).await {
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
