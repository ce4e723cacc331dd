//! # Resource Store
//!
//! Capability-scoped access to the backend that holds the converged
//! resources. Handlers receive an `Arc<dyn ResourceStore>` at construction;
//! the store is the only shared mutable state and must be safe to use from
//! concurrent reconciliations of different builds.

use crate::constants::FIELD_MANAGER;
use crate::controller::dataplane::error::StoreError;
use async_trait::async_trait;
use kube::{
    api::{Api, ApiResource, DeleteParams, Patch, PatchParams, PostParams},
    core::{DynamicObject, GroupVersionKind},
    Client,
};
use tracing::debug;

/// Static description of a backend resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKind {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
    pub namespaced: bool,
}

impl ResourceKind {
    /// `apiVersion` as written in manifests (`v1` for the core group)
    #[must_use]
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    #[must_use]
    pub fn api_resource(&self) -> ApiResource {
        let gvk = GroupVersionKind::gvk(self.group, self.version, self.kind);
        ApiResource::from_gvk_with_plural(&gvk, self.plural)
    }
}

/// Location of one resource in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    /// `None` for cluster-scoped kinds
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceKey {
    #[must_use]
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// Key of an object built for submission, read from its metadata
    #[must_use]
    pub fn of(object: &DynamicObject) -> Self {
        Self {
            namespace: object.metadata.namespace.clone(),
            name: object.metadata.name.clone().unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{}", namespace, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Backend resource store keyed by kind and identity
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch a resource; `Ok(None)` when the backend reports not-found
    async fn get(
        &self,
        kind: &ResourceKind,
        key: &ResourceKey,
    ) -> Result<Option<DynamicObject>, StoreError>;

    /// Create a resource; the key is taken from the body's metadata
    async fn create(&self, kind: &ResourceKind, body: &DynamicObject) -> Result<(), StoreError>;

    /// Replace the fields this controller owns on an existing resource
    async fn update(
        &self,
        kind: &ResourceKind,
        key: &ResourceKey,
        body: &DynamicObject,
    ) -> Result<(), StoreError>;

    /// Delete a resource; `StoreError::NotFound` when already absent
    async fn delete(&self, kind: &ResourceKind, key: &ResourceKey) -> Result<(), StoreError>;
}

/// [`ResourceStore`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, kind: &ResourceKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = kind.api_resource();
        match namespace {
            Some(namespace) if kind.namespaced => {
                Api::namespaced_with(self.client.clone(), namespace, &ar)
            }
            _ => Api::all_with(self.client.clone(), &ar),
        }
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get(
        &self,
        kind: &ResourceKind,
        key: &ResourceKey,
    ) -> Result<Option<DynamicObject>, StoreError> {
        self.api(kind, key.namespace.as_deref())
            .get_opt(&key.name)
            .await
            .map_err(|e| StoreError::from_kube(e, kind.kind, &key.name))
    }

    async fn create(&self, kind: &ResourceKind, body: &DynamicObject) -> Result<(), StoreError> {
        let key = ResourceKey::of(body);
        self.api(kind, key.namespace.as_deref())
            .create(&PostParams::default(), body)
            .await
            .map_err(|e| StoreError::from_kube(e, kind.kind, &key.name))?;
        debug!("Created {} {}", kind.kind, key);
        Ok(())
    }

    async fn update(
        &self,
        kind: &ResourceKind,
        key: &ResourceKey,
        body: &DynamicObject,
    ) -> Result<(), StoreError> {
        // Server-side apply only touches the fields present in `body`, so
        // fields owned by other managers survive the update.
        let params = PatchParams::apply(FIELD_MANAGER).force();
        self.api(kind, key.namespace.as_deref())
            .patch(&key.name, &params, &Patch::Apply(body))
            .await
            .map_err(|e| StoreError::from_kube(e, kind.kind, &key.name))?;
        debug!("Updated {} {}", kind.kind, key);
        Ok(())
    }

    async fn delete(&self, kind: &ResourceKind, key: &ResourceKey) -> Result<(), StoreError> {
        self.api(kind, key.namespace.as_deref())
            .delete(&key.name, &DeleteParams::background())
            .await
            .map_err(|e| StoreError::from_kube(e, kind.kind, &key.name))?;
        debug!("Deleted {} {}", kind.kind, key);
        Ok(())
    }
}
