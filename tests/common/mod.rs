//! Shared fixtures for the integration tests
//!
//! `MemoryStore` is an in-memory `ResourceStore` that records every call,
//! can fail chosen operations, and can hide freshly created objects from a
//! number of subsequent reads to imitate a lagging cache.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use build_controller::controller::build::BuildContext;
use build_controller::controller::dataplane::{
    HandlerError, ObservedState, ResourceHandler, ResourceKey, ResourceKind, ResourceStore,
    StoreError,
};
use build_controller::crd::{
    Build, BuildConfiguration, BuildOwner, BuildSpec, Component, ComponentOwner, ComponentSource,
    ComponentSpec, DeploymentTrack, DeploymentTrackOwner, DeploymentTrackSpec,
    DockerConfiguration, GitRepository,
};
use kube::core::DynamicObject;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Get,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: Op,
    pub kind: &'static str,
    pub key: ResourceKey,
}

struct Failure {
    remaining: usize,
    make: fn() -> StoreError,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<(&'static str, ResourceKey), DynamicObject>,
    hidden: HashMap<(&'static str, ResourceKey), usize>,
    calls: Vec<Call>,
    failures: HashMap<(Op, &'static str), Failure>,
    hide_after_create: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Created objects read back as absent for the next `reads` gets
    pub fn with_delayed_visibility(reads: usize) -> Arc<Self> {
        let store = Self::default();
        store.inner.lock().unwrap().hide_after_create = reads;
        Arc::new(store)
    }

    pub fn insert(&self, kind: &ResourceKind, object: DynamicObject) {
        let key = ResourceKey::of(&object);
        self.inner
            .lock()
            .unwrap()
            .objects
            .insert((kind.kind, key), object);
    }

    pub fn object(&self, kind: &ResourceKind, key: &ResourceKey) -> Option<DynamicObject> {
        self.inner
            .lock()
            .unwrap()
            .objects
            .get(&(kind.kind, key.clone()))
            .cloned()
    }

    pub fn contains(&self, kind: &ResourceKind, key: &ResourceKey) -> bool {
        self.object(kind, key).is_some()
    }

    /// Fail the next `times` calls of `op` on `kind`
    pub fn fail(&self, op: Op, kind: &ResourceKind, times: usize, make: fn() -> StoreError) {
        self.inner
            .lock()
            .unwrap()
            .failures
            .insert((op, kind.kind), Failure { remaining: times, make });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls().iter().filter(|c| c.op == op).count()
    }

    pub fn count_for(&self, op: Op, kind: &ResourceKind) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.op == op && c.kind == kind.kind)
            .count()
    }

    /// Create, update and delete calls
    pub fn mutations(&self) -> usize {
        self.calls().iter().filter(|c| c.op != Op::Get).count()
    }

    fn record(&self, op: Op, kind: &ResourceKind, key: &ResourceKey) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call {
            op,
            kind: kind.kind,
            key: key.clone(),
        });
        if let Some(failure) = inner.failures.get_mut(&(op, kind.kind)) {
            if failure.remaining > 0 {
                failure.remaining -= 1;
                return Err((failure.make)());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get(
        &self,
        kind: &ResourceKind,
        key: &ResourceKey,
    ) -> Result<Option<DynamicObject>, StoreError> {
        self.record(Op::Get, kind, key)?;
        let mut inner = self.inner.lock().unwrap();
        let slot = (kind.kind, key.clone());
        if let Some(remaining) = inner.hidden.get_mut(&slot) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(None);
            }
        }
        Ok(inner.objects.get(&slot).cloned())
    }

    async fn create(&self, kind: &ResourceKind, body: &DynamicObject) -> Result<(), StoreError> {
        let key = ResourceKey::of(body);
        self.record(Op::Create, kind, &key)?;
        let mut inner = self.inner.lock().unwrap();
        let slot = (kind.kind, key.clone());
        if inner.objects.contains_key(&slot) {
            return Err(StoreError::AlreadyExists {
                kind: kind.kind.to_string(),
                name: key.name,
            });
        }
        let hide = inner.hide_after_create;
        if hide > 0 {
            inner.hidden.insert(slot.clone(), hide);
        }
        inner.objects.insert(slot, body.clone());
        Ok(())
    }

    async fn update(
        &self,
        kind: &ResourceKind,
        key: &ResourceKey,
        body: &DynamicObject,
    ) -> Result<(), StoreError> {
        self.record(Op::Update, kind, key)?;
        let mut inner = self.inner.lock().unwrap();
        match inner.objects.get_mut(&(kind.kind, key.clone())) {
            Some(object) => {
                *object = body.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                kind: kind.kind.to_string(),
                name: key.name.clone(),
            }),
        }
    }

    async fn delete(&self, kind: &ResourceKind, key: &ResourceKey) -> Result<(), StoreError> {
        self.record(Op::Delete, kind, key)?;
        let mut inner = self.inner.lock().unwrap();
        match inner.objects.remove(&(kind.kind, key.clone())) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                kind: kind.kind.to_string(),
                name: key.name.clone(),
            }),
        }
    }
}

pub fn unavailable() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

pub fn forbidden() -> StoreError {
    StoreError::Rejected {
        kind: "Namespace".to_string(),
        name: "choreo-ci-acme".to_string(),
        code: 403,
        message: "namespaces is forbidden".to_string(),
    }
}

pub const CONFIG_MAP_KIND: ResourceKind = ResourceKind {
    group: "",
    version: "v1",
    kind: "ConfigMap",
    plural: "configmaps",
    namespaced: true,
};

/// A ConfigMap handler whose intent is switched from the test
///
/// Works with any context type; the key is fixed at construction.
pub struct MarkerHandler {
    pub name: &'static str,
    pub dependencies: &'static [&'static str],
    pub required: Arc<AtomicBool>,
    pub fetch_delay: Option<Duration>,
    store: Arc<dyn ResourceStore>,
}

impl MarkerHandler {
    pub fn new(name: &'static str, store: Arc<dyn ResourceStore>) -> Self {
        Self {
            name,
            dependencies: &[],
            required: Arc::new(AtomicBool::new(true)),
            fetch_delay: None,
            store,
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::namespaced("choreo-ci-acme", self.name.to_lowercase())
    }

    pub fn object(&self) -> DynamicObject {
        let mut object = DynamicObject::new(&self.key().name, &CONFIG_MAP_KIND.api_resource());
        object.metadata.namespace = self.key().namespace;
        object
    }
}

#[async_trait]
impl<C: Send + Sync> ResourceHandler<C> for MarkerHandler {
    type State = DynamicObject;

    fn name(&self) -> &'static str {
        self.name
    }

    fn hard_dependencies(&self) -> &'static [&'static str] {
        self.dependencies
    }

    fn is_required(&self, _ctx: &C) -> bool {
        self.required.load(Ordering::SeqCst)
    }

    async fn get_current_state(
        &self,
        _ctx: &C,
    ) -> Result<ObservedState<DynamicObject>, HandlerError> {
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.store.get(&CONFIG_MAP_KIND, &self.key()).await?.into())
    }

    async fn create(&self, _ctx: &C) -> Result<(), HandlerError> {
        self.store.create(&CONFIG_MAP_KIND, &self.object()).await?;
        Ok(())
    }

    async fn update(&self, _ctx: &C, _observed: &DynamicObject) -> Result<bool, HandlerError> {
        Ok(false)
    }

    async fn delete(&self, _ctx: &C) -> Result<(), HandlerError> {
        self.store.delete(&CONFIG_MAP_KIND, &self.key()).await?;
        Ok(())
    }
}

pub fn docker_configuration() -> BuildConfiguration {
    BuildConfiguration {
        docker: Some(DockerConfiguration {
            context: "/service".to_string(),
            dockerfile_path: "/service/Dockerfile".to_string(),
        }),
        buildpack: None,
    }
}

/// Component `reading-list` in namespace `acme`, track `main`, one Build
pub fn build_context(
    build_name: &str,
    configuration: Option<BuildConfiguration>,
) -> BuildContext {
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

    let mut track = DeploymentTrack::new(
        "main",
        DeploymentTrackSpec {
            owner: DeploymentTrackOwner {
                project_name: "library".to_string(),
                component_name: "reading-list".to_string(),
            },
            build_template_spec: None,
            auto_deploy: true,
        },
    );
    track.metadata.namespace = Some("acme".to_string());

    let mut build = Build::new(
        build_name,
        BuildSpec {
            owner: BuildOwner {
                project_name: "library".to_string(),
                component_name: "reading-list".to_string(),
                deployment_track_name: "main".to_string(),
            },
            branch: Some("main".to_string()),
            git_revision: Some("0123456789abcdef".to_string()),
            path: Some("/service".to_string()),
            build_configuration: configuration,
        },
    );
    build.metadata.namespace = Some("acme".to_string());

    BuildContext::new(Arc::new(component), Arc::new(track), Arc::new(build))
}
