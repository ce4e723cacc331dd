//! # Types
//!
//! Core types for the Build reconciler.

use crate::config::SharedControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::controller::build::{build_orchestrator, BuildContext};
use crate::controller::dataplane::{KubeStore, Orchestrator, OrchestratorError, ResourceStore};
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Reconciliation failed: {0}")]
    ReconciliationFailed(#[from] anyhow::Error),

    #[error("{kind} {name} owning build {build} not found")]
    OwnerNotFound {
        kind: &'static str,
        name: String,
        build: String,
    },

    /// At least one handler failed with a retryable error
    #[error("Convergence incomplete: {0}")]
    ConvergenceIncomplete(String),

    #[error("Failed to update Build status: {0}")]
    StatusUpdate(#[from] kube::Error),
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_minutes, max_minutes),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }
}

/// Backoff state of every failing resource, keyed by `namespace/name`
///
/// Entries live only while a resource keeps failing. Builds are one-shot
/// objects, so a resource that stops failing is forgotten.
#[derive(Debug, Default)]
pub struct BackoffRegistry {
    states: Mutex<HashMap<String, BackoffState>>,
}

impl BackoffRegistry {
    /// Count one more failure and return the delay before the next attempt
    /// with the failure count so far
    ///
    /// `None` if the state lock is poisoned.
    pub fn record_failure(
        &self,
        resource_key: &str,
        min_minutes: u64,
        max_minutes: u64,
    ) -> Option<(Duration, u32)> {
        let mut states = self.states.lock().ok()?;
        let state = states
            .entry(resource_key.to_string())
            .or_insert_with(|| BackoffState::new(min_minutes, max_minutes));
        state.increment_error();
        Some((
            Duration::from_secs(state.backoff.next_backoff_seconds()),
            state.error_count,
        ))
    }

    /// Drop the error history of a resource
    pub fn forget(&self, resource_key: &str) {
        if let Ok(mut states) = self.states.lock() {
            states.remove(resource_key);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.lock().map(|states| states.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared context of every Build reconciliation
#[derive(Clone)]
pub struct Reconciler {
    pub client: Client,
    pub config: SharedControllerConfig,
    /// Ordered convergence pass: CI namespace, then the Argo workflow
    pub orchestrator: Arc<Orchestrator<BuildContext>>,
    // Backoff state per resource, owned by the error policy
    pub backoff: Arc<BackoffRegistry>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(client: Client, config: SharedControllerConfig) -> Result<Self, OrchestratorError> {
        let store: Arc<dyn ResourceStore> = Arc::new(KubeStore::new(client.clone()));
        Self::with_store(client, store, config)
    }

    /// Reconciler over an arbitrary backend store
    pub fn with_store(
        client: Client,
        store: Arc<dyn ResourceStore>,
        config: SharedControllerConfig,
    ) -> Result<Self, OrchestratorError> {
        let orchestrator = Arc::new(build_orchestrator(&store, &config)?);
        Ok(Self {
            client,
            config,
            orchestrator,
            backoff: Arc::new(BackoffRegistry::default()),
        })
    }

    /// Forget the error history of a resource after a clean pass
    pub fn reset_backoff(&self, resource_key: &str) {
        self.backoff.forget(resource_key);
    }
}
