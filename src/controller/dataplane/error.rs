//! # Error Taxonomy
//!
//! Errors surfaced by the backend store and by resource handlers, and the
//! transient/permanent classification the orchestrator applies to them.
//!
//! Handlers only report what happened. Classification happens in
//! [`HandlerError::class`], called by the orchestrator.

use std::time::Duration;
use thiserror::Error;

/// Failure reported by a [`ResourceStore`](crate::controller::dataplane::ResourceStore)
///
/// Not-found on `get` is not an error (it is `Ok(None)`); `NotFound` here is
/// only produced by `update` and `delete`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: String, name: String },

    #[error("{kind} {name} not found")]
    NotFound { kind: String, name: String },

    #[error("conflict writing {kind} {name}: {message}")]
    Conflict {
        kind: String,
        name: String,
        message: String,
    },

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend rejected {kind} {name} (HTTP {code}): {message}")]
    Rejected {
        kind: String,
        name: String,
        code: u16,
        message: String,
    },
}

impl StoreError {
    /// Map a Kubernetes API error onto the store taxonomy
    ///
    /// 409 with reason `AlreadyExists` is split from plain conflicts so that
    /// create can treat it as convergence already reached.
    #[must_use]
    pub fn from_kube(error: kube::Error, kind: &str, name: &str) -> Self {
        match error {
            kube::Error::Api(response) => match response.code {
                404 => StoreError::NotFound {
                    kind: kind.to_string(),
                    name: name.to_string(),
                },
                409 if response.reason == "AlreadyExists" => StoreError::AlreadyExists {
                    kind: kind.to_string(),
                    name: name.to_string(),
                },
                409 => StoreError::Conflict {
                    kind: kind.to_string(),
                    name: name.to_string(),
                    message: response.message.clone(),
                },
                408 | 429 | 500..=599 => StoreError::Unavailable(format!(
                    "{kind} {name}: HTTP {}: {}",
                    response.code, response.message
                )),
                code => StoreError::Rejected {
                    kind: kind.to_string(),
                    name: name.to_string(),
                    code,
                    message: response.message.clone(),
                },
            },
            // Transport, TLS, auth-exec and service errors: the request may be
            // retried as-is once connectivity returns.
            other => StoreError::Unavailable(format!("{kind} {name}: {other}")),
        }
    }
}

/// Failure reported by a resource handler
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid desired state: {0}")]
    InvalidDesiredState(String),

    #[error("failed to decode observed {kind}: {source}")]
    Decode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{operation} timed out after {}s", timeout.as_secs())]
    TimedOut {
        operation: &'static str,
        timeout: Duration,
    },
}

/// Handler list that cannot be run in the order it was declared
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("handler {handler} depends on {dependency}, which is not registered before it")]
    UnknownDependency {
        handler: &'static str,
        dependency: &'static str,
    },

    #[error("handler {0} is registered twice")]
    DuplicateHandler(&'static str),
}

/// Whether a failure is worth retrying with backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Timeouts, conflicts, rate limits, unavailable backend
    Transient,
    /// Malformed desired state or a request the backend will keep rejecting
    Permanent,
}

impl ErrorClass {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Transient => "transient",
            ErrorClass::Permanent => "permanent",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl HandlerError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            // A resource that vanished or already appeared between fetch and
            // write is re-evaluated on the next pass. 404 on write also covers
            // a namespace the API server does not serve yet.
            HandlerError::Store(
                StoreError::AlreadyExists { .. }
                | StoreError::NotFound { .. }
                | StoreError::Conflict { .. }
                | StoreError::Unavailable(_),
            )
            | HandlerError::TimedOut { .. } => ErrorClass::Transient,
            HandlerError::Store(StoreError::Rejected { .. })
            | HandlerError::InvalidDesiredState(_)
            | HandlerError::Decode { .. } => ErrorClass::Permanent,
        }
    }

    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, HandlerError::Store(StoreError::AlreadyExists { .. }))
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, HandlerError::Store(StoreError::NotFound { .. }))
    }
}
