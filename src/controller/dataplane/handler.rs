//! # Resource Handler
//!
//! Contract implemented once per external resource kind.
//!
//! A handler knows how to name its resource, whether the resource should
//! exist for a given context, how to read it back from the store and how to
//! create, update or delete it. It does not decide which action to take and
//! it never classifies errors; both belong to the
//! [`Orchestrator`](crate::controller::dataplane::Orchestrator).

use crate::controller::dataplane::error::HandlerError;
use async_trait::async_trait;

/// Result of reading a resource back from the store
///
/// Not-found is `Absent`, a normal outcome. Failed reads are the `Err` arm of
/// the surrounding `Result`, so the two can never be confused.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedState<T> {
    Present(T),
    Absent,
}

impl<T> ObservedState<T> {
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, ObservedState::Present(_))
    }

    #[must_use]
    pub fn as_present(&self) -> Option<&T> {
        match self {
            ObservedState::Present(state) => Some(state),
            ObservedState::Absent => None,
        }
    }
}

impl<T> From<Option<T>> for ObservedState<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(state) => ObservedState::Present(state),
            None => ObservedState::Absent,
        }
    }
}

/// Converges one external resource kind for a context type `C`
///
/// Implementations hold only an injected store handle and must be safe to
/// share across concurrent reconciliations of different contexts.
#[async_trait]
pub trait ResourceHandler<C: Send + Sync>: Send + Sync {
    /// Observed form of the resource passed back into [`update`](Self::update)
    type State: Send + Sync;

    /// Stable identity used in logs, metrics and dependency declarations
    fn name(&self) -> &'static str;

    /// Handlers that must have succeeded earlier in the same pass
    fn hard_dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    /// `false` for kinds that are immutable once created
    fn supports_update(&self) -> bool {
        true
    }

    /// Whether the resource should exist under the current intent. No I/O.
    fn is_required(&self, ctx: &C) -> bool;

    async fn get_current_state(&self, ctx: &C)
        -> Result<ObservedState<Self::State>, HandlerError>;

    /// Submit the full desired resource. Only called after absence was observed.
    async fn create(&self, ctx: &C) -> Result<(), HandlerError>;

    /// Patch drift between desired and observed; returns whether anything changed
    async fn update(&self, ctx: &C, observed: &Self::State) -> Result<bool, HandlerError>;

    /// Remove the resource. Already-absent is success.
    async fn delete(&self, ctx: &C) -> Result<(), HandlerError>;
}
