//! # Convergence Orchestrator
//!
//! Drives an explicitly ordered list of handlers for one context through a
//! single convergence pass.
//!
//! For every handler the pass evaluates requiredness, fetches observed state,
//! picks an action from [`decide`] and executes it:
//!
//! | required | observed | action |
//! |----------|----------|--------|
//! | true     | absent   | Create |
//! | true     | present  | Update |
//! | false    | present  | Delete |
//! | false    | absent   | Skip   |
//!
//! Handlers run strictly one after another in declared order, because later
//! handlers may need the side effects of earlier ones (a workflow needs its
//! namespace). A failing handler does not stop the pass; only handlers that
//! name it in [`ResourceHandler::hard_dependencies`] are marked blocked, and
//! inherit its error class. Dependencies must be registered before their
//! dependents; [`Orchestrator::with_handler`] rejects anything else.
//!
//! There is no retry loop here. Failures are classified and returned in the
//! [`AggregateResult`]; the caller decides whether to requeue.

use crate::controller::dataplane::error::{ErrorClass, HandlerError, OrchestratorError};
use crate::controller::dataplane::handler::{ObservedState, ResourceHandler};
use crate::observability::metrics;
use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

/// Action selected for one handler in one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConvergenceAction {
    Create,
    Update,
    Delete,
    Skip,
}

impl ConvergenceAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConvergenceAction::Create => "create",
            ConvergenceAction::Update => "update",
            ConvergenceAction::Delete => "delete",
            ConvergenceAction::Skip => "skip",
        }
    }
}

impl std::fmt::Display for ConvergenceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision table over requiredness and observed presence
#[must_use]
pub fn decide(required: bool, present: bool) -> ConvergenceAction {
    match (required, present) {
        (true, false) => ConvergenceAction::Create,
        (true, true) => ConvergenceAction::Update,
        (false, true) => ConvergenceAction::Delete,
        (false, false) => ConvergenceAction::Skip,
    }
}

/// Step of a handler's pass where a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fetch,
    Create,
    Update,
    Delete,
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Create => "create",
            Stage::Update => "update",
            Stage::Delete => "delete",
        }
    }
}

/// Terminal state of one handler after a pass
#[derive(Debug)]
pub enum HandlerStatus {
    /// The chosen action completed; `changed` is false for no-ops
    Done {
        action: ConvergenceAction,
        changed: bool,
    },
    Failed {
        stage: Stage,
        class: ErrorClass,
        error: HandlerError,
    },
    /// Not evaluated because a hard dependency did not succeed earlier in the pass
    ///
    /// `class` is the dependency's own class, so a blocked handler is retried
    /// or left waiting exactly like its cause.
    Blocked {
        dependency: &'static str,
        class: ErrorClass,
    },
}

impl HandlerStatus {
    fn failed(stage: Stage, error: HandlerError) -> Self {
        HandlerStatus::Failed {
            stage,
            class: error.class(),
            error,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, HandlerStatus::Done { .. })
    }

    /// Class of a failed or blocked handler
    #[must_use]
    pub fn error_class(&self) -> Option<ErrorClass> {
        match self {
            HandlerStatus::Done { .. } => None,
            HandlerStatus::Failed { class, .. } | HandlerStatus::Blocked { class, .. } => {
                Some(*class)
            }
        }
    }
}

#[derive(Debug)]
pub struct HandlerOutcome {
    pub handler: &'static str,
    pub status: HandlerStatus,
}

/// Per-handler outcomes of one pass, in execution order
#[derive(Debug, Default)]
pub struct AggregateResult {
    pub outcomes: Vec<HandlerOutcome>,
}

impl AggregateResult {
    /// True iff every handler's action succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_success())
    }

    /// Failed and blocked handlers
    pub fn failures(&self) -> impl Iterator<Item = &HandlerOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_success())
    }

    #[must_use]
    pub fn outcome(&self, handler: &str) -> Option<&HandlerOutcome> {
        self.outcomes.iter().find(|o| o.handler == handler)
    }

    #[must_use]
    pub fn has_transient_failure(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.status.error_class() == Some(ErrorClass::Transient))
    }

    #[must_use]
    pub fn has_permanent_failure(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.status.error_class() == Some(ErrorClass::Permanent))
    }

    /// Whether any handler changed backend state
    #[must_use]
    pub fn changed(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, HandlerStatus::Done { changed: true, .. }))
    }

    /// One line naming every failed or blocked handler, for logs and status messages
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_success() {
            return "all handlers converged".to_string();
        }
        self.failures()
            .map(|o| match &o.status {
                HandlerStatus::Failed {
                    stage,
                    class,
                    error,
                } => format!("{}: {} {} failure: {}", o.handler, class, stage.as_str(), error),
                HandlerStatus::Blocked { dependency, class } => {
                    format!("{}: {} blocked on {}", o.handler, class, dependency)
                }
                HandlerStatus::Done { .. } => String::new(),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Object-safe view of a [`ResourceHandler`] with its state type erased
#[async_trait]
trait Converge<C>: Send + Sync {
    fn name(&self) -> &'static str;

    fn hard_dependencies(&self) -> &'static [&'static str];

    async fn converge(&self, ctx: &C, step_timeout: Duration) -> HandlerStatus;
}

async fn bounded<T, F>(
    operation: &'static str,
    timeout: Duration,
    step: F,
) -> Result<T, HandlerError>
where
    F: Future<Output = Result<T, HandlerError>> + Send,
{
    match tokio::time::timeout(timeout, step).await {
        Ok(result) => result,
        Err(_elapsed) => Err(HandlerError::TimedOut { operation, timeout }),
    }
}

#[async_trait]
impl<C, H> Converge<C> for H
where
    C: Send + Sync + 'static,
    H: ResourceHandler<C>,
{
    fn name(&self) -> &'static str {
        ResourceHandler::name(self)
    }

    fn hard_dependencies(&self) -> &'static [&'static str] {
        ResourceHandler::hard_dependencies(self)
    }

    async fn converge(&self, ctx: &C, step_timeout: Duration) -> HandlerStatus {
        let name = ResourceHandler::name(self);
        let required = self.is_required(ctx);

        let observed = match bounded("fetch", step_timeout, self.get_current_state(ctx)).await {
            Ok(observed) => observed,
            Err(error) => return HandlerStatus::failed(Stage::Fetch, error),
        };

        let action = decide(required, observed.is_present());
        debug!(
            "{}: required={}, present={} -> {}",
            name,
            required,
            observed.is_present(),
            action
        );

        let result = match (action, observed) {
            (ConvergenceAction::Create, _) => {
                match bounded("create", step_timeout, self.create(ctx)).await {
                    Ok(()) => Ok(true),
                    // A previous pass may have landed the create without
                    // seeing it, or the read lagged behind the write.
                    Err(error) if error.is_already_exists() => {
                        debug!("{}: already exists, treating create as converged", name);
                        Ok(false)
                    }
                    Err(error) => Err((Stage::Create, error)),
                }
            }
            (ConvergenceAction::Update, ObservedState::Present(state)) => {
                if self.supports_update() {
                    bounded("update", step_timeout, self.update(ctx, &state))
                        .await
                        .map_err(|error| (Stage::Update, error))
                } else {
                    debug!(
                        "{}: immutable once created, observed state left unchanged",
                        name
                    );
                    Ok(false)
                }
            }
            (ConvergenceAction::Delete, _) => {
                match bounded("delete", step_timeout, self.delete(ctx)).await {
                    Ok(()) => Ok(true),
                    Err(error) if error.is_not_found() => Ok(false),
                    Err(error) => Err((Stage::Delete, error)),
                }
            }
            // `decide` never pairs Update with an absent observation.
            (ConvergenceAction::Skip, _) | (ConvergenceAction::Update, ObservedState::Absent) => {
                Ok(false)
            }
        };

        match result {
            Ok(changed) => HandlerStatus::Done { action, changed },
            Err((stage, error)) => HandlerStatus::failed(stage, error),
        }
    }
}

/// Ordered handler list for context type `C`
///
/// ```rust,ignore
/// let orchestrator = Orchestrator::new(Duration::from_secs(30))
///     .with_handler(NamespaceHandler::new(store.clone(), "choreo-ci"))?
///     .with_handler(WorkflowHandler::new(store, settings))?;
/// let result = orchestrator.reconcile(&ctx).await;
/// ```
pub struct Orchestrator<C> {
    handlers: Vec<Box<dyn Converge<C>>>,
    step_timeout: Duration,
}

impl<C> std::fmt::Debug for Orchestrator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field(
                "handlers",
                &self.handlers.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .field("step_timeout", &self.step_timeout)
            .finish()
    }
}

impl<C> Orchestrator<C>
where
    C: Send + Sync + 'static,
{
    /// `step_timeout` bounds every fetch and every action individually
    #[must_use]
    pub fn new(step_timeout: Duration) -> Self {
        Self {
            handlers: Vec::new(),
            step_timeout,
        }
    }

    /// Append a handler; handlers run in the order they are added
    ///
    /// Every hard dependency must name a handler added earlier.
    pub fn with_handler<H>(mut self, handler: H) -> Result<Self, OrchestratorError>
    where
        H: ResourceHandler<C> + 'static,
    {
        let name = <H as ResourceHandler<C>>::name(&handler);
        let registered = self.handler_names();
        if registered.contains(&name) {
            return Err(OrchestratorError::DuplicateHandler(name));
        }
        if let Some(dependency) = <H as ResourceHandler<C>>::hard_dependencies(&handler)
            .iter()
            .copied()
            .find(|dependency| !registered.contains(dependency))
        {
            return Err(OrchestratorError::UnknownDependency {
                handler: name,
                dependency,
            });
        }
        self.handlers.push(Box::new(handler));
        Ok(self)
    }

    #[must_use]
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Run one convergence pass over every handler
    pub async fn reconcile(&self, ctx: &C) -> AggregateResult {
        let mut outcomes: Vec<HandlerOutcome> = Vec::with_capacity(self.handlers.len());

        for handler in &self.handlers {
            let name = handler.name();

            // Dependencies are registered earlier, so each has an outcome already.
            let unmet = handler
                .hard_dependencies()
                .iter()
                .copied()
                .find_map(|dependency| {
                    outcomes
                        .iter()
                        .find(|o| o.handler == dependency)
                        .and_then(|o| o.status.error_class())
                        .map(|class| (dependency, class))
                });

            let status = if let Some((dependency, class)) = unmet {
                warn!("{}: blocked, dependency {} did not converge", name, dependency);
                HandlerStatus::Blocked { dependency, class }
            } else {
                let span = tracing::info_span!("dataplane.handler", handler = name);
                let start = Instant::now();
                let status = handler
                    .converge(ctx, self.step_timeout)
                    .instrument(span)
                    .await;
                metrics::observe_handler_duration(name, start.elapsed().as_secs_f64());
                status
            };

            match &status {
                HandlerStatus::Done { action, changed } => {
                    metrics::record_handler_action(name, action.as_str());
                    if *changed {
                        info!("{}: {} applied", name, action);
                    }
                }
                HandlerStatus::Failed {
                    stage,
                    class,
                    error,
                } => {
                    metrics::record_handler_failure(name, class.as_str());
                    warn!("{}: {} failed ({}): {}", name, stage.as_str(), class, error);
                }
                HandlerStatus::Blocked { .. } => {
                    metrics::record_handler_failure(name, "blocked");
                }
            }

            outcomes.push(HandlerOutcome {
                handler: name,
                status,
            });
        }

        AggregateResult { outcomes }
    }
}
