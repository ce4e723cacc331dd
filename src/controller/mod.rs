//! # Controller
//!
//! - `dataplane`: generic resource convergence engine (handlers, orchestrator, store)
//! - `build`: Build-specific handlers (CI namespace, Argo workflow) and their context
//! - `reconciler`: Build reconciliation, owner resolution and status reporting
//! - `backoff`: Fibonacci backoff for retries
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod build;
pub mod dataplane;
pub mod reconciler;
pub mod server;
