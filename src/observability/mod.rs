//! # Observability
//!
//! Prometheus metrics for the controller and its convergence engine.

pub mod metrics;
