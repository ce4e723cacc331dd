//! # Runtime
//!
//! Process wiring around the reconciler: startup, the watch loop and the
//! error policy it applies.

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
