//! # Step Phase
//!
//! Abstract three-state phase every handler's status translator reports.
//! Reads are point-in-time: a step reported `Succeeded` may be observed as
//! `Running` again if the backend restarts it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepPhase {
    Running,
    Failed,
    Succeeded,
}

impl StepPhase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StepPhase::Running => "Running",
            StepPhase::Failed => "Failed",
            StepPhase::Succeeded => "Succeeded",
        }
    }
}

impl std::fmt::Display for StepPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
