//! Wire-stable status discriminators.
//!
//! Both enums serialize via `kebab-case`, reproducing the exact strings
//! external consumers (and the original implementation this engine was
//! distilled from) expect on the wire.

use serde::{Deserialize, Serialize};

/// Status of a single step's execution state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    /// Built but not yet executed.
    Created,
    /// `on_execute` is in flight.
    RunningOnExecute,
    /// `on_execute` completed (local steps only — remote steps move
    /// straight to `PausedByOnExecute` once published).
    FinishedOnExecute,
    /// A `RemoteStep` has published its request and is awaiting a reply.
    PausedByOnExecute,
    /// `on_execute` itself failed.
    ErroredOnExecute,
    /// A reply with `SYSTEM_ERROR` status arrived.
    ErroredByOnExecute,
    /// `on_success` is in flight.
    RunningOnSuccess,
    /// `on_success` failed.
    ErroredOnSuccess,
    /// `on_error` is in flight.
    RunningOnError,
    /// `on_error` failed.
    ErroredOnError,
    /// The step completed successfully.
    Finished,
}

impl StepStatus {
    /// `true` if this status represents a suspended step awaiting a reply.
    pub fn is_paused(self) -> bool {
        matches!(self, StepStatus::PausedByOnExecute)
    }

    /// `true` if this status represents a terminal failure.
    pub fn is_errored(self) -> bool {
        matches!(
            self,
            StepStatus::ErroredOnExecute
                | StepStatus::ErroredByOnExecute
                | StepStatus::ErroredOnSuccess
                | StepStatus::ErroredOnError
        )
    }
}

/// Status of a saga's top-level execution state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SagaStatus {
    /// Built but `execute()` has never been called.
    Created,
    /// Currently advancing steps.
    Running,
    /// Suspended awaiting a remote reply.
    Paused,
    /// Completed successfully, including commit.
    Finished,
    /// Terminated by a step or commit failure; rollback has run (or has
    /// been attempted).
    Errored,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_status_wire_strings() {
        assert_eq!(
            serde_json::to_string(&StepStatus::PausedByOnExecute).unwrap(),
            "\"paused-by-on-execute\""
        );
        assert_eq!(
            serde_json::to_string(&StepStatus::ErroredByOnExecute).unwrap(),
            "\"errored-by-on-execute\""
        );
    }

    #[test]
    fn saga_status_wire_strings() {
        assert_eq!(serde_json::to_string(&SagaStatus::Paused).unwrap(), "\"paused\"");
        assert_eq!(serde_json::to_string(&SagaStatus::Errored).unwrap(), "\"errored\"");
    }
}
