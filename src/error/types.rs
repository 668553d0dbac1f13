//! Concrete error enums for each phase of saga construction and execution.

use thiserror::Error;
use uuid::Uuid;

/// Failures encoding a binary [`crate::context::Context`] snapshot.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The context could not be serialized to its binary form.
    #[error("failed to encode context snapshot: {0}")]
    Encode(#[source] bincode::Error),

    /// A raw string did not decode as valid base64.
    #[error("failed to decode context snapshot: {0}")]
    Decode(#[source] base64::DecodeError),

    /// A snapshot's `"cls"` discriminator (or another required field) did
    /// not match any known variant.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),
}

/// Structural violations raised while building a [`crate::definition::Saga`].
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// A `step()` call was opened but never bound to `local_step`,
    /// `remote_step`, or `conditional_step` before the next step or commit.
    #[error("step {index} has no on_execute operation bound")]
    EmptyStep {
        /// Index of the offending step.
        index: usize,
    },

    /// `on_execute` is required on every step and was never supplied.
    #[error("step {index} is missing its required on_execute operation")]
    UndefinedOnExecute {
        /// Index of the offending step.
        index: usize,
    },

    /// An optional operation slot (`on_success`, `on_error`, `on_failure`)
    /// was set a second time.
    #[error("step {index} already has {slot} bound")]
    AlreadyBound {
        /// Index of the offending step.
        index: usize,
        /// Name of the slot that was already bound.
        slot: &'static str,
    },

    /// A saga was committed with zero steps.
    #[error("a saga must contain at least one step before commit")]
    EmptySaga,

    /// `execute()` was called on a saga whose `committed` flag is `false`.
    #[error("saga is not committed")]
    NotCommitted,
}

/// A user callback, or the broker it published through, failed.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The callback itself returned an error.
    #[error("callback {name:?} failed: {source}")]
    Callback {
        /// Name the callback was registered under.
        name: String,
        /// Underlying failure.
        #[source]
        source: CallbackError,
    },

    /// The broker rejected or failed to deliver a published request.
    #[error("broker send failed: {message}")]
    Broker {
        /// Details reported by the broker.
        message: String,
    },
}

/// A registered callback could not be resolved or raised while running.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// No callback is registered under the given name.
    #[error("no callback registered under name {0:?}")]
    NotFound(String),

    /// The callback ran but failed.
    #[error("callback raised an error: {0}")]
    Failed(String),
}

/// Failures raised while advancing a single step's state machine.
#[derive(Debug, Error)]
pub enum StepError {
    /// The step's `on_execute`/response-phase operation failed; rollback
    /// for this step has already run (or is a local no-op).
    #[error("step execution failed: {0}")]
    Failed(#[source] ExecutorError),

    /// A `SYSTEM_ERROR` response arrived for a remote step.
    #[error("remote command reply reported a system error: {0}")]
    CommandReplyFailed(String),

    /// A conditional step's nested saga execution failed.
    #[error("nested saga execution failed: {0}")]
    NestedSagaFailed(#[source] Box<SagaError>),
}

/// Failures raised while rolling back a single step.
#[derive(Debug, Error)]
pub enum RollbackStepError {
    /// `rollback()` was called before the step ever executed.
    #[error("nothing to rollback: step has not executed")]
    NothingToRollback,

    /// `rollback()` was called a second time on an already-compensated step.
    #[error("step has already been rolled back")]
    AlreadyDone,

    /// The compensation (`on_failure`) callback itself failed.
    #[error("compensation callback failed: {0}")]
    CompensationFailed(#[source] ExecutorError),

    /// A conditional step's nested saga rollback failed.
    #[error("nested saga rollback failed: {0}")]
    NestedSagaRollbackFailed(#[source] Box<RollbackExecutionError>),
}

/// Failures raised while advancing a [`crate::execution::SagaExecution`].
#[derive(Debug, Error)]
pub enum SagaError {
    /// `execute()` was called on a [`crate::definition::Saga`] whose
    /// `committed` flag is `false` (invariant I7).
    #[error("saga {saga_id} cannot be executed: definition is not committed")]
    NotCommitted {
        /// Identifier of the execution.
        saga_id: Uuid,
    },

    /// `execute()` was called on an execution that already reached
    /// `Finished`, or reached `Errored` with no response in hand.
    #[error("saga {saga_id} has already finished executing")]
    AlreadyExecuted {
        /// Identifier of the execution.
        saga_id: Uuid,
    },

    /// A step failed; the saga-level rollback has already been run.
    #[error("step {step_index} failed, saga {saga_id} rolled back: {source}")]
    StepFailed {
        /// Identifier of the execution.
        saga_id: Uuid,
        /// Index of the failing step within `definition.steps`.
        step_index: usize,
        /// Underlying step failure.
        #[source]
        source: StepError,
    },

    /// The saga's commit operation failed after every step succeeded.
    #[error("commit callback failed for saga {saga_id}: {source}")]
    CommitFailed {
        /// Identifier of the execution.
        saga_id: Uuid,
        /// Underlying failure.
        #[source]
        source: ExecutorError,
    },

    /// Rollback of the whole saga failed for one or more steps.
    #[error("saga {saga_id} rollback failed: {source}")]
    RollbackFailed {
        /// Identifier of the execution.
        saga_id: Uuid,
        /// Underlying rollback failure.
        #[source]
        source: RollbackExecutionError,
    },
}

/// Failures raised by [`crate::execution::SagaExecution::rollback`].
#[derive(Debug, Error)]
pub enum RollbackExecutionError {
    /// `rollback()` was called on an execution already fully rolled back.
    #[error("saga has already been rolled back")]
    AlreadyDone,

    /// One or more executed steps failed to compensate. Every executed
    /// step was still attempted exactly once, in reverse order.
    #[error("{failed_count} of {attempted_count} step rollbacks failed")]
    PartialFailure {
        /// Number of steps whose rollback was attempted.
        attempted_count: usize,
        /// Number of those attempts that failed.
        failed_count: usize,
    },
}
