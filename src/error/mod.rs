//! Error taxonomy for the saga engine.
//!
//! Errors are grouped by the phase that raises them: building a definition,
//! invoking a callback, advancing a step, advancing a saga, or rolling
//! back. Every fallible operation returns one of these specific types
//! rather than a single catch-all enum, so a caller matching on
//! `DefinitionError` never has to account for execution-phase variants
//! that can't occur at build time.
//!
//! The pause signal (`ExecuteOutcome::Paused` / `SagaOutcome::Paused`,
//! defined in [`crate::execution`]) is deliberately *not* part of this
//! taxonomy — per the engine's design, pausing is expected control flow,
//! not a failure.

pub mod types;

pub use types::{
    CallbackError, ContextError, DefinitionError, ExecutorError, RollbackExecutionError,
    RollbackStepError, SagaError, StepError,
};
