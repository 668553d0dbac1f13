//! Runtime state machines that advance a [`crate::definition::Saga`].
//!
//! The pause mechanism is modeled as a result variant rather than an
//! exception: [`ExecuteOutcome::Paused`] / [`SagaOutcome::Paused`] are
//! ordinary `Ok` values. Only genuine failures are `Err`; callers match on
//! the outcome instead of unwinding.

pub mod conditional;
pub mod local;
pub mod remote;
pub mod saga;

pub use conditional::ConditionalStepExecution;
pub use local::LocalStepExecution;
pub use remote::RemoteStepExecution;
pub use saga::SagaExecution;

use std::sync::Arc;

use uuid::Uuid;

use crate::broker::{Broker, TransactionManager};
use crate::callback::CallbackRegistry;
use crate::config::EngineConfig;
use crate::context::Context;
use crate::error::{RollbackStepError, StepError};
use crate::messages::Response;
use crate::status::StepStatus;

/// Outcome of advancing a single step.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOutcome {
    /// The step completed; carries the updated context.
    Finished(Context),
    /// The step suspended awaiting a remote reply.
    Paused,
}

/// Outcome of advancing a whole saga.
#[derive(Debug, Clone, PartialEq)]
pub enum SagaOutcome {
    /// The saga completed, including a successful commit.
    Finished(Context),
    /// The saga suspended awaiting a remote reply.
    Paused,
    /// The saga had already reached `Errored` and a (late) compensation
    /// reply arrived; this is not a failure, just a no-op acknowledgment.
    /// The context is returned unchanged.
    Errored(Context),
}

/// Collaborators every step-execution variant needs to advance.
pub struct ExecCtx<'a> {
    /// Resolves callbacks by name.
    pub registry: &'a CallbackRegistry,
    /// Publishes outbound requests for remote steps.
    pub broker: &'a Arc<dyn Broker>,
    /// Finalizes or rejects the downstream two-phase commit once a (nested
    /// or outer) saga execution reaches a terminal outcome. Local and
    /// remote step executions never touch this; only
    /// [`ConditionalStepExecution`] (to drive its inner
    /// [`SagaExecution`]) and `SagaExecution` itself use it.
    pub transaction_manager: &'a Arc<dyn TransactionManager>,
    /// Identifier of the owning saga execution; reused by nested
    /// executions so reply routing stays stable across conditional
    /// nesting.
    pub saga_id: Uuid,
    /// Optional user/tenant identifier forwarded to the broker.
    pub user: Option<Uuid>,
    /// Optional reply topic the broker should route responses back to.
    pub reply_topic: Option<&'a str>,
    /// Engine tunables in effect for this execution, propagated into any
    /// nested [`SagaExecution`] a [`ConditionalStepExecution`] spawns so
    /// reply-topic derivation and rollback logging stay consistent across
    /// nesting.
    pub config: &'a EngineConfig,
}

/// One step's runtime record: its kind-specific state machine plus the
/// shared bookkeeping (`status`, `already_rolled_back`) common to all of
/// them.
pub enum StepExecution {
    /// A [`crate::definition::Step::LocalStep`] in progress.
    Local(LocalStepExecution),
    /// A [`crate::definition::Step::RemoteStep`] in progress.
    Remote(RemoteStepExecution),
    /// A [`crate::definition::Step::ConditionalStep`] in progress. Boxed
    /// since it owns a nested [`SagaExecution`].
    Conditional(Box<ConditionalStepExecution>),
}

impl StepExecution {
    /// Builds a fresh (status `Created`) execution record for `step`.
    pub fn new(step: &crate::definition::Step) -> Self {
        match step.clone() {
            crate::definition::Step::LocalStep { on_execute, on_failure } => {
                StepExecution::Local(LocalStepExecution::new(on_execute, on_failure))
            }
            crate::definition::Step::RemoteStep {
                on_execute,
                on_success,
                on_error,
                on_failure,
            } => StepExecution::Remote(RemoteStepExecution::new(on_execute, on_success, on_error, on_failure)),
            crate::definition::Step::ConditionalStep { branches, else_saga } => {
                StepExecution::Conditional(Box::new(ConditionalStepExecution::new(branches, else_saga)))
            }
        }
    }

    /// Advances this step.
    pub async fn execute(
        &mut self,
        ctx: &ExecCtx<'_>,
        context: &Context,
        response: Option<&Response>,
    ) -> Result<ExecuteOutcome, StepError> {
        match self {
            StepExecution::Local(exec) => exec.execute(ctx, context).await,
            StepExecution::Remote(exec) => exec.execute(ctx, context, response).await,
            StepExecution::Conditional(exec) => exec.execute(ctx, context, response).await,
        }
    }

    /// Compensates this step.
    pub async fn rollback(&mut self, ctx: &ExecCtx<'_>, context: &Context) -> Result<(), RollbackStepError> {
        match self {
            StepExecution::Local(exec) => exec.rollback(ctx, context).await,
            StepExecution::Remote(exec) => exec.rollback(ctx, context).await,
            StepExecution::Conditional(exec) => exec.rollback(ctx, context).await,
        }
    }

    /// Current status.
    pub fn status(&self) -> StepStatus {
        match self {
            StepExecution::Local(exec) => exec.status,
            StepExecution::Remote(exec) => exec.status,
            StepExecution::Conditional(exec) => exec.status,
        }
    }

    /// `true` once this step's compensation has fully run.
    pub fn already_rolled_back(&self) -> bool {
        match self {
            StepExecution::Local(exec) => exec.already_rolled_back,
            StepExecution::Remote(exec) => exec.already_rolled_back,
            StepExecution::Conditional(exec) => exec.already_rolled_back,
        }
    }

    /// `true` if this step counts toward `TransactionManager::commit`'s
    /// remote-step count. Nested remote steps inside a conditional
    /// branch are not recursed into (spec's documented open question,
    /// resolved in favor of the literal behavior).
    pub fn is_remote(&self) -> bool {
        matches!(self, StepExecution::Remote(_))
    }

    /// Canonical raw form, tagged with `"cls"` so [`StepExecution::from_raw`]
    /// can reconstruct the right variant.
    pub fn raw(&self) -> Result<serde_json::Value, crate::error::ContextError> {
        match self {
            StepExecution::Local(exec) => exec.raw(),
            StepExecution::Remote(exec) => exec.raw(),
            StepExecution::Conditional(exec) => exec.raw(),
        }
    }

    /// Inverse of [`StepExecution::raw`]; dispatches on the `"cls"` tag.
    pub fn from_raw(raw: &serde_json::Value) -> Result<Self, crate::error::ContextError> {
        let cls = raw.get("cls").and_then(serde_json::Value::as_str).unwrap_or_default();
        Ok(match cls {
            "local" => StepExecution::Local(LocalStepExecution::from_raw(raw)?),
            "remote" => StepExecution::Remote(RemoteStepExecution::from_raw(raw)?),
            "conditional" => StepExecution::Conditional(Box::new(ConditionalStepExecution::from_raw(raw)?)),
            other => {
                return Err(crate::error::ContextError::MalformedSnapshot(format!(
                    "unknown step execution cls {other:?}"
                )))
            }
        })
    }
}
