//! [`crate::definition::Step::RemoteStep`] runtime state machine.
//!
//! Grounded directly on the original implementation's `RemoteStepExecution`
//! (`executions/steps/remote.py`): `on_execute` publishes a request and is
//! fire-and-forget (its return value is discarded — only success/failure of
//! the publish matters); the step then suspends until a reply arrives.
//! Rollback's `on_failure` publish is equally fire-and-forget.

use serde_json::{json, Value};

use crate::context::Context;
use crate::error::{ContextError, RollbackStepError, StepError};
use crate::executor::{RequestExecutor, ResponseExecutor};
use crate::messages::{Response, ResponseStatus};
use crate::operation::Operation;
use crate::status::StepStatus;

use super::{ExecCtx, ExecuteOutcome};

/// Runtime record for a step that publishes a request to a remote service
/// and resumes when a reply is fed back in.
pub struct RemoteStepExecution {
    on_execute: Operation,
    on_success: Option<Operation>,
    on_error: Option<Operation>,
    on_failure: Option<Operation>,
    /// Current status.
    pub status: StepStatus,
    /// `true` once `on_failure` has successfully published.
    pub already_rolled_back: bool,
}

impl RemoteStepExecution {
    /// Builds a fresh (status `Created`) execution record.
    pub fn new(
        on_execute: Operation,
        on_success: Option<Operation>,
        on_error: Option<Operation>,
        on_failure: Option<Operation>,
    ) -> Self {
        Self {
            on_execute,
            on_success,
            on_error,
            on_failure,
            status: StepStatus::Created,
            already_rolled_back: false,
        }
    }

    /// Advances the step. Call once with `response = None` to publish the
    /// request and suspend; call again with the reply once it arrives.
    pub async fn execute(
        &mut self,
        ctx: &ExecCtx<'_>,
        context: &Context,
        response: Option<&Response>,
    ) -> Result<ExecuteOutcome, StepError> {
        if self.status == StepStatus::Created {
            self.status = StepStatus::RunningOnExecute;
            let executor = RequestExecutor::new(ctx.registry, ctx.broker.clone());
            match executor
                .exec(Some(&self.on_execute), context, ctx.saga_id, ctx.user, ctx.reply_topic)
                .await
            {
                Ok(()) => self.status = StepStatus::FinishedOnExecute,
                Err(source) => {
                    self.status = StepStatus::ErroredOnExecute;
                    tracing::warn!(saga_id = %ctx.saga_id, "remote step on_execute publish failed");
                    return Err(StepError::Failed(source));
                }
            }
        }

        let Some(response) = response else {
            self.status = StepStatus::PausedByOnExecute;
            tracing::debug!(saga_id = %ctx.saga_id, "remote step paused awaiting reply");
            return Ok(ExecuteOutcome::Paused);
        };

        let new_context = match response.status {
            ResponseStatus::SystemError => {
                self.status = StepStatus::ErroredByOnExecute;
                tracing::warn!(saga_id = %ctx.saga_id, "remote step reply reported a system error");
                let _ = self.rollback(ctx, context).await;
                return Err(StepError::CommandReplyFailed(response.payload.to_string()));
            }
            ResponseStatus::Success => {
                self.status = StepStatus::RunningOnSuccess;
                let executor = ResponseExecutor::new(ctx.registry);
                match executor.exec(self.on_success.as_ref(), context, response).await {
                    Ok(updated) => updated,
                    Err(source) => {
                        self.status = StepStatus::ErroredOnSuccess;
                        let _ = self.rollback(ctx, context).await;
                        return Err(StepError::Failed(source));
                    }
                }
            }
            ResponseStatus::Error => {
                self.status = StepStatus::RunningOnError;
                let executor = ResponseExecutor::new(ctx.registry);
                match executor.exec(self.on_error.as_ref(), context, response).await {
                    Ok(updated) => updated,
                    Err(source) => {
                        self.status = StepStatus::ErroredOnError;
                        let _ = self.rollback(ctx, context).await;
                        return Err(StepError::Failed(source));
                    }
                }
            }
        };

        self.status = StepStatus::Finished;
        tracing::debug!(saga_id = %ctx.saga_id, "remote step finished");
        Ok(ExecuteOutcome::Finished(new_context))
    }

    /// Publishes `on_failure` (if bound). The reply, if any, is not
    /// awaited — compensation is fire-and-forget, matching `on_execute`.
    pub async fn rollback(&mut self, ctx: &ExecCtx<'_>, context: &Context) -> Result<(), RollbackStepError> {
        if self.status == StepStatus::Created {
            return Err(RollbackStepError::NothingToRollback);
        }
        if self.already_rolled_back {
            return Err(RollbackStepError::AlreadyDone);
        }
        let executor = RequestExecutor::new(ctx.registry, ctx.broker.clone());
        executor
            .exec(self.on_failure.as_ref(), context, ctx.saga_id, ctx.user, ctx.reply_topic)
            .await
            .map_err(RollbackStepError::CompensationFailed)?;
        self.already_rolled_back = true;
        tracing::debug!(saga_id = %ctx.saga_id, "remote step rolled back");
        Ok(())
    }

    /// Canonical raw form: `{"cls": "remote", on_execute, on_success?, on_error?, on_failure?, status, already_rolled_back}`.
    pub fn raw(&self) -> Result<Value, ContextError> {
        let mut map = serde_json::Map::new();
        map.insert("cls".to_string(), json!("remote"));
        map.insert("on_execute".to_string(), self.on_execute.raw()?);
        if let Some(op) = &self.on_success {
            map.insert("on_success".to_string(), op.raw()?);
        }
        if let Some(op) = &self.on_error {
            map.insert("on_error".to_string(), op.raw()?);
        }
        if let Some(op) = &self.on_failure {
            map.insert("on_failure".to_string(), op.raw()?);
        }
        map.insert("status".to_string(), serde_json::to_value(self.status).unwrap());
        map.insert("already_rolled_back".to_string(), json!(self.already_rolled_back));
        Ok(Value::Object(map))
    }

    /// Inverse of [`RemoteStepExecution::raw`].
    pub fn from_raw(raw: &Value) -> Result<Self, ContextError> {
        let on_execute = Operation::from_raw(
            raw.get("on_execute")
                .ok_or_else(|| ContextError::MalformedSnapshot("remote step execution missing on_execute".into()))?,
        )?;
        let on_success = raw.get("on_success").map(Operation::from_raw).transpose()?;
        let on_error = raw.get("on_error").map(Operation::from_raw).transpose()?;
        let on_failure = raw.get("on_failure").map(Operation::from_raw).transpose()?;
        let status: StepStatus = serde_json::from_value(
            raw.get("status")
                .cloned()
                .ok_or_else(|| ContextError::MalformedSnapshot("remote step execution missing status".into()))?,
        )
        .map_err(|e| ContextError::MalformedSnapshot(e.to_string()))?;
        let already_rolled_back = raw
            .get("already_rolled_back")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(Self {
            on_execute,
            on_success,
            on_error,
            on_failure,
            status,
            already_rolled_back,
        })
    }
}
