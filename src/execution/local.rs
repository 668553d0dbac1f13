//! [`crate::definition::Step::LocalStep`] runtime state machine.

use serde_json::{json, Value};

use crate::context::Context;
use crate::error::{ContextError, RollbackStepError, StepError};
use crate::executor::LocalExecutor;
use crate::operation::Operation;
use crate::status::StepStatus;

use super::{ExecCtx, ExecuteOutcome};

/// Runtime record for a step that runs entirely within this process.
/// Never pauses: `execute` always either finishes or fails outright.
pub struct LocalStepExecution {
    on_execute: Operation,
    on_failure: Option<Operation>,
    /// Current status.
    pub status: StepStatus,
    /// `true` once `on_failure` has successfully run.
    pub already_rolled_back: bool,
}

impl LocalStepExecution {
    /// Builds a fresh (status `Created`) execution record.
    pub fn new(on_execute: Operation, on_failure: Option<Operation>) -> Self {
        Self {
            on_execute,
            on_failure,
            status: StepStatus::Created,
            already_rolled_back: false,
        }
    }

    /// Runs `on_execute` against `context`.
    pub async fn execute(&mut self, ctx: &ExecCtx<'_>, context: &Context) -> Result<ExecuteOutcome, StepError> {
        self.status = StepStatus::RunningOnExecute;
        let executor = LocalExecutor::new(ctx.registry);
        match executor.exec(Some(&self.on_execute), context).await {
            Ok(new_context) => {
                self.status = StepStatus::Finished;
                tracing::debug!(saga_id = %ctx.saga_id, status = ?self.status, "local step finished");
                Ok(ExecuteOutcome::Finished(new_context))
            }
            Err(source) => {
                self.status = StepStatus::ErroredOnExecute;
                tracing::warn!(saga_id = %ctx.saga_id, "local step on_execute failed");
                Err(StepError::Failed(source))
            }
        }
    }

    /// Runs `on_failure` (if bound) against `context`.
    pub async fn rollback(&mut self, ctx: &ExecCtx<'_>, context: &Context) -> Result<(), RollbackStepError> {
        if self.status == StepStatus::Created {
            return Err(RollbackStepError::NothingToRollback);
        }
        if self.already_rolled_back {
            return Err(RollbackStepError::AlreadyDone);
        }
        let executor = LocalExecutor::new(ctx.registry);
        executor
            .exec(self.on_failure.as_ref(), context)
            .await
            .map_err(RollbackStepError::CompensationFailed)?;
        self.already_rolled_back = true;
        tracing::debug!(saga_id = %ctx.saga_id, "local step rolled back");
        Ok(())
    }

    /// Canonical raw form: `{"cls": "local", on_execute, on_failure?, status, already_rolled_back}`.
    pub fn raw(&self) -> Result<Value, ContextError> {
        let mut map = serde_json::Map::new();
        map.insert("cls".to_string(), json!("local"));
        map.insert("on_execute".to_string(), self.on_execute.raw()?);
        if let Some(on_failure) = &self.on_failure {
            map.insert("on_failure".to_string(), on_failure.raw()?);
        }
        map.insert("status".to_string(), serde_json::to_value(self.status).unwrap());
        map.insert("already_rolled_back".to_string(), json!(self.already_rolled_back));
        Ok(Value::Object(map))
    }

    /// Inverse of [`LocalStepExecution::raw`].
    pub fn from_raw(raw: &Value) -> Result<Self, ContextError> {
        let on_execute = Operation::from_raw(
            raw.get("on_execute")
                .ok_or_else(|| ContextError::MalformedSnapshot("local step execution missing on_execute".into()))?,
        )?;
        let on_failure = match raw.get("on_failure") {
            Some(v) => Some(Operation::from_raw(v)?),
            None => None,
        };
        let status: StepStatus = serde_json::from_value(
            raw.get("status")
                .cloned()
                .ok_or_else(|| ContextError::MalformedSnapshot("local step execution missing status".into()))?,
        )
        .map_err(|e| ContextError::MalformedSnapshot(e.to_string()))?;
        let already_rolled_back = raw
            .get("already_rolled_back")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(Self {
            on_execute,
            on_failure,
            status,
            already_rolled_back,
        })
    }
}
