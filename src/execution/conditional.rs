//! [`crate::definition::Step::ConditionalStep`] runtime state machine.
//!
//! Branch predicates are evaluated synchronously, in declared order; the
//! first truthy one selects its saga. With no match, the `else_saga` runs
//! if present, otherwise the step is a no-op. Once a branch is selected an
//! inner [`SagaExecution`] drives it, reusing the outer execution's
//! `saga_id`/`user` so reply routing stays stable across the nesting.

use serde_json::{json, Value};

use crate::context::Context;
use crate::definition::{Branch, Saga};
use crate::error::{ContextError, RollbackStepError, StepError};
use crate::messages::Response;
use crate::status::StepStatus;

use super::saga::SagaExecution;
use super::{ExecCtx, ExecuteOutcome, SagaOutcome};

/// Runtime record for a branch-and-delegate step.
pub struct ConditionalStepExecution {
    branches: Vec<Branch>,
    else_saga: Option<Saga>,
    /// Current status, mirrored from the inner execution's outcome.
    pub status: StepStatus,
    /// `true` once the inner execution has been fully rolled back.
    pub already_rolled_back: bool,
    inner: Option<Box<SagaExecution>>,
}

impl ConditionalStepExecution {
    /// Builds a fresh (status `Created`) execution record.
    pub fn new(branches: Vec<Branch>, else_saga: Option<Saga>) -> Self {
        Self {
            branches,
            else_saga,
            status: StepStatus::Created,
            already_rolled_back: false,
            inner: None,
        }
    }

    fn select_branch(&self, ctx: &ExecCtx<'_>, context: &Context) -> Result<Option<Saga>, StepError> {
        for branch in &self.branches {
            let predicate = ctx
                .registry
                .predicate(&branch.predicate.callback_ref)
                .map_err(|source| StepError::Failed(crate::error::ExecutorError::Callback {
                    name: branch.predicate.callback_ref.clone(),
                    source,
                }))?;
            let matched = predicate
                .call(context, branch.predicate.parameters.as_ref())
                .map_err(|source| StepError::Failed(crate::error::ExecutorError::Callback {
                    name: branch.predicate.callback_ref.clone(),
                    source,
                }))?;
            if matched {
                return Ok(Some(branch.saga.clone()));
            }
        }
        Ok(self.else_saga.clone())
    }

    /// Advances the step, delegating to (and, on first call, selecting)
    /// the inner saga execution.
    pub async fn execute(
        &mut self,
        ctx: &ExecCtx<'_>,
        context: &Context,
        response: Option<&Response>,
    ) -> Result<ExecuteOutcome, StepError> {
        if self.inner.is_none() && self.status == StepStatus::Created {
            let Some(selected) = self.select_branch(ctx, context)? else {
                self.status = StepStatus::Finished;
                tracing::debug!(saga_id = %ctx.saga_id, "conditional step matched no branch, no-op");
                return Ok(ExecuteOutcome::Finished(context.clone()));
            };
            self.status = StepStatus::RunningOnExecute;
            self.inner = Some(Box::new(
                SagaExecution::new_with_context(ctx.saga_id, ctx.user, selected, context.clone())
                    .with_config(ctx.config.clone()),
            ));
        }

        let inner = self
            .inner
            .as_mut()
            .expect("inner execution selected above or on a prior call");

        match inner.execute(ctx.registry, ctx.broker, ctx.transaction_manager, response).await {
            Ok(SagaOutcome::Paused) => {
                self.status = StepStatus::PausedByOnExecute;
                Ok(ExecuteOutcome::Paused)
            }
            Ok(SagaOutcome::Finished(inner_context)) => {
                self.status = StepStatus::Finished;
                let mut merged = context.clone();
                merged.merge(inner_context);
                Ok(ExecuteOutcome::Finished(merged))
            }
            Ok(SagaOutcome::Errored(unchanged)) => Ok(ExecuteOutcome::Finished(unchanged)),
            Err(source) => {
                self.status = StepStatus::ErroredByOnExecute;
                Err(StepError::NestedSagaFailed(Box::new(source)))
            }
        }
    }

    /// Delegates to the inner execution's rollback.
    pub async fn rollback(&mut self, ctx: &ExecCtx<'_>, _context: &Context) -> Result<(), RollbackStepError> {
        if self.status == StepStatus::Created {
            return Err(RollbackStepError::NothingToRollback);
        }
        if self.already_rolled_back {
            return Err(RollbackStepError::AlreadyDone);
        }
        let Some(inner) = self.inner.as_mut() else {
            return Err(RollbackStepError::NothingToRollback);
        };
        inner
            .rollback(ctx.registry, ctx.broker, ctx.transaction_manager)
            .await
            .map_err(|e| RollbackStepError::NestedSagaRollbackFailed(Box::new(e)))?;
        self.already_rolled_back = true;
        Ok(())
    }

    /// Canonical raw form: `{"cls": "conditional", branches, else_saga?,
    /// status, already_rolled_back, inner?}`.
    pub fn raw(&self) -> Result<Value, ContextError> {
        let mut map = serde_json::Map::new();
        map.insert("cls".to_string(), json!("conditional"));
        let branches: Result<Vec<Value>, ContextError> = self.branches.iter().map(Branch::raw).collect();
        map.insert("branches".to_string(), Value::Array(branches?));
        if let Some(saga) = &self.else_saga {
            map.insert("else_saga".to_string(), saga.raw()?);
        }
        map.insert("status".to_string(), serde_json::to_value(self.status).unwrap());
        map.insert("already_rolled_back".to_string(), json!(self.already_rolled_back));
        if let Some(inner) = &self.inner {
            map.insert("inner".to_string(), inner.raw()?);
        }
        Ok(Value::Object(map))
    }

    /// Inverse of [`ConditionalStepExecution::raw`].
    pub fn from_raw(raw: &Value) -> Result<Self, ContextError> {
        let branches = raw
            .get("branches")
            .and_then(Value::as_array)
            .ok_or_else(|| ContextError::MalformedSnapshot("conditional step execution missing branches".into()))?
            .iter()
            .map(Branch::from_raw)
            .collect::<Result<Vec<_>, _>>()?;
        let else_saga = raw.get("else_saga").map(Saga::from_raw).transpose()?;
        let status: StepStatus = serde_json::from_value(
            raw.get("status")
                .cloned()
                .ok_or_else(|| ContextError::MalformedSnapshot("conditional step execution missing status".into()))?,
        )
        .map_err(|e| ContextError::MalformedSnapshot(e.to_string()))?;
        let already_rolled_back = raw
            .get("already_rolled_back")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let inner = raw
            .get("inner")
            .map(SagaExecution::from_raw)
            .transpose()?
            .map(Box::new);
        Ok(Self {
            branches,
            else_saga,
            status,
            already_rolled_back,
            inner,
        })
    }
}
