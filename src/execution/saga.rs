//! Top-level saga execution coordinator (spec §4.4).
//!
//! `SagaExecution` owns the context, status, the stack of executed steps,
//! and the currently-paused step (if any), and drives a committed
//! [`Saga`] forward one step at a time. Grounded directly on the original
//! implementation's `SagaExecution` (`executions/saga.py`): `execute`
//! resumes the paused step first, then advances pending steps, then runs
//! the commit operation and transaction finalization; `rollback` walks
//! `executed_steps` in reverse, best-effort, never short-circuiting on an
//! individual step failure.

use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::broker::{Broker, TransactionManager};
use crate::callback::CallbackRegistry;
use crate::config::EngineConfig;
use crate::context::Context;
use crate::definition::Saga;
use crate::error::{ContextError, RollbackExecutionError, SagaError};
use crate::executor::LocalExecutor;
use crate::messages::Response;
use crate::status::SagaStatus;

use super::{ExecCtx, ExecuteOutcome, SagaOutcome, StepExecution};

/// Runtime coordinator for one saga instance.
pub struct SagaExecution {
    /// Identifier of this execution; reused as-is by any conditional
    /// branch's inner execution so reply routing never changes across
    /// nesting.
    pub uuid: Uuid,
    /// Optional user/tenant identifier forwarded to the broker.
    pub user: Option<Uuid>,
    /// The frozen saga definition this execution advances.
    pub definition: Saga,
    /// Current state threaded through every callback.
    pub context: Context,
    /// Top-level status (invariants I1-I4 in spec §3).
    pub status: SagaStatus,
    /// Steps that have fully completed, in execution order (a prefix of
    /// `definition.steps` — invariant I1).
    pub executed_steps: Vec<StepExecution>,
    /// The step currently suspended awaiting a reply, if any (invariant I2).
    pub paused_step: Option<StepExecution>,
    /// `true` once a full rollback pass has completed without any step
    /// failure (invariant I6 gates further execute/rollback calls).
    pub already_rolled_back: bool,
    /// Reply topic advertised to the broker for any `RemoteStep` this
    /// execution publishes. `None` falls back to the topic
    /// `self.config` derives from `uuid` (spec §10.3).
    pub reply_topic: Option<String>,
    /// Engine-level tunables (reply topic prefix, rollback logging). Not
    /// part of the persisted snapshot; a rehydrated execution picks up
    /// whatever config the host process supplies.
    pub config: EngineConfig,
}

impl SagaExecution {
    /// Starts a fresh execution of `definition` with a freshly generated
    /// identifier and an empty context.
    pub fn new(definition: Saga) -> Self {
        Self::with_uuid(Uuid::new_v4(), None, definition)
    }

    /// Starts a fresh execution with an explicit identifier and user.
    pub fn with_uuid(uuid: Uuid, user: Option<Uuid>, definition: Saga) -> Self {
        Self::new_with_context(uuid, user, definition, Context::new())
    }

    /// Starts a fresh execution seeded with `context` rather than an empty
    /// one. Used by [`super::ConditionalStepExecution`] to instantiate the
    /// inner execution for a selected branch, reusing the outer
    /// execution's `uuid`/`user`.
    pub fn new_with_context(uuid: Uuid, user: Option<Uuid>, definition: Saga, context: Context) -> Self {
        Self {
            uuid,
            user,
            definition,
            context,
            status: SagaStatus::Created,
            executed_steps: Vec::new(),
            paused_step: None,
            already_rolled_back: false,
            reply_topic: None,
            config: EngineConfig::default(),
        }
    }

    /// Overrides the reply topic advertised for this execution's remote
    /// steps, taking precedence over the one `config` would otherwise
    /// derive from `uuid`.
    pub fn with_reply_topic(mut self, reply_topic: impl Into<String>) -> Self {
        self.reply_topic = Some(reply_topic.into());
        self
    }

    /// Overrides the engine config this execution consults for reply-topic
    /// derivation and rollback logging.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Advances the execution. Call with `response = None` to start (or
    /// resume a forward-only saga); call with a reply once one arrives for
    /// the currently paused step.
    ///
    /// Ordering follows spec §4.4 exactly: non-committed and terminal
    /// states are rejected first (P5 — never mutates state on a rejected
    /// call), then the resume phase re-enters the paused step if any, then
    /// the forward phase advances every remaining step, then the commit
    /// phase runs the optional commit operation, then the transaction
    /// manager is notified of the executed remote-step count.
    pub async fn execute(
        &mut self,
        registry: &CallbackRegistry,
        broker: &Arc<dyn Broker>,
        transaction_manager: &Arc<dyn TransactionManager>,
        response: Option<&Response>,
    ) -> Result<SagaOutcome, SagaError> {
        if !self.definition.committed {
            return Err(SagaError::NotCommitted { saga_id: self.uuid });
        }
        if self.status == SagaStatus::Finished {
            return Err(SagaError::AlreadyExecuted { saga_id: self.uuid });
        }
        if self.status == SagaStatus::Errored {
            if response.is_none() {
                return Err(SagaError::AlreadyExecuted { saga_id: self.uuid });
            }
            tracing::info!(
                saga_id = %self.uuid,
                "received a reply for an already-errored saga; treating as a late compensation ack"
            );
            return Ok(SagaOutcome::Errored(self.context.clone()));
        }

        self.status = SagaStatus::Running;

        if let Some(paused) = self.paused_step.take() {
            match self
                .execute_one(registry, broker, transaction_manager, paused, response)
                .await?
            {
                ExecuteOutcome::Paused => return Ok(SagaOutcome::Paused),
                ExecuteOutcome::Finished(_) => {}
            }
        }

        while self.executed_steps.len() < self.definition.steps.len() {
            let step = &self.definition.steps[self.executed_steps.len()];
            let step_exec = StepExecution::new(step);
            match self
                .execute_one(registry, broker, transaction_manager, step_exec, None)
                .await?
            {
                ExecuteOutcome::Paused => return Ok(SagaOutcome::Paused),
                ExecuteOutcome::Finished(_) => {}
            }
        }

        let executor = LocalExecutor::new(registry);
        match executor.exec(self.definition.commit_operation.as_ref(), &self.context).await {
            Ok(new_context) => self.context = new_context,
            Err(source) => {
                self.status = SagaStatus::Errored;
                return match self.rollback(registry, broker, transaction_manager).await {
                    Ok(()) => Err(SagaError::CommitFailed { saga_id: self.uuid, source }),
                    Err(rollback_source) => Err(SagaError::RollbackFailed {
                        saga_id: self.uuid,
                        source: rollback_source,
                    }),
                };
            }
        }

        let remote_count = self.executed_steps.iter().filter(|step| step.is_remote()).count();
        if let Err(message) = transaction_manager.commit(remote_count, self.uuid).await {
            tracing::warn!(saga_id = %self.uuid, %message, "transaction manager commit reported a failure");
        }

        self.status = SagaStatus::Finished;
        tracing::debug!(saga_id = %self.uuid, "saga finished");
        Ok(SagaOutcome::Finished(self.context.clone()))
    }

    /// Advances a single step and folds its outcome into `self`: on
    /// success, the context is replaced and the step is appended to
    /// `executed_steps`; on pause, the step is stashed as `paused_step`;
    /// on failure, the whole saga is rolled back (best-effort) before the
    /// error propagates.
    async fn execute_one(
        &mut self,
        registry: &CallbackRegistry,
        broker: &Arc<dyn Broker>,
        transaction_manager: &Arc<dyn TransactionManager>,
        mut step_exec: StepExecution,
        response: Option<&Response>,
    ) -> Result<ExecuteOutcome, SagaError> {
        let reply_topic = self
            .reply_topic
            .clone()
            .unwrap_or_else(|| self.config.reply_topic(self.uuid));
        let ctx = ExecCtx {
            registry,
            broker,
            transaction_manager,
            saga_id: self.uuid,
            user: self.user,
            reply_topic: Some(reply_topic.as_str()),
            config: &self.config,
        };

        match step_exec.execute(&ctx, &self.context, response).await {
            Ok(ExecuteOutcome::Finished(new_context)) => {
                self.context = new_context.clone();
                self.executed_steps.push(step_exec);
                Ok(ExecuteOutcome::Finished(new_context))
            }
            Ok(ExecuteOutcome::Paused) => {
                self.paused_step = Some(step_exec);
                self.status = SagaStatus::Paused;
                Ok(ExecuteOutcome::Paused)
            }
            Err(source) => {
                let step_index = self.executed_steps.len();
                self.status = SagaStatus::Errored;
                match self.rollback(registry, broker, transaction_manager).await {
                    Ok(()) => Err(SagaError::StepFailed {
                        saga_id: self.uuid,
                        step_index,
                        source,
                    }),
                    Err(rollback_source) => Err(SagaError::RollbackFailed {
                        saga_id: self.uuid,
                        source: rollback_source,
                    }),
                }
            }
        }
    }

    /// Compensates every executed step, LIFO, best-effort: every step gets
    /// its `rollback` attempted exactly once regardless of earlier
    /// failures (P3), then the transaction manager is rejected once, and
    /// only a fully clean pass sets `already_rolled_back` (P4 then guards
    /// any further call).
    pub async fn rollback(
        &mut self,
        registry: &CallbackRegistry,
        broker: &Arc<dyn Broker>,
        transaction_manager: &Arc<dyn TransactionManager>,
    ) -> Result<(), RollbackExecutionError> {
        if self.already_rolled_back {
            return Err(RollbackExecutionError::AlreadyDone);
        }

        let reply_topic = self
            .reply_topic
            .clone()
            .unwrap_or_else(|| self.config.reply_topic(self.uuid));
        let ctx = ExecCtx {
            registry,
            broker,
            transaction_manager,
            saga_id: self.uuid,
            user: self.user,
            reply_topic: Some(reply_topic.as_str()),
            config: &self.config,
        };

        let mut attempted = 0usize;
        let mut failed = 0usize;
        for step_exec in self.executed_steps.iter_mut().rev() {
            attempted += 1;
            if let Err(source) = step_exec.rollback(&ctx, &self.context).await {
                if self.config.rollback_log_sample_on_failure {
                    let raw = step_exec.raw().ok();
                    tracing::warn!(
                        saga_id = %self.uuid,
                        error = %source,
                        raw = ?raw,
                        "step rollback failed, continuing compensation"
                    );
                } else {
                    tracing::warn!(saga_id = %self.uuid, error = %source, "step rollback failed, continuing compensation");
                }
                failed += 1;
            }
        }

        if let Err(message) = transaction_manager.reject(self.uuid).await {
            tracing::warn!(saga_id = %self.uuid, %message, "transaction manager reject reported a failure");
        }

        if failed > 0 {
            return Err(RollbackExecutionError::PartialFailure {
                attempted_count: attempted,
                failed_count: failed,
            });
        }

        self.already_rolled_back = true;
        tracing::debug!(saga_id = %self.uuid, "saga rolled back");
        Ok(())
    }

    /// Canonical raw snapshot: `definition`, `uuid`, `user?`, `status`,
    /// `executed_steps`, `paused_step?`, `context` (binary-string form),
    /// `already_rolled_back`, `reply_topic?`.
    pub fn raw(&self) -> Result<Value, ContextError> {
        let executed_steps: Result<Vec<Value>, ContextError> =
            self.executed_steps.iter().map(StepExecution::raw).collect();
        let mut map = serde_json::Map::new();
        map.insert("definition".to_string(), self.definition.raw()?);
        map.insert("uuid".to_string(), json!(self.uuid.to_string()));
        if let Some(user) = self.user {
            map.insert("user".to_string(), json!(user.to_string()));
        }
        map.insert("status".to_string(), serde_json::to_value(self.status).unwrap());
        map.insert("executed_steps".to_string(), Value::Array(executed_steps?));
        if let Some(paused) = &self.paused_step {
            map.insert("paused_step".to_string(), paused.raw()?);
        }
        map.insert("context".to_string(), json!(self.context.raw()?));
        map.insert("already_rolled_back".to_string(), json!(self.already_rolled_back));
        if let Some(reply_topic) = &self.reply_topic {
            map.insert("reply_topic".to_string(), json!(reply_topic));
        }
        Ok(Value::Object(map))
    }

    /// Inverse of [`SagaExecution::raw`]; rehydrates a paused execution so
    /// it can resume in a different process (spec §6 snapshot format,
    /// P6 — pause/resume fidelity).
    pub fn from_raw(raw: &Value) -> Result<Self, ContextError> {
        let definition = Saga::from_raw(
            raw.get("definition")
                .ok_or_else(|| ContextError::MalformedSnapshot("saga execution missing definition".into()))?,
        )?;
        let uuid_str = raw
            .get("uuid")
            .and_then(Value::as_str)
            .ok_or_else(|| ContextError::MalformedSnapshot("saga execution missing uuid".into()))?;
        let uuid = Uuid::parse_str(uuid_str).map_err(|e| ContextError::MalformedSnapshot(e.to_string()))?;
        let user = raw
            .get("user")
            .and_then(Value::as_str)
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| ContextError::MalformedSnapshot(e.to_string()))?;
        let status = serde_json::from_value(
            raw.get("status")
                .cloned()
                .ok_or_else(|| ContextError::MalformedSnapshot("saga execution missing status".into()))?,
        )
        .map_err(|e| ContextError::MalformedSnapshot(e.to_string()))?;
        let executed_steps = raw
            .get("executed_steps")
            .and_then(Value::as_array)
            .ok_or_else(|| ContextError::MalformedSnapshot("saga execution missing executed_steps".into()))?
            .iter()
            .map(StepExecution::from_raw)
            .collect::<Result<Vec<_>, _>>()?;
        let paused_step = raw.get("paused_step").map(StepExecution::from_raw).transpose()?;
        let context_raw = raw
            .get("context")
            .and_then(Value::as_str)
            .ok_or_else(|| ContextError::MalformedSnapshot("saga execution missing context".into()))?;
        let context = Context::from_raw(context_raw)?;
        let already_rolled_back = raw
            .get("already_rolled_back")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let reply_topic = raw
            .get("reply_topic")
            .and_then(Value::as_str)
            .map(|s| s.to_string());

        Ok(Self {
            uuid,
            user,
            definition,
            context,
            status,
            executed_steps,
            paused_step,
            already_rolled_back,
            reply_topic,
            config: EngineConfig::default(),
        })
    }
}
