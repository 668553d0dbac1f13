//! Step variants.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ContextError;
use crate::operation::Operation;

use super::saga::Saga;

/// One unit of work within a [`Saga`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cls")]
pub enum Step {
    /// Runs entirely within this process; never suspends.
    LocalStep {
        /// Required forward operation.
        on_execute: Operation,
        /// Optional compensation, run on rollback.
        on_failure: Option<Operation>,
    },
    /// Publishes a request to a remote service and suspends until a reply
    /// arrives.
    RemoteStep {
        /// Required forward operation; must produce a [`crate::messages::Request`].
        on_execute: Operation,
        /// Runs when the reply status is `SUCCESS`.
        on_success: Option<Operation>,
        /// Runs when the reply status is `ERROR`.
        on_error: Option<Operation>,
        /// Compensation, run on rollback.
        on_failure: Option<Operation>,
    },
    /// Branches into one of several nested sagas based on a predicate.
    ConditionalStep {
        /// Branches tried in declared order; the first whose predicate is
        /// true is selected.
        branches: Vec<Branch>,
        /// Selected when no branch predicate matches.
        else_saga: Option<Saga>,
    },
}

/// One `predicate -> saga` arm of a [`Step::ConditionalStep`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// Synchronous predicate evaluated against the current context.
    pub predicate: Operation,
    /// Saga to run when `predicate` is true.
    pub saga: Saga,
}

impl Step {
    /// The step's required forward operation, used to validate structural
    /// invariants at build time; conditional steps have no single
    /// `on_execute` (they delegate to a branch's inner saga).
    pub fn on_execute(&self) -> Option<&Operation> {
        match self {
            Step::LocalStep { on_execute, .. } => Some(on_execute),
            Step::RemoteStep { on_execute, .. } => Some(on_execute),
            Step::ConditionalStep { .. } => None,
        }
    }

    /// Canonical raw form, tagged with `"cls"`. Operations nest their own
    /// `raw()` (the `{"callback": ..}` shape), so this never falls back to
    /// plain `serde_json` derive output for any entity that embeds a
    /// [`crate::context::Context`].
    pub fn raw(&self) -> Result<Value, ContextError> {
        let mut map = Map::new();
        match self {
            Step::LocalStep { on_execute, on_failure } => {
                map.insert("cls".to_string(), json!("LocalStep"));
                map.insert("on_execute".to_string(), on_execute.raw()?);
                if let Some(op) = on_failure {
                    map.insert("on_failure".to_string(), op.raw()?);
                }
            }
            Step::RemoteStep {
                on_execute,
                on_success,
                on_error,
                on_failure,
            } => {
                map.insert("cls".to_string(), json!("RemoteStep"));
                map.insert("on_execute".to_string(), on_execute.raw()?);
                if let Some(op) = on_success {
                    map.insert("on_success".to_string(), op.raw()?);
                }
                if let Some(op) = on_error {
                    map.insert("on_error".to_string(), op.raw()?);
                }
                if let Some(op) = on_failure {
                    map.insert("on_failure".to_string(), op.raw()?);
                }
            }
            Step::ConditionalStep { branches, else_saga } => {
                map.insert("cls".to_string(), json!("ConditionalStep"));
                let branches: Result<Vec<Value>, ContextError> = branches.iter().map(Branch::raw).collect();
                map.insert("branches".to_string(), Value::Array(branches?));
                if let Some(saga) = else_saga {
                    map.insert("else_saga".to_string(), saga.raw()?);
                }
            }
        }
        Ok(Value::Object(map))
    }

    /// Inverse of [`Step::raw`]; dispatches on the `"cls"` tag.
    pub fn from_raw(raw: &Value) -> Result<Self, ContextError> {
        let cls = raw.get("cls").and_then(Value::as_str).unwrap_or_default();
        Ok(match cls {
            "LocalStep" => Step::LocalStep {
                on_execute: Operation::from_raw(
                    raw.get("on_execute")
                        .ok_or_else(|| ContextError::MalformedSnapshot("LocalStep missing on_execute".into()))?,
                )?,
                on_failure: raw.get("on_failure").map(Operation::from_raw).transpose()?,
            },
            "RemoteStep" => Step::RemoteStep {
                on_execute: Operation::from_raw(
                    raw.get("on_execute")
                        .ok_or_else(|| ContextError::MalformedSnapshot("RemoteStep missing on_execute".into()))?,
                )?,
                on_success: raw.get("on_success").map(Operation::from_raw).transpose()?,
                on_error: raw.get("on_error").map(Operation::from_raw).transpose()?,
                on_failure: raw.get("on_failure").map(Operation::from_raw).transpose()?,
            },
            "ConditionalStep" => {
                let branches = raw
                    .get("branches")
                    .and_then(Value::as_array)
                    .ok_or_else(|| ContextError::MalformedSnapshot("ConditionalStep missing branches".into()))?
                    .iter()
                    .map(Branch::from_raw)
                    .collect::<Result<Vec<_>, _>>()?;
                let else_saga = raw.get("else_saga").map(Saga::from_raw).transpose()?;
                Step::ConditionalStep { branches, else_saga }
            }
            other => return Err(ContextError::MalformedSnapshot(format!("unknown step cls {other:?}"))),
        })
    }
}

impl Branch {
    /// Canonical raw form: `{"predicate": .., "saga": ..}`.
    pub fn raw(&self) -> Result<Value, ContextError> {
        Ok(json!({
            "predicate": self.predicate.raw()?,
            "saga": self.saga.raw()?,
        }))
    }

    /// Inverse of [`Branch::raw`].
    pub fn from_raw(raw: &Value) -> Result<Self, ContextError> {
        Ok(Self {
            predicate: Operation::from_raw(
                raw.get("predicate")
                    .ok_or_else(|| ContextError::MalformedSnapshot("branch missing predicate".into()))?,
            )?,
            saga: Saga::from_raw(
                raw.get("saga")
                    .ok_or_else(|| ContextError::MalformedSnapshot("branch missing saga".into()))?,
            )?,
        })
    }
}
