//! The saga definition: an ordered list of steps plus an optional commit
//! operation.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ContextError;
use crate::operation::Operation;

use super::step::Step;

/// An ordered collection of steps forming a distributed transaction, with
/// per-step compensations. Frozen (`committed = true`) by
/// [`super::builder::SagaBuilder::commit`]; a saga may only be executed
/// once committed (invariant I7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Saga {
    /// Steps in execution order.
    pub steps: Vec<Step>,
    /// Optional callback run once after every step succeeds.
    pub commit_operation: Option<Operation>,
    /// `true` once the definition is frozen and executable.
    pub committed: bool,
}

impl Saga {
    /// Starts building a new saga.
    pub fn builder() -> super::builder::SagaBuilder {
        super::builder::SagaBuilder::new()
    }

    /// Number of steps in the definition.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// `true` if the saga has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Canonical raw form: `{"steps": [..], "commit_operation"?, "committed": bool}`.
    pub fn raw(&self) -> Result<Value, ContextError> {
        let steps: Result<Vec<Value>, ContextError> = self.steps.iter().map(Step::raw).collect();
        let mut map = serde_json::Map::new();
        map.insert("steps".to_string(), Value::Array(steps?));
        if let Some(op) = &self.commit_operation {
            map.insert("commit_operation".to_string(), op.raw()?);
        }
        map.insert("committed".to_string(), json!(self.committed));
        Ok(Value::Object(map))
    }

    /// Inverse of [`Saga::raw`].
    pub fn from_raw(raw: &Value) -> Result<Self, ContextError> {
        let steps = raw
            .get("steps")
            .and_then(Value::as_array)
            .ok_or_else(|| ContextError::MalformedSnapshot("saga missing steps".into()))?
            .iter()
            .map(Step::from_raw)
            .collect::<Result<Vec<_>, _>>()?;
        let commit_operation = raw.get("commit_operation").map(Operation::from_raw).transpose()?;
        let committed = raw.get("committed").and_then(Value::as_bool).unwrap_or(false);
        Ok(Self {
            steps,
            commit_operation,
            committed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;

    #[test]
    fn round_trips_a_committed_two_step_saga() {
        let saga = Saga::builder()
            .remote_step(Operation::new("send_create_order"))
            .unwrap()
            .on_success(Operation::new("handle_order_success"))
            .unwrap()
            .local_step(Operation::new("archive_order"))
            .unwrap()
            .on_failure(Operation::new("unarchive_order"))
            .unwrap()
            .commit(Some(Operation::new("finalize")))
            .unwrap();

        let raw = saga.raw().unwrap();
        let restored = Saga::from_raw(&raw).unwrap();
        assert_eq!(saga, restored);
    }
}
