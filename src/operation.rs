//! A reference to a user callback plus optional bound parameters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::Context;

/// `{ callback_ref, parameters? }` — resolved against a
/// [`crate::callback::CallbackRegistry`] at invocation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Stable symbolic name of the callback, resolvable via the registry.
    pub callback_ref: String,
    /// Additional bound parameters passed alongside the live context.
    pub parameters: Option<Context>,
}

impl Operation {
    /// Creates an operation with no bound parameters.
    pub fn new(callback_ref: impl Into<String>) -> Self {
        Self {
            callback_ref: callback_ref.into(),
            parameters: None,
        }
    }

    /// Creates an operation with bound parameters.
    pub fn with_parameters(callback_ref: impl Into<String>, parameters: Context) -> Self {
        Self {
            callback_ref: callback_ref.into(),
            parameters: Some(parameters),
        }
    }

    /// `true` if this operation carries bound parameters.
    pub fn parameterized(&self) -> bool {
        self.parameters.is_some()
    }

    /// Canonical raw form: `{"callback": "<name>"}`, with a `"parameters"`
    /// key added only when parameterized.
    pub fn raw(&self) -> Result<Value, crate::error::ContextError> {
        let mut map = Map::new();
        map.insert("callback".to_string(), Value::String(self.callback_ref.clone()));
        if let Some(params) = &self.parameters {
            map.insert("parameters".to_string(), Value::String(params.raw()?));
        }
        Ok(Value::Object(map))
    }

    /// Inverse of [`Operation::raw`].
    pub fn from_raw(raw: &Value) -> Result<Self, crate::error::ContextError> {
        let callback_ref = raw
            .get("callback")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let parameters = match raw.get("parameters").and_then(Value::as_str) {
            Some(s) => Some(Context::from_raw(s)?),
            None => None,
        };
        Ok(Self {
            callback_ref,
            parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_with_parameters() {
        let mut params = Context::new();
        params.set("amount", json!(5));
        let op = Operation::with_parameters("charge_card", params);

        let raw = op.raw().unwrap();
        let restored = Operation::from_raw(&raw).unwrap();
        assert_eq!(op, restored);
    }

    #[test]
    fn round_trips_without_parameters() {
        let op = Operation::new("send_create_order");
        let raw = op.raw().unwrap();
        assert!(raw.get("parameters").is_none());
        assert_eq!(Operation::from_raw(&raw).unwrap(), op);
    }
}
