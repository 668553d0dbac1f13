//! Ordered key/value state threaded through a saga execution.
//!
//! `Context` is the mutable payload every callback reads and writes. It
//! preserves insertion order (so two contexts built from the same sequence
//! of `set` calls compare structurally equal and serialize identically),
//! and never interprets the values it carries — they are opaque to the
//! engine.

use base64::Engine as _;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ContextError;

/// An ordered, string-keyed map of opaque values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    entries: IndexMap<String, Value>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Sets `key` to `value`, overwriting any prior value but keeping the
    /// key's original position if it already existed.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns `true` if `key` is present.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the context holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Merges `other` into `self`, with `other`'s values winning on key
    /// collision. Used by `ConditionalStepExecution` to fold an inner
    /// execution's final context back into the outer one.
    pub fn merge(&mut self, other: Context) {
        for (key, value) in other.entries {
            self.entries.insert(key, value);
        }
    }

    /// Canonical binary-string snapshot form: `bincode`-serialize the
    /// ordered entries, then base64-encode. Two equal contexts always
    /// produce the same string, since `IndexMap` iteration order is
    /// insertion order.
    pub fn raw(&self) -> Result<String, ContextError> {
        let ordered: Vec<(&String, &Value)> = self.entries.iter().collect();
        let bytes = bincode::serialize(&ordered).map_err(ContextError::Encode)?;
        Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    /// Inverse of [`Context::raw`].
    pub fn from_raw(raw: &str) -> Result<Self, ContextError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(raw)
            .map_err(ContextError::Decode)?;
        let ordered: Vec<(String, Value)> =
            bincode::deserialize(&bytes).map_err(ContextError::Encode)?;
        Ok(Self {
            entries: ordered.into_iter().collect(),
        })
    }
}

impl FromIterator<(String, Value)> for Context {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
