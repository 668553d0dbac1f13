//! Typed callback registry.
//!
//! The host registers callbacks under stable string names; operations
//! reference callbacks by name and the engine resolves them at invocation
//! time, never at snapshot-decode time. This is a deliberate divergence
//! from the original Python engine (which resolves a fully-qualified
//! import path eagerly during `from_raw`): Rust's static typing makes
//! storing boxed trait objects behind a name strictly simpler than
//! threading live callables through `serde`.
//!
//! Four distinct callback shapes exist because each is invoked with a
//! different argument set and, in the predicate case, runs synchronously:
//!
//! - [`LocalCallback`] — `(context) -> context`, used by `LocalStep`.
//! - [`RequestCallback`] — `(context) -> Request`, used by `RemoteStep::on_execute`.
//! - [`ResponseCallback`] — `(context, response) -> context`, used by
//!   `RemoteStep::on_success` / `on_error`.
//! - [`PredicateCallback`] — `(context) -> bool`, used by `ConditionalStep`
//!   branch selection. Synchronous: branch selection never suspends.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::CallbackError;
use crate::messages::{Request, Response};

/// A callback invoked purely over the context (local steps, compensations).
#[async_trait]
pub trait LocalCallback: Send + Sync {
    /// Runs the callback, producing an updated context.
    async fn call(&self, context: &Context, parameters: Option<&Context>) -> Result<Context, CallbackError>;
}

/// A callback that turns the current context into an outbound [`Request`].
#[async_trait]
pub trait RequestCallback: Send + Sync {
    /// Builds the request to publish.
    async fn call(&self, context: &Context, parameters: Option<&Context>) -> Result<Request, CallbackError>;
}

/// A callback that folds a [`Response`] back into the context.
#[async_trait]
pub trait ResponseCallback: Send + Sync {
    /// Runs the callback, producing an updated context.
    async fn call(
        &self,
        context: &Context,
        response: &Response,
        parameters: Option<&Context>,
    ) -> Result<Context, CallbackError>;
}

/// A synchronous predicate deciding whether a conditional branch applies.
pub trait PredicateCallback: Send + Sync {
    /// Evaluates the predicate against the current context.
    fn call(&self, context: &Context, parameters: Option<&Context>) -> Result<bool, CallbackError>;
}

/// Host-provided mapping from stable names to callback implementations.
///
/// One map per callback shape, since a name registered as a
/// [`LocalCallback`] is never meaningfully invoked as a
/// [`ResponseCallback`] — keeping them separate catches a misconfigured
/// saga definition at resolution time instead of producing a confusing
/// downcast failure.
#[derive(Default)]
pub struct CallbackRegistry {
    local: HashMap<String, Box<dyn LocalCallback>>,
    request: HashMap<String, Box<dyn RequestCallback>>,
    response: HashMap<String, Box<dyn ResponseCallback>>,
    predicate: HashMap<String, Box<dyn PredicateCallback>>,
}

impl CallbackRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a local callback under `name`.
    pub fn register_local(&mut self, name: impl Into<String>, callback: impl LocalCallback + 'static) {
        self.local.insert(name.into(), Box::new(callback));
    }

    /// Registers a request-producing callback under `name`.
    pub fn register_request(&mut self, name: impl Into<String>, callback: impl RequestCallback + 'static) {
        self.request.insert(name.into(), Box::new(callback));
    }

    /// Registers a response-folding callback under `name`.
    pub fn register_response(&mut self, name: impl Into<String>, callback: impl ResponseCallback + 'static) {
        self.response.insert(name.into(), Box::new(callback));
    }

    /// Registers a branch predicate under `name`.
    pub fn register_predicate(&mut self, name: impl Into<String>, callback: impl PredicateCallback + 'static) {
        self.predicate.insert(name.into(), Box::new(callback));
    }

    /// Resolves a local callback by name.
    pub fn local(&self, name: &str) -> Result<&dyn LocalCallback, CallbackError> {
        self.local
            .get(name)
            .map(|b| b.as_ref())
            .ok_or_else(|| CallbackError::NotFound(name.to_string()))
    }

    /// Resolves a request callback by name.
    pub fn request(&self, name: &str) -> Result<&dyn RequestCallback, CallbackError> {
        self.request
            .get(name)
            .map(|b| b.as_ref())
            .ok_or_else(|| CallbackError::NotFound(name.to_string()))
    }

    /// Resolves a response callback by name.
    pub fn response(&self, name: &str) -> Result<&dyn ResponseCallback, CallbackError> {
        self.response
            .get(name)
            .map(|b| b.as_ref())
            .ok_or_else(|| CallbackError::NotFound(name.to_string()))
    }

    /// Resolves a predicate callback by name.
    pub fn predicate(&self, name: &str) -> Result<&dyn PredicateCallback, CallbackError> {
        self.predicate
            .get(name)
            .map(|b| b.as_ref())
            .ok_or_else(|| CallbackError::NotFound(name.to_string()))
    }
}
