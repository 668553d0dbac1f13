//! Stateless invokers sitting between a step's definition and the
//! registered callbacks.
//!
//! None of the three executors mutate their input context in place; each
//! returns a new one. They never call callbacks directly by value — a
//! [`crate::operation::Operation`] is resolved against a
//! [`crate::callback::CallbackRegistry`] first, then invoked with the
//! operation's bound parameters.

use std::sync::Arc;

use crate::broker::Broker;
use crate::callback::CallbackRegistry;
use crate::context::Context;
use crate::error::ExecutorError;
use crate::messages::Response;
use crate::operation::Operation;

/// Invokes a local (non-publishing) callback.
pub struct LocalExecutor<'a> {
    registry: &'a CallbackRegistry,
}

impl<'a> LocalExecutor<'a> {
    /// Creates an executor resolving callbacks against `registry`.
    pub fn new(registry: &'a CallbackRegistry) -> Self {
        Self { registry }
    }

    /// Runs `operation` against `context`. A `None` operation is a no-op
    /// that returns `context` unchanged — used for the optional commit
    /// operation and optional compensations.
    pub async fn exec(&self, operation: Option<&Operation>, context: &Context) -> Result<Context, ExecutorError> {
        let Some(operation) = operation else {
            return Ok(context.clone());
        };
        let callback = self
            .registry
            .local(&operation.callback_ref)
            .map_err(|source| ExecutorError::Callback {
                name: operation.callback_ref.clone(),
                source,
            })?;
        callback
            .call(context, operation.parameters.as_ref())
            .await
            .map_err(|source| ExecutorError::Callback {
                name: operation.callback_ref.clone(),
                source,
            })
    }
}

/// Invokes a callback that produces an outbound [`crate::messages::Request`]
/// and publishes it via the broker.
pub struct RequestExecutor<'a> {
    registry: &'a CallbackRegistry,
    broker: Arc<dyn Broker>,
}

impl<'a> RequestExecutor<'a> {
    /// Creates an executor resolving callbacks against `registry` and
    /// publishing through `broker`.
    pub fn new(registry: &'a CallbackRegistry, broker: Arc<dyn Broker>) -> Self {
        Self { registry, broker }
    }

    /// Runs `operation` against `context`, then publishes the resulting
    /// request. A `None` operation is a no-op (used for optional
    /// compensations that were never bound).
    pub async fn exec(
        &self,
        operation: Option<&Operation>,
        context: &Context,
        saga_id: uuid::Uuid,
        user: Option<uuid::Uuid>,
        reply_topic: Option<&str>,
    ) -> Result<(), ExecutorError> {
        let Some(operation) = operation else {
            return Ok(());
        };
        let callback = self
            .registry
            .request(&operation.callback_ref)
            .map_err(|source| ExecutorError::Callback {
                name: operation.callback_ref.clone(),
                source,
            })?;
        let request = callback
            .call(context, operation.parameters.as_ref())
            .await
            .map_err(|source| ExecutorError::Callback {
                name: operation.callback_ref.clone(),
                source,
            })?;
        self.broker
            .send(&request.target, request.payload, saga_id, user, reply_topic)
            .await
            .map_err(|message| ExecutorError::Broker { message })
    }
}

/// Invokes a callback that folds a [`Response`] into an updated context.
pub struct ResponseExecutor<'a> {
    registry: &'a CallbackRegistry,
}

impl<'a> ResponseExecutor<'a> {
    /// Creates an executor resolving callbacks against `registry`.
    pub fn new(registry: &'a CallbackRegistry) -> Self {
        Self { registry }
    }

    /// Runs `operation` against `context` and `response`. A `None`
    /// operation is a no-op that returns `context` unchanged.
    pub async fn exec(
        &self,
        operation: Option<&Operation>,
        context: &Context,
        response: &Response,
    ) -> Result<Context, ExecutorError> {
        let Some(operation) = operation else {
            return Ok(context.clone());
        };
        let callback = self
            .registry
            .response(&operation.callback_ref)
            .map_err(|source| ExecutorError::Callback {
                name: operation.callback_ref.clone(),
                source,
            })?;
        callback
            .call(context, response, operation.parameters.as_ref())
            .await
            .map_err(|source| ExecutorError::Callback {
                name: operation.callback_ref.clone(),
                source,
            })
    }
}
