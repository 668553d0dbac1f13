//! Shared test fixtures for the scenario tests in this directory.
//!
//! Generic `Fn*` wrappers let each scenario register a plain closure as a
//! callback instead of hand-writing a one-off struct per test.

use std::sync::Arc;

use async_trait::async_trait;
use saga_engine::prelude::*;
use saga_engine::testing::{NoopTransactionManager, RecordingBroker};

pub struct FnLocal<F>(pub F);

#[async_trait]
impl<F> LocalCallback for FnLocal<F>
where
    F: Fn(&Context) -> Result<Context, String> + Send + Sync,
{
    async fn call(&self, context: &Context, _parameters: Option<&Context>) -> Result<Context, saga_engine::error::CallbackError> {
        (self.0)(context).map_err(saga_engine::error::CallbackError::Failed)
    }
}

pub struct FnRequest<F>(pub F);

#[async_trait]
impl<F> RequestCallback for FnRequest<F>
where
    F: Fn(&Context) -> Result<Request, String> + Send + Sync,
{
    async fn call(&self, context: &Context, _parameters: Option<&Context>) -> Result<Request, saga_engine::error::CallbackError> {
        (self.0)(context).map_err(saga_engine::error::CallbackError::Failed)
    }
}

pub struct FnResponse<F>(pub F);

#[async_trait]
impl<F> ResponseCallback for FnResponse<F>
where
    F: Fn(&Context, &Response) -> Result<Context, String> + Send + Sync,
{
    async fn call(
        &self,
        context: &Context,
        response: &Response,
        _parameters: Option<&Context>,
    ) -> Result<Context, saga_engine::error::CallbackError> {
        (self.0)(context, response).map_err(saga_engine::error::CallbackError::Failed)
    }
}

pub struct FnPredicate<F>(pub F);

impl<F> PredicateCallback for FnPredicate<F>
where
    F: Fn(&Context) -> bool + Send + Sync,
{
    fn call(&self, context: &Context, _parameters: Option<&Context>) -> Result<bool, saga_engine::error::CallbackError> {
        Ok((self.0)(context))
    }
}

/// The environment a scenario test drives a [`SagaExecution`] against:
/// a callback registry plus in-memory broker/transaction-manager
/// recorders.
pub struct Harness {
    pub registry: CallbackRegistry,
    pub broker: Arc<dyn Broker>,
    pub recording_broker: Arc<RecordingBroker>,
    pub transaction_manager: Arc<dyn TransactionManager>,
}

impl Harness {
    pub fn new() -> Self {
        let recording_broker = Arc::new(RecordingBroker::new());
        let broker: Arc<dyn Broker> = recording_broker.clone();
        Self {
            registry: CallbackRegistry::new(),
            broker,
            recording_broker,
            transaction_manager: Arc::new(NoopTransactionManager::new()),
        }
    }
}

/// Builds the two-step saga from spec §8 scenario S1/S2/S5/S6:
/// `send_create_order -> handle_order_success`,
/// `send_create_ticket -> handle_ticket_success`.
pub fn two_step_order_ticket_saga(ticket_success_fails: bool) -> Saga {
    let mut builder = Saga::builder()
        .remote_step(Operation::new("send_create_order"))
        .unwrap()
        .on_success(Operation::new("handle_order_success"))
        .unwrap()
        .on_failure(Operation::new("send_delete_order"))
        .unwrap()
        .remote_step(Operation::new("send_create_ticket"))
        .unwrap();
    builder = if ticket_success_fails {
        builder.on_success(Operation::new("handle_ticket_success_fails")).unwrap()
    } else {
        builder.on_success(Operation::new("handle_ticket_success")).unwrap()
    };
    builder.commit(None).unwrap()
}

pub fn register_order_ticket_callbacks(registry: &mut CallbackRegistry) {
    registry.register_request(
        "send_create_order",
        FnRequest(|_ctx: &Context| Ok(Request::new("orders", serde_json::json!({"action": "create"})))),
    );
    registry.register_response(
        "handle_order_success",
        FnResponse(|ctx: &Context, response: &Response| {
            let mut ctx = ctx.clone();
            ctx.set("order", response.payload.clone());
            Ok(ctx)
        }),
    );
    registry.register_request(
        "send_delete_order",
        FnRequest(|_ctx: &Context| Ok(Request::new("orders", serde_json::json!({"action": "delete"})))),
    );
    registry.register_request(
        "send_create_ticket",
        FnRequest(|_ctx: &Context| Ok(Request::new("tickets", serde_json::json!({"action": "create"})))),
    );
    registry.register_response(
        "handle_ticket_success",
        FnResponse(|ctx: &Context, response: &Response| {
            let mut ctx = ctx.clone();
            ctx.set("ticket", response.payload.clone());
            Ok(ctx)
        }),
    );
    registry.register_response(
        "handle_ticket_success_fails",
        FnResponse(|_ctx: &Context, _response: &Response| Err("ticket handler exploded".to_string())),
    );
    registry.register_request(
        "send_delete_ticket",
        FnRequest(|_ctx: &Context| Ok(Request::new("tickets", serde_json::json!({"action": "delete"})))),
    );
}
