//! External collaborator interfaces.
//!
//! Implementations of these traits live outside this crate: the broker is
//! a message transport, the transaction manager finalizes or rejects
//! downstream two-phase-commit participants. Only the contracts are
//! defined here.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// Publishes outbound requests on behalf of `RemoteStepExecution`.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Publishes `data` to `topic`. Delivery is assumed atomic-or-fails;
    /// the engine never retries a failed send itself.
    async fn send(
        &self,
        topic: &str,
        data: Value,
        saga: Uuid,
        user: Option<Uuid>,
        reply_topic: Option<&str>,
    ) -> Result<(), String>;
}

/// Finalizes or rejects the downstream resources a saga's remote steps
/// participated in.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Called once after a saga's forward run and commit succeed, with
    /// `count` set to the number of executed `RemoteStepExecution`s
    /// (conditional branches' inner remote steps are not recursed into).
    async fn commit(&self, count: usize, execution_uuid: Uuid) -> Result<(), String>;

    /// Called once after a saga's rollback completes (successfully or
    /// partially).
    async fn reject(&self, execution_uuid: Uuid) -> Result<(), String>;
}
