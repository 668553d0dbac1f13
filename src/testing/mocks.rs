//! In-memory recorders and `mockall`-generated mocks for [`Broker`] and
//! [`TransactionManager`], used by the scenario tests in `tests/`.

use std::sync::Mutex;

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;
use uuid::Uuid;

use crate::broker::{Broker, TransactionManager};

/// One recorded [`Broker::send`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    /// Topic/service the request was addressed to.
    pub topic: String,
    /// Opaque request body.
    pub data: Value,
    /// Identifier of the saga execution that published it.
    pub saga: Uuid,
    /// Optional user/tenant identifier forwarded alongside.
    pub user: Option<Uuid>,
    /// Optional reply topic advertised to the remote side.
    pub reply_topic: Option<String>,
}

/// An in-memory [`Broker`] that records every send and always succeeds.
/// Used by scenario tests that assert call counts (S1, S2, S5) without
/// standing up a real transport.
#[derive(Default)]
pub struct RecordingBroker {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingBroker {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `send` calls recorded so far.
    pub fn call_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Snapshot of every message recorded so far, in call order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Clears the recorded history without affecting future calls'
    /// success. Useful for isolating a rollback's broker calls from the
    /// forward run that preceded it (as in S5).
    pub fn reset(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Broker for RecordingBroker {
    async fn send(
        &self,
        topic: &str,
        data: Value,
        saga: Uuid,
        user: Option<Uuid>,
        reply_topic: Option<&str>,
    ) -> Result<(), String> {
        self.sent.lock().unwrap().push(SentMessage {
            topic: topic.to_string(),
            data,
            saga,
            user,
            reply_topic: reply_topic.map(|s| s.to_string()),
        });
        Ok(())
    }
}

/// A [`TransactionManager`] that accepts every commit/reject and keeps no
/// state — the default collaborator for tests that don't care about
/// downstream two-phase commit.
#[derive(Default)]
pub struct NoopTransactionManager;

impl NoopTransactionManager {
    /// Creates a new no-op transaction manager.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransactionManager for NoopTransactionManager {
    async fn commit(&self, _count: usize, _execution_uuid: Uuid) -> Result<(), String> {
        Ok(())
    }

    async fn reject(&self, _execution_uuid: Uuid) -> Result<(), String> {
        Ok(())
    }
}

mock! {
    /// `mockall`-generated [`Broker`] for tests asserting on call
    /// arguments/ordering rather than just a count.
    pub Broker {}

    #[async_trait]
    impl Broker for Broker {
        async fn send(
            &self,
            topic: &str,
            data: Value,
            saga: Uuid,
            user: Option<Uuid>,
            reply_topic: Option<&str>,
        ) -> Result<(), String>;
    }
}

mock! {
    /// `mockall`-generated [`TransactionManager`] for tests asserting the
    /// exact commit/reject counts and arguments.
    pub TransactionManager {}

    #[async_trait]
    impl TransactionManager for TransactionManager {
        async fn commit(&self, count: usize, execution_uuid: Uuid) -> Result<(), String>;
        async fn reject(&self, execution_uuid: Uuid) -> Result<(), String>;
    }
}
