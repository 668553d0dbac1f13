//! Wire messages exchanged with remote services through the broker.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// An outbound request produced by a [`crate::executor::RequestExecutor`]
/// and published via [`crate::broker::Broker::send`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Topic/service the request is addressed to.
    pub target: String,
    /// Opaque request body.
    pub payload: Value,
}

impl Request {
    /// Builds a request for `target` carrying `payload`.
    pub fn new(target: impl Into<String>, payload: Value) -> Self {
        Self {
            target: target.into(),
            payload,
        }
    }
}

/// Outcome reported by a remote service for a previously sent [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    /// The remote operation completed successfully.
    Success,
    /// The remote operation failed in a way the saga can compensate for.
    Error,
    /// The remote side reported an unrecoverable/system-level failure.
    SystemError,
}

/// An inbound reply fed to [`crate::execution::SagaExecution::execute`] by
/// the host's reply-consumer loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Opaque reply body.
    pub payload: Value,
    /// Disposition of the remote operation.
    pub status: ResponseStatus,
    /// Identifier of the saga execution this reply belongs to.
    pub saga_id: Uuid,
}

impl Response {
    /// Builds a successful response.
    pub fn success(saga_id: Uuid, payload: Value) -> Self {
        Self {
            payload,
            status: ResponseStatus::Success,
            saga_id,
        }
    }

    /// Builds an error response.
    pub fn error(saga_id: Uuid, payload: Value) -> Self {
        Self {
            payload,
            status: ResponseStatus::Error,
            saga_id,
        }
    }

    /// Builds a system-error response.
    pub fn system_error(saga_id: Uuid, payload: Value) -> Self {
        Self {
            payload,
            status: ResponseStatus::SystemError,
            saga_id,
        }
    }
}
