//! # Saga Engine
//!
//! A durable, resumable saga orchestration engine: the execution core for
//! long-running business workflows that span multiple remote services
//! communicating through asynchronous message passing.
//!
//! This crate is deliberately narrow. It owns:
//!
//! - [`context`] — the ordered key/value state threaded through a saga.
//! - [`operation`] — a reference to a user callback plus bound parameters.
//! - [`definition`] — the `Saga`/`Step` definition model and its builder.
//! - [`executor`] — the three stateless callback invokers.
//! - [`execution`] — the per-step and per-saga runtime state machines,
//!   including the pause/resume protocol and the compensation algorithm.
//!
//! It never owns: the message broker/transport, the reply-consumer loop,
//! snapshot persistence, downstream transaction commit/abort, or process
//! bootstrap (CLI, config loading, logging setup) — those are external
//! collaborators whose interface contracts live in [`broker`].
//!
//! ## Example
//!
//! ```no_run
//! use saga_engine::callback::CallbackRegistry;
//! use saga_engine::definition::Saga;
//! use saga_engine::operation::Operation;
//!
//! let saga = Saga::builder()
//!     .local_step(Operation::new("reserve_inventory"))
//!     .unwrap()
//!     .commit(None)
//!     .unwrap();
//!
//! let registry = CallbackRegistry::new();
//! let _ = (saga, registry);
//! ```

pub mod broker;
pub mod callback;
pub mod config;
pub mod context;
pub mod definition;
pub mod error;
pub mod execution;
pub mod executor;
pub mod messages;
pub mod operation;
pub mod status;

#[cfg(feature = "testing")]
pub mod testing;

pub use broker::{Broker, TransactionManager};
pub use callback::CallbackRegistry;
pub use config::EngineConfig;
pub use context::Context;
pub use definition::{Saga, SagaBuilder, Step};
pub use error::{DefinitionError, RollbackExecutionError, SagaError, StepError};
pub use execution::{ExecuteOutcome, SagaExecution, SagaOutcome, StepExecution};
pub use messages::{Request, Response, ResponseStatus};
pub use operation::Operation;
pub use status::{SagaStatus, StepStatus};

/// Current version of the saga engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports for defining and running sagas.
pub mod prelude {
    pub use crate::broker::{Broker, TransactionManager};
    pub use crate::callback::{CallbackRegistry, LocalCallback, PredicateCallback, RequestCallback, ResponseCallback};
    pub use crate::config::EngineConfig;
    pub use crate::context::Context;
    pub use crate::definition::{Branch, Saga, SagaBuilder, Step};
    pub use crate::error::{DefinitionError, RollbackExecutionError, SagaError, StepError};
    pub use crate::execution::{ExecuteOutcome, SagaExecution, SagaOutcome};
    pub use crate::messages::{Request, Response, ResponseStatus};
    pub use crate::operation::Operation;
    pub use crate::status::{SagaStatus, StepStatus};
    pub use async_trait::async_trait;
    pub use serde_json::{json, Value};
    pub use uuid::Uuid;
}
