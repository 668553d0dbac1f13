//! Test doubles for the external collaborators defined in [`crate::broker`].
//!
//! Only available under `#[cfg(test)]` or the `testing` feature, mirroring
//! how the teacher crate gates its own in-crate mock module.

pub mod mocks;

pub use mocks::{MockBroker, MockTransactionManager, NoopTransactionManager, RecordingBroker};
