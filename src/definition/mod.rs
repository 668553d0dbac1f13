//! Saga definition layer: the immutable shape of a saga, built and
//! validated before any execution begins.

pub mod builder;
pub mod saga;
pub mod step;

pub use builder::SagaBuilder;
pub use saga::Saga;
pub use step::{Branch, Step};
