//! Fluent construction of a [`Saga`] with structural validation.
//!
//! `step()` opens a new step slot; either that slot or an implicit one
//! (flushing whatever was previously open) is then bound to a kind via
//! `local_step`/`remote_step`/`conditional_step`; kind-specific methods
//! (`on_success`, `on_error`, `on_failure`) fill in the optional slots;
//! `commit()` freezes the definition.

use crate::error::DefinitionError;
use crate::operation::Operation;

use super::saga::Saga;
use super::step::{Branch, Step};

enum Pending {
    /// `step()` was called but not yet bound to a kind.
    Unbound,
    Local {
        on_execute: Operation,
        on_failure: Option<Operation>,
    },
    Remote {
        on_execute: Operation,
        on_success: Option<Operation>,
        on_error: Option<Operation>,
        on_failure: Option<Operation>,
    },
}

/// Builder for [`Saga`]. See the module documentation for the flow.
#[derive(Default)]
pub struct SagaBuilder {
    steps: Vec<Step>,
    current: Option<Pending>,
}

impl SagaBuilder {
    /// Starts an empty builder.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            current: None,
        }
    }

    /// Opens a new step slot. The slot must be bound to a kind (via
    /// `local_step`/`remote_step`/`conditional_step`) before the saga is
    /// committed, or before another `step()`/binding call flushes it.
    pub fn step(mut self) -> Self {
        self.current = Some(Pending::Unbound);
        self
    }

    fn flush(&mut self) -> Result<(), DefinitionError> {
        let index = self.steps.len();
        match self.current.take() {
            None => Ok(()),
            Some(Pending::Unbound) => Err(DefinitionError::EmptyStep { index }),
            Some(Pending::Local { on_execute, on_failure }) => {
                self.steps.push(Step::LocalStep { on_execute, on_failure });
                Ok(())
            }
            Some(Pending::Remote {
                on_execute,
                on_success,
                on_error,
                on_failure,
            }) => {
                self.steps.push(Step::RemoteStep {
                    on_execute,
                    on_success,
                    on_error,
                    on_failure,
                });
                Ok(())
            }
        }
    }

    /// Binds the currently open slot (implicitly opening one if none is
    /// open) to a local step.
    pub fn local_step(mut self, on_execute: Operation) -> Result<Self, DefinitionError> {
        self.flush()?;
        self.current = Some(Pending::Local {
            on_execute,
            on_failure: None,
        });
        Ok(self)
    }

    /// Binds the currently open slot to a remote step.
    pub fn remote_step(mut self, on_execute: Operation) -> Result<Self, DefinitionError> {
        self.flush()?;
        self.current = Some(Pending::Remote {
            on_execute,
            on_success: None,
            on_error: None,
            on_failure: None,
        });
        Ok(self)
    }

    /// Binds the currently open slot to a conditional step. Each branch's
    /// saga (and the else-saga, if present) must already be committed.
    pub fn conditional_step(
        mut self,
        branches: Vec<Branch>,
        else_saga: Option<Saga>,
    ) -> Result<Self, DefinitionError> {
        self.flush()?;
        for branch in &branches {
            if !branch.saga.committed {
                return Err(DefinitionError::NotCommitted);
            }
        }
        if let Some(saga) = &else_saga {
            if !saga.committed {
                return Err(DefinitionError::NotCommitted);
            }
        }
        self.steps.push(Step::ConditionalStep { branches, else_saga });
        Ok(self)
    }

    /// Binds `on_success` on the currently open remote step.
    pub fn on_success(mut self, operation: Operation) -> Result<Self, DefinitionError> {
        let index = self.steps.len();
        match &mut self.current {
            Some(Pending::Remote { on_success, .. }) if on_success.is_none() => {
                *on_success = Some(operation);
                Ok(self)
            }
            Some(Pending::Remote { .. }) => Err(DefinitionError::AlreadyBound {
                index,
                slot: "on_success",
            }),
            _ => Err(DefinitionError::UndefinedOnExecute { index }),
        }
    }

    /// Binds `on_error` on the currently open remote step.
    pub fn on_error(mut self, operation: Operation) -> Result<Self, DefinitionError> {
        let index = self.steps.len();
        match &mut self.current {
            Some(Pending::Remote { on_error, .. }) if on_error.is_none() => {
                *on_error = Some(operation);
                Ok(self)
            }
            Some(Pending::Remote { .. }) => Err(DefinitionError::AlreadyBound {
                index,
                slot: "on_error",
            }),
            _ => Err(DefinitionError::UndefinedOnExecute { index }),
        }
    }

    /// Binds `on_failure` on the currently open local or remote step.
    pub fn on_failure(mut self, operation: Operation) -> Result<Self, DefinitionError> {
        let index = self.steps.len();
        match &mut self.current {
            Some(Pending::Local { on_failure, .. }) | Some(Pending::Remote { on_failure, .. })
                if on_failure.is_none() =>
            {
                *on_failure = Some(operation);
                Ok(self)
            }
            Some(Pending::Local { .. }) | Some(Pending::Remote { .. }) => {
                Err(DefinitionError::AlreadyBound { index, slot: "on_failure" })
            }
            _ => Err(DefinitionError::UndefinedOnExecute { index }),
        }
    }

    /// Freezes the definition: flushes any open step slot, validates that
    /// at least one step was defined, sets the commit operation, and marks
    /// `committed = true`.
    pub fn commit(mut self, commit_operation: Option<Operation>) -> Result<Saga, DefinitionError> {
        self.flush()?;
        if self.steps.is_empty() {
            return Err(DefinitionError::EmptySaga);
        }
        Ok(Saga {
            steps: self.steps,
            commit_operation,
            committed: true,
        })
    }
}
