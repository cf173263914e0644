//! Error-tolerant wrapper for extraction and lookup steps.
//!
//! A [`FaultTolerantStep`] declares which errors it knows how to absorb and
//! the value to substitute for them. Each call site picks a [`Recovery`]
//! policy explicitly; errors outside the declared class always propagate.

use std::future::Future;

/// What to do when a step fails with a declared error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Return the error unchanged.
    Propagate,
    /// Replace the error with the step's default value.
    Fallback,
}

impl From<bool> for Recovery {
    fn from(ignore: bool) -> Self {
        if ignore {
            Recovery::Fallback
        } else {
            Recovery::Propagate
        }
    }
}

/// A declared error class plus the default value used when it is absorbed.
pub struct FaultTolerantStep<T, E> {
    declared: fn(&E) -> bool,
    default: T,
}

impl<T: Clone, E> FaultTolerantStep<T, E> {
    pub fn new(declared: fn(&E) -> bool, default: T) -> Self {
        Self { declared, default }
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn declares(&self, err: &E) -> bool {
        (self.declared)(err)
    }

    /// Apply the policy to an already-computed result.
    pub fn recover(&self, result: Result<T, E>, recovery: impl Into<Recovery>) -> Result<T, E> {
        match result {
            Err(err) if recovery.into() == Recovery::Fallback && self.declares(&err) => {
                Ok(self.default.clone())
            }
            other => other,
        }
    }

    pub fn call<F>(&self, recovery: impl Into<Recovery>, step: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.recover(step(), recovery)
    }

    pub async fn run<F, Fut>(&self, recovery: impl Into<Recovery>, step: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let recovery = recovery.into();
        self.recover(step().await, recovery)
    }
}
