//! Per-slot error type carried in the output stream

use std::time::Duration;
use thiserror::Error;

use super::panic::PanicError;

/// The value delivered for one input slot
pub type TaskResult<R, E> = Result<R, TaskError<E>>;

/// Why a slot did not produce a value
#[derive(Error, Debug)]
pub enum TaskError<E> {
    /// The transform returned an error
    #[error(transparent)]
    Failed(E),

    /// The transform panicked and the pool was configured to capture panics
    #[error(transparent)]
    Panicked(PanicError),

    /// The transform did not finish before its deadline
    #[error("Task execution timed out after {0:?}")]
    TimedOut(Duration),
}

impl<E> TaskError<E> {
    /// Whether this is a captured panic
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }

    /// Whether the task deadline expired
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }

    /// The transform's own error, if that is what this is
    pub fn as_failed(&self) -> Option<&E> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// The captured panic, if that is what this is
    pub fn as_panic(&self) -> Option<&PanicError> {
        match self {
            Self::Panicked(p) => Some(p),
            _ => None,
        }
    }

    /// Convert the transform error type, leaving the other variants intact
    pub fn map_failed<F>(self, f: impl FnOnce(E) -> F) -> TaskError<F> {
        match self {
            Self::Failed(e) => TaskError::Failed(f(e)),
            Self::Panicked(p) => TaskError::Panicked(p),
            Self::TimedOut(d) => TaskError::TimedOut(d),
        }
    }
}
