//! Captured panic payloads

use std::any::Any;
use std::fmt;

/// A panic raised by a transform, captured and turned into a value.
///
/// Holds the original payload so callers can inspect it with
/// [`PanicError::payload`] or re-raise it with [`PanicError::resume`].
pub struct PanicError {
    message: String,
    payload: Box<dyn Any + Send + 'static>,
}

impl PanicError {
    /// Wrap a payload returned by `catch_unwind`
    pub fn new(payload: Box<dyn Any + Send + 'static>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        Self { message, payload }
    }

    /// The panic message, when the payload was a string
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The raw panic payload
    pub fn payload(&self) -> &(dyn Any + Send + 'static) {
        &*self.payload
    }

    /// Take back ownership of the raw payload
    pub fn into_payload(self) -> Box<dyn Any + Send + 'static> {
        self.payload
    }

    /// Re-raise the original panic on the current thread
    pub fn resume(self) -> ! {
        std::panic::resume_unwind(self.payload)
    }
}

impl fmt::Debug for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicError")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panic occurred: {}", self.message)
    }
}

impl std::error::Error for PanicError {}
