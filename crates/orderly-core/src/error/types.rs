//! Pool-level error type

use thiserror::Error;

/// Result type alias for pool construction and configuration
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors raised while configuring or building an [`OrderedPool`].
///
/// Per-item failures never show up here; they travel in the output stream
/// as [`TaskError`](super::TaskError) values.
///
/// [`OrderedPool`]: crate::pool::OrderedPool
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// A configuration value is out of range
    #[error("Invalid configuration: {field}: {message}")]
    InvalidConfig { field: String, message: String },

    /// A configuration source could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },
}

impl PoolError {
    /// Create an invalid-value error for a named option
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a configuration loading error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration loading error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Additional context about where the error happened
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Config { context, .. } => context.as_deref(),
            Self::InvalidConfig { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = PoolError::invalid_config("workers", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: workers: must be at least 1"
        );
        assert!(err.context().is_none());
    }

    #[test]
    fn test_config_with_context() {
        let err = PoolError::config_with_context("bad toml", "Reading 'pool.toml'");
        assert_eq!(err.to_string(), "Configuration error: bad toml");
        assert_eq!(err.context(), Some("Reading 'pool.toml'"));
    }
}
