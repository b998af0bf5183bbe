//! Options controlling a pool's parallelism, buffering and failure handling

use crate::error::{PoolError, PoolResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

/// What happens when a transform panics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanicPolicy {
    /// Tear the pipeline down and re-raise the panic in the task polling the
    /// output stream
    #[default]
    Propagate,
    /// Turn the panic into a `TaskError::Panicked` for that slot only
    Capture,
}

impl PanicPolicy {
    pub fn captures(&self) -> bool {
        matches!(self, Self::Capture)
    }
}

impl FromStr for PanicPolicy {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" | "fatal" => Ok(Self::Propagate),
            "capture" | "error" => Ok(Self::Capture),
            other => Err(PoolError::invalid_config(
                "panic_policy",
                format!("unknown policy '{}', expected 'propagate' or 'capture'", other),
            )),
        }
    }
}

impl fmt::Display for PanicPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Propagate => f.write_str("propagate"),
            Self::Capture => f.write_str("capture"),
        }
    }
}

/// Configuration for an ordered pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolOptions {
    /// Number of concurrent workers
    pub workers: usize,
    /// Capacity of the task and result queues. Defaults to `workers`.
    pub max_in_flight: Option<usize>,
    /// Stop once this many successful results have been emitted. Zero in a
    /// config file disables it.
    #[serde(deserialize_with = "zero_disables")]
    pub early_stop_after: Option<NonZeroUsize>,
    /// Panic handling mode
    pub panic_policy: PanicPolicy,
    /// Per-task deadline. Zero disables it.
    #[serde(with = "humantime_serde")]
    pub task_timeout: Option<Duration>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            max_in_flight: None,
            early_stop_after: None,
            panic_policy: PanicPolicy::Propagate,
            task_timeout: None,
        }
    }
}

fn zero_disables<'de, D>(deserializer: D) -> Result<Option<NonZeroUsize>, D::Error>
where
    D: Deserializer<'de>,
{
    let limit = Option::<usize>::deserialize(deserializer)?;
    Ok(limit.and_then(NonZeroUsize::new))
}

impl PoolOptions {
    /// Options with the given worker count and defaults elsewhere
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// Reject out-of-range values
    pub fn validate(&self) -> PoolResult<()> {
        if self.workers == 0 {
            return Err(PoolError::invalid_config("workers", "must be at least 1"));
        }

        if let Some(max_in_flight) = self.max_in_flight {
            if max_in_flight < self.workers {
                return Err(PoolError::invalid_config(
                    "max_in_flight",
                    format!(
                        "must be at least the worker count ({}), got {}",
                        self.workers, max_in_flight
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Clamp out-of-range values instead of rejecting them:
    /// `workers` of 0 becomes 1 and `max_in_flight` below `workers` is raised
    /// to `workers`.
    pub fn normalized(mut self) -> Self {
        if self.workers == 0 {
            self.workers = 1;
        }
        let max_in_flight = self.effective_max_in_flight().max(self.workers);
        self.max_in_flight = Some(max_in_flight);
        self.task_timeout = self.effective_task_timeout();
        self
    }

    /// Whether `normalized` would change anything
    pub fn needs_normalization(&self) -> bool {
        self.validate().is_err()
    }

    /// Queue capacity actually used
    pub fn effective_max_in_flight(&self) -> usize {
        self.max_in_flight.unwrap_or(self.workers).max(1)
    }

    /// Task deadline actually used
    pub fn effective_task_timeout(&self) -> Option<Duration> {
        self.task_timeout.filter(|timeout| !timeout.is_zero())
    }

    /// Success quota as a plain count
    pub fn early_stop_limit(&self) -> Option<usize> {
        self.early_stop_after.map(NonZeroUsize::get)
    }
}
