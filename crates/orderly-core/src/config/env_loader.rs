//! Environment variable overrides

use super::options::{PanicPolicy, PoolOptions};
use crate::error::{PoolError, PoolResult};
use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Prefix shared by all option variables
pub const ENV_PREFIX: &str = "ORDERLY";

/// Apply `ORDERLY_*` variables from the process environment
pub fn apply_env_overrides(options: PoolOptions) -> PoolResult<PoolOptions> {
    apply_overrides_from(options, |key| env::var(key).ok())
}

/// Apply overrides using an arbitrary variable lookup
///
/// Recognised keys: `ORDERLY_WORKERS`, `ORDERLY_MAX_IN_FLIGHT`,
/// `ORDERLY_EARLY_STOP_AFTER` (0 disables), `ORDERLY_PANIC_POLICY`,
/// `ORDERLY_TASK_TIMEOUT` (humantime, e.g. `250ms`).
pub fn apply_overrides_from<F>(mut options: PoolOptions, lookup: F) -> PoolResult<PoolOptions>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name));

    if let Some(value) = var("WORKERS") {
        options.workers = parse_number("WORKERS", &value)?;
    }

    if let Some(value) = var("MAX_IN_FLIGHT") {
        options.max_in_flight = Some(parse_number("MAX_IN_FLIGHT", &value)?);
    }

    if let Some(value) = var("EARLY_STOP_AFTER") {
        let limit: usize = parse_number("EARLY_STOP_AFTER", &value)?;
        options.early_stop_after = NonZeroUsize::new(limit);
    }

    if let Some(value) = var("PANIC_POLICY") {
        options.panic_policy = PanicPolicy::from_str(&value)?;
    }

    if let Some(value) = var("TASK_TIMEOUT") {
        let timeout = humantime_serde::re::humantime::parse_duration(value.trim())
            .map_err(|e| invalid_var("TASK_TIMEOUT", &value, e))?;
        options.task_timeout = Some(timeout);
    }

    Ok(options)
}

fn parse_number<T>(name: &str, value: &str) -> PoolResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| invalid_var(name, value, e))
}

fn invalid_var(name: &str, value: &str, err: impl std::fmt::Display) -> PoolError {
    PoolError::config_with_context(
        format!("Invalid {}_{} value '{}': {}", ENV_PREFIX, name, value, err),
        "Loading pool options from environment",
    )
}
