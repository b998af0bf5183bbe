//! Pool configuration
//!
//! [`PoolOptions`] can be built in code, deserialized from a TOML, YAML or
//! JSON file, and overridden from `ORDERLY_*` environment variables.

mod env_loader;
mod file_loader;
mod options;

pub use env_loader::{ENV_PREFIX, apply_env_overrides, apply_overrides_from};
pub use file_loader::load_from_file;
pub use options::{PanicPolicy, PoolOptions};

use crate::error::PoolResult;
use std::path::Path;

/// Load options from an optional file, then layer environment overrides on top
pub fn load(path: Option<&Path>) -> PoolResult<PoolOptions> {
    let options = match path {
        Some(path) => load_from_file(path)?,
        None => PoolOptions::default(),
    };
    apply_env_overrides(options)
}
