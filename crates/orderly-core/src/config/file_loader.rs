//! File-based option loading

use super::options::PoolOptions;
use crate::error::{PoolError, PoolResult};
use std::fmt;
use std::fs;
use std::path::Path;

/// Syntax of an options file, picked from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionsFormat {
    Toml,
    Yaml,
    Json,
}

impl OptionsFormat {
    /// `.toml` and `.yaml`/`.yml` are recognised; anything else is read as JSON
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Self::Toml,
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }

    fn parse(self, content: &str) -> Result<PoolOptions, String> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

impl fmt::Display for OptionsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toml => f.write_str("TOML"),
            Self::Yaml => f.write_str("YAML"),
            Self::Json => f.write_str("JSON"),
        }
    }
}

/// Load options from a TOML, YAML or JSON file.
///
/// A missing file is not an error: the defaults are returned.
pub fn load_from_file(path: &Path) -> PoolResult<PoolOptions> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Options file not found, using defaults");
        return Ok(PoolOptions::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        PoolError::config_with_context(
            format!("Failed to read options file: {}", e),
            format!("Reading pool options from '{}'", path.display()),
        )
    })?;

    let format = OptionsFormat::from_path(path);
    let options = format.parse(&content).map_err(|message| {
        PoolError::config_with_context(
            format!("Failed to parse {} options: {}", format, message),
            format!("Loading {} options from '{}'", format, path.display()),
        )
    })?;

    tracing::debug!(path = %path.display(), %format, "Loaded pool options");
    Ok(options)
}
