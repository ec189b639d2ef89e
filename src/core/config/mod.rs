//! core::config
//!
//! Configuration schema and loading.
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$CANVASWORK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/canvaswork/config.toml`
//! 3. `~/.canvaswork/config.toml` (canonical write location)
//!
//! # Precedence
//!
//! Config values only fill in flags the user did not pass; CLI flags always
//! win. The first existing file is used; locations are not merged.

pub mod schema;

pub use schema::{GlobalConfig, UnpackDefaults};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

/// Load the global configuration from default locations.
///
/// Returns the default configuration when no config file exists.
///
/// # Errors
///
/// Returns an error only when a config file exists but cannot be read or
/// parsed; a missing file is not an error.
pub fn load() -> Result<GlobalConfig, ConfigError> {
    match global_config_path() {
        Some(path) if path.exists() => load_from(&path),
        _ => Ok(GlobalConfig::default()),
    }
}

/// Load configuration from a specific file.
pub fn load_from(path: &Path) -> Result<GlobalConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|err| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

/// Resolve the global config file location.
///
/// Returns the first candidate whose parent can be determined; the file
/// itself may not exist yet.
fn global_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CANVASWORK_CONFIG") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            let candidate = PathBuf::from(xdg).join("canvaswork").join("config.toml");
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    dirs::home_dir().map(|home| home.join(".canvaswork").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_reads_and_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[unpack]\nclobber = true\n").unwrap();
        let config = load_from(&path).unwrap();
        assert!(config.clobber_default());
    }

    #[test]
    fn load_from_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "not valid toml [").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn load_from_missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }
}
