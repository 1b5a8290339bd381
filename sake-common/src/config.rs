//! Configuration loading and root folder resolution
//!
//! Resolution priority for every setting:
//! 1. Command-line argument / environment variable (handled by the binary)
//! 2. TOML config file
//! 3. OS-dependent compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Application directory name used under the platform config/data folders
pub const APP_DIR_NAME: &str = "sake-sync";

/// Default database file name inside the root folder
pub const DEFAULT_DATABASE_FILE: &str = "sake.db";

/// Default report directory name inside the root folder
pub const DEFAULT_REPORT_DIR: &str = "logs";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Contents of the optional TOML config file
///
/// Every field is optional so a partial file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database and report directory
    pub root_folder: Option<PathBuf>,

    /// Explicit database path (overrides `<root_folder>/sake.db`)
    pub database: Option<PathBuf>,

    /// Base URL of the catalog provider
    pub source_url: Option<String>,

    /// Per-request timeout for catalog fetches
    pub fetch_timeout_secs: Option<u64>,

    /// Directory receiving run reports
    pub report_dir: Option<PathBuf>,

    /// Age after which an abandoned run lock may be taken over
    pub lock_stale_after_secs: Option<u64>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default config file location (`~/.config/sake-sync/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// Load the TOML config file
///
/// A missing file is not an error: a warning is logged and defaults are returned.
/// A file that exists but cannot be parsed is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!("Config file not found at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Root folder resolution
///
/// Priority: explicit argument (CLI or ENV, already merged by clap) → TOML → compiled default.
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Some(path) = &toml.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./sake_sync_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_toml_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "source_url = \"http://localhost:9000/api\"\n").unwrap();

        let config = load_toml_config(&path).unwrap();
        assert_eq!(config.source_url.as_deref(), Some("http://localhost:9000/api"));
        assert!(config.fetch_timeout_secs.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "fetch_timeout_secs = \"soon\"").unwrap();

        let err = load_toml_config(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_root_folder_priority() {
        let toml = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };

        let cli = PathBuf::from("/from/cli");
        assert_eq!(resolve_root_folder(Some(&cli), &toml), cli);
        assert_eq!(resolve_root_folder(None, &toml), PathBuf::from("/from/toml"));
        assert_eq!(
            resolve_root_folder(None, &TomlConfig::default()),
            default_root_folder()
        );
    }
}
