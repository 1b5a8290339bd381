//! Configuration resolution for sake-sync
//!
//! Every setting resolves with the priority:
//! command line / environment variable → TOML config → compiled default.
//! clap merges the first tier, so `Args` already holds CLI-or-ENV values.

use clap::builder::BoolishValueParser;
use clap::Parser;
use sake_common::config::{
    default_config_path, load_toml_config, resolve_root_folder, TomlConfig,
    DEFAULT_DATABASE_FILE, DEFAULT_REPORT_DIR,
};
use sake_common::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::services::catalog_client::{DEFAULT_FETCH_TIMEOUT, DEFAULT_SOURCE_URL};
use crate::services::sync_orchestrator::DEFAULT_LOCK_STALE_AFTER_SECS;

/// Upper bound on the lock stale age (one year)
pub const MAX_LOCK_STALE_AFTER_SECS: u64 = 365 * 24 * 3600;

/// Command-line arguments for sake-sync
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sake-sync")]
#[command(about = "Synchronize the sake catalog into the versioned master dataset")]
#[command(version)]
pub struct Args {
    /// Root folder holding the database and reports
    #[arg(short, long, env = "SAKE_SYNC_ROOT_FOLDER")]
    pub root_folder: Option<PathBuf>,

    /// Database file (defaults to <root_folder>/sake.db)
    #[arg(long, env = "SAKE_SYNC_DATABASE")]
    pub database: Option<PathBuf>,

    /// Compute and print the change set without writing anything
    #[arg(long, env = "SAKE_SYNC_DRY_RUN", value_parser = BoolishValueParser::new())]
    pub dry_run: bool,

    /// Base URL of the catalog provider
    #[arg(long, env = "SAKE_SYNC_SOURCE_URL")]
    pub source_url: Option<String>,

    /// Per-request fetch timeout in seconds
    #[arg(long, env = "SAKE_SYNC_FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: Option<u64>,

    /// Directory receiving run reports (defaults to <root_folder>/logs)
    #[arg(long, env = "SAKE_SYNC_REPORT_DIR")]
    pub report_dir: Option<PathBuf>,

    /// Age in seconds after which an abandoned run lock is taken over
    #[arg(long, env = "SAKE_SYNC_LOCK_STALE_SECS")]
    pub lock_stale_after_secs: Option<u64>,

    /// TOML config file
    #[arg(short, long, env = "SAKE_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "SAKE_SYNC_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Fully resolved run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub report_dir: PathBuf,
    pub dry_run: bool,
    pub source_url: String,
    pub fetch_timeout: Duration,
    pub lock_stale_after: chrono::Duration,
    pub log_level: String,
}

impl SyncConfig {
    /// Load the TOML file named by `args` (or the default location) and resolve
    pub fn load(args: &Args) -> Result<Self> {
        let toml = match args.config.clone().or_else(default_config_path) {
            Some(path) => load_toml_config(&path)?,
            None => TomlConfig::default(),
        };
        Self::resolve(args, &toml)
    }

    /// Merge arguments over TOML values over defaults
    pub fn resolve(args: &Args, toml: &TomlConfig) -> Result<Self> {
        let root_folder = resolve_root_folder(args.root_folder.as_deref(), toml);

        let database_path = args
            .database
            .clone()
            .or_else(|| toml.database.clone())
            .unwrap_or_else(|| root_folder.join(DEFAULT_DATABASE_FILE));

        let report_dir = args
            .report_dir
            .clone()
            .or_else(|| toml.report_dir.clone())
            .unwrap_or_else(|| root_folder.join(DEFAULT_REPORT_DIR));

        let source_url = args
            .source_url
            .clone()
            .or_else(|| toml.source_url.clone())
            .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
        if !(source_url.starts_with("http://") || source_url.starts_with("https://")) {
            return Err(Error::Config(format!("Source URL must be http(s): {}", source_url)));
        }

        let fetch_timeout = match args.fetch_timeout_secs.or(toml.fetch_timeout_secs) {
            Some(0) => {
                return Err(Error::Config(
                    "Fetch timeout must be at least one second".to_string(),
                ))
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_FETCH_TIMEOUT,
        };

        let lock_stale_secs = args
            .lock_stale_after_secs
            .or(toml.lock_stale_after_secs)
            .unwrap_or(DEFAULT_LOCK_STALE_AFTER_SECS);
        if lock_stale_secs == 0 || lock_stale_secs > MAX_LOCK_STALE_AFTER_SECS {
            return Err(Error::Config(format!(
                "Lock stale age must be between 1 and {} seconds: {}",
                MAX_LOCK_STALE_AFTER_SECS, lock_stale_secs
            )));
        }
        let lock_stale_after = i64::try_from(lock_stale_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                Error::Config(format!("Lock stale age out of range: {}", lock_stale_secs))
            })?;

        let log_level = args
            .log_level
            .clone()
            .unwrap_or_else(|| toml.logging.level.clone());

        Ok(Self {
            root_folder,
            database_path,
            report_dir,
            dry_run: args.dry_run,
            source_url,
            fetch_timeout,
            lock_stale_after,
            log_level,
        })
    }

    pub fn log_summary(&self) {
        info!("Root folder: {}", self.root_folder.display());
        info!("Database: {}", self.database_path.display());
        info!("Reports: {}", self.report_dir.display());
        info!(
            source_url = %self.source_url,
            fetch_timeout_secs = self.fetch_timeout.as_secs(),
            dry_run = self.dry_run,
            "Sync configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            root_folder: Some(PathBuf::from("/tmp/sake-root")),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_derive_from_root_folder() {
        let config = SyncConfig::resolve(&args(), &TomlConfig::default()).unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/sake-root/sake.db"));
        assert_eq!(config.report_dir, PathBuf::from("/tmp/sake-root/logs"));
        assert_eq!(config.source_url, DEFAULT_SOURCE_URL);
        assert_eq!(config.fetch_timeout, DEFAULT_FETCH_TIMEOUT);
        assert_eq!(config.log_level, "info");
        assert!(!config.dry_run);
    }

    #[test]
    fn test_arguments_override_toml() {
        let toml = TomlConfig {
            source_url: Some("http://toml.example/api".to_string()),
            fetch_timeout_secs: Some(5),
            ..Default::default()
        };
        let args = Args {
            source_url: Some("http://cli.example/api".to_string()),
            ..args()
        };

        let config = SyncConfig::resolve(&args, &toml).unwrap();
        assert_eq!(config.source_url, "http://cli.example/api");
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let args = Args {
            fetch_timeout_secs: Some(0),
            ..args()
        };
        let result = SyncConfig::resolve(&args, &TomlConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_lock_stale_age_bounds() {
        for secs in [0, MAX_LOCK_STALE_AFTER_SECS + 1, 1_000_000_000_000_000, u64::MAX] {
            let args = Args {
                lock_stale_after_secs: Some(secs),
                ..args()
            };
            let result = SyncConfig::resolve(&args, &TomlConfig::default());
            assert!(matches!(result, Err(Error::Config(_))), "accepted {}", secs);
        }

        let args = Args {
            lock_stale_after_secs: Some(MAX_LOCK_STALE_AFTER_SECS),
            ..args()
        };
        let config = SyncConfig::resolve(&args, &TomlConfig::default()).unwrap();
        assert_eq!(config.lock_stale_after, chrono::Duration::days(365));
    }

    #[test]
    fn test_non_http_source_is_rejected() {
        let args = Args {
            source_url: Some("ftp://example/api".to_string()),
            ..args()
        };
        assert!(SyncConfig::resolve(&args, &TomlConfig::default()).is_err());
    }

    #[test]
    fn test_dry_run_flag_parses() {
        let args =
            Args::try_parse_from(["sake-sync", "--dry-run", "--root-folder", "/tmp/x"]).unwrap();
        assert!(args.dry_run);
        assert_eq!(args.root_folder, Some(PathBuf::from("/tmp/x")));
    }
}
