//! Configuration resolution through environment variables and TOML files
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that set SAKE_SYNC_* variables are marked with #[serial].

use clap::Parser;
use serial_test::serial;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

use sake_sync::config::{Args, SyncConfig};

const SAKE_SYNC_VARS: [&str; 9] = [
    "SAKE_SYNC_ROOT_FOLDER",
    "SAKE_SYNC_DATABASE",
    "SAKE_SYNC_DRY_RUN",
    "SAKE_SYNC_SOURCE_URL",
    "SAKE_SYNC_FETCH_TIMEOUT_SECS",
    "SAKE_SYNC_REPORT_DIR",
    "SAKE_SYNC_LOCK_STALE_SECS",
    "SAKE_SYNC_CONFIG",
    "SAKE_SYNC_LOG_LEVEL",
];

fn clear_env() {
    for var in SAKE_SYNC_VARS {
        std::env::remove_var(var);
    }
}

fn write_toml(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_environment_overrides_toml() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let config_path = write_toml(
        &dir,
        r#"
root_folder = "/srv/sake"
source_url = "http://toml.example/api"
fetch_timeout_secs = 10

[logging]
level = "warn"
"#,
    );

    std::env::set_var("SAKE_SYNC_CONFIG", &config_path);
    std::env::set_var("SAKE_SYNC_SOURCE_URL", "http://env.example/api");
    std::env::set_var("SAKE_SYNC_DRY_RUN", "1");

    let args = Args::try_parse_from(["sake-sync"]).unwrap();
    let config = SyncConfig::load(&args).unwrap();

    assert_eq!(config.source_url, "http://env.example/api");
    assert!(config.dry_run);
    assert_eq!(config.root_folder, PathBuf::from("/srv/sake"));
    assert_eq!(config.database_path, PathBuf::from("/srv/sake/sake.db"));
    assert_eq!(config.fetch_timeout, Duration::from_secs(10));
    assert_eq!(config.log_level, "warn");

    clear_env();
}

#[test]
#[serial]
fn test_dry_run_env_accepts_false_literal() {
    clear_env();
    let dir = TempDir::new().unwrap();
    std::env::set_var("SAKE_SYNC_ROOT_FOLDER", dir.path());
    std::env::set_var("SAKE_SYNC_CONFIG", dir.path().join("absent.toml"));
    std::env::set_var("SAKE_SYNC_DRY_RUN", "false");

    let args = Args::try_parse_from(["sake-sync"]).unwrap();
    let config = SyncConfig::load(&args).unwrap();

    assert!(!config.dry_run);
    assert_eq!(config.root_folder, dir.path());
    assert_eq!(config.report_dir, dir.path().join("logs"));

    clear_env();
}

#[test]
#[serial]
fn test_command_line_overrides_environment() {
    clear_env();
    let dir = TempDir::new().unwrap();
    std::env::set_var("SAKE_SYNC_CONFIG", dir.path().join("absent.toml"));
    std::env::set_var("SAKE_SYNC_DATABASE", "/env/sake.db");

    let args =
        Args::try_parse_from(["sake-sync", "--database", "/cli/sake.db", "--root-folder", "/r"])
            .unwrap();
    let config = SyncConfig::load(&args).unwrap();

    assert_eq!(config.database_path, PathBuf::from("/cli/sake.db"));

    clear_env();
}

#[test]
#[serial]
fn test_malformed_toml_is_config_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let config_path = write_toml(&dir, "fetch_timeout_secs = \"soon\"\n");
    std::env::set_var("SAKE_SYNC_CONFIG", &config_path);

    let args = Args::try_parse_from(["sake-sync"]).unwrap();
    let result = SyncConfig::load(&args);

    assert!(matches!(result, Err(sake_common::Error::Config(_))));

    clear_env();
}
