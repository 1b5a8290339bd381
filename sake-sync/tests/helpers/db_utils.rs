//! Database and orchestrator test utilities

use sake_sync::db::CatalogRepository;
use sake_sync::services::{Reporter, SyncOptions, SyncOrchestrator};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::fake_source::FakeCatalogSource;

/// Create a temporary file-backed store with the full schema
///
/// Returns (TempDir, CatalogRepository) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> (TempDir, CatalogRepository) {
    let temp_dir = TempDir::new().unwrap();
    let pool = sake_common::db::init_database(&temp_dir.path().join("sake.db"))
        .await
        .unwrap();
    (temp_dir, CatalogRepository::new(pool))
}

/// Orchestrator over `source`, writing reports to `<temp_dir>/logs`
pub fn create_test_orchestrator(
    temp_dir: &TempDir,
    repository: &CatalogRepository,
    source: &FakeCatalogSource,
    dry_run: bool,
) -> SyncOrchestrator<FakeCatalogSource> {
    let options = SyncOptions::new(dry_run, chrono::Duration::hours(1));
    SyncOrchestrator::new(
        repository.clone(),
        source.clone(),
        Reporter::new(temp_dir.path().join("logs")),
        options,
    )
}

/// Number of rows in `table`
pub async fn count_rows(repository: &CatalogRepository, table: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    sqlx::query_scalar(&sql)
        .fetch_one(repository.pool())
        .await
        .unwrap()
}

/// Report files in `<temp_dir>/logs` whose names start with `prefix`
pub fn report_files(temp_dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(temp_dir.join("logs")) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(prefix))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}
