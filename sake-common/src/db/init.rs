//! Database initialization
//!
//! Opens (creating when missing) the SQLite store and creates the catalog
//! tables. Every statement is idempotent, so startup on an existing database
//! leaves its rows untouched.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Busy timeout applied to every pooled connection
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_tables(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// Limited to one connection: every `sqlite::memory:` connection is a separate database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create every catalog table (idempotent)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_generations_table(pool).await?;
    create_master_table(pool).await?;
    create_history_table(pool).await?;
    create_change_summaries_table(pool).await?;
    create_sync_lock_table(pool).await?;

    tracing::debug!("Catalog tables initialized");
    Ok(())
}

pub async fn create_generations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sync_generations (
            generation_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            completed_at TEXT,
            status TEXT NOT NULL DEFAULT 'running'
                CHECK (status IN ('running', 'completed', 'failed')),
            inserted_count INTEGER NOT NULL DEFAULT 0,
            updated_count INTEGER NOT NULL DEFAULT 0,
            deleted_count INTEGER NOT NULL DEFAULT 0,
            unchanged_count INTEGER NOT NULL DEFAULT 0,
            error_message TEXT,
            error_detail TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_master_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sake_master (
            brand_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            brewery_id INTEGER NOT NULL,
            brewery_name TEXT NOT NULL,
            sweetness REAL NOT NULL,
            richness REAL NOT NULL,
            f1 REAL NOT NULL,
            f2 REAL NOT NULL,
            f3 REAL NOT NULL,
            f4 REAL NOT NULL,
            f5 REAL NOT NULL,
            f6 REAL NOT NULL,
            content_hash TEXT NOT NULL,
            generation_id INTEGER NOT NULL REFERENCES sync_generations(generation_id),
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sake_master_active ON sake_master(is_active)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sake_history (
            history_id TEXT PRIMARY KEY,
            brand_id INTEGER NOT NULL REFERENCES sake_master(brand_id),
            generation_id INTEGER NOT NULL REFERENCES sync_generations(generation_id),
            operation TEXT NOT NULL CHECK (operation IN ('insert', 'update', 'delete')),
            old_data TEXT,
            new_data TEXT,
            changed_fields TEXT NOT NULL DEFAULT '[]',
            recorded_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_sake_history_generation ON sake_history(generation_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sake_history_brand ON sake_history(brand_id)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_change_summaries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS change_summaries (
            generation_id INTEGER PRIMARY KEY REFERENCES sync_generations(generation_id),
            added_names TEXT NOT NULL DEFAULT '[]',
            removed_names TEXT NOT NULL DEFAULT '[]',
            updated_names TEXT NOT NULL DEFAULT '[]',
            total_changes INTEGER NOT NULL,
            severity TEXT NOT NULL CHECK (severity IN ('none', 'minor', 'moderate', 'major')),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_sync_lock_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sync_lock (
            lock_name TEXT PRIMARY KEY,
            holder TEXT NOT NULL,
            acquired_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
