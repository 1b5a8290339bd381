//! Tests for database initialization
//!
//! Covers automatic creation of a missing database, reopening an existing one,
//! and the constraints the sync engine relies on.

use sake_common::db::init::{init_database, init_memory_database};
use tempfile::TempDir;

async fn table_names(pool: &sqlx::SqlitePool) -> Vec<String> {
    sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("sake.db");
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");

    let tables = table_names(&result.unwrap()).await;
    for expected in [
        "change_summaries",
        "sake_history",
        "sake_master",
        "sync_generations",
        "sync_lock",
    ] {
        assert!(tables.contains(&expected.to_string()), "missing table {}", expected);
    }
}

#[tokio::test]
async fn test_database_opens_existing_without_losing_rows() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("sake.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO sync_generations (started_at) VALUES ('2026-01-01T00:00:00+00:00')")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let reopened = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_generations")
        .fetch_one(&reopened)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_generation_ids_autoincrement() {
    let pool = init_memory_database().await.unwrap();

    let mut ids = Vec::new();
    for _ in 0..3 {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO sync_generations (started_at) VALUES ('2026-01-01T00:00:00+00:00') RETURNING generation_id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        ids.push(id);
    }

    assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids not increasing: {:?}", ids);
}

#[tokio::test]
async fn test_status_check_constraint() {
    let pool = init_memory_database().await.unwrap();

    let result = sqlx::query(
        "INSERT INTO sync_generations (started_at, status) VALUES ('2026-01-01T00:00:00+00:00', 'paused')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "unknown status must be rejected");
}

#[tokio::test]
async fn test_history_requires_existing_master_row() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query("INSERT INTO sync_generations (started_at) VALUES ('2026-01-01T00:00:00+00:00')")
        .execute(&pool)
        .await
        .unwrap();

    let result = sqlx::query(
        r#"
        INSERT INTO sake_history (history_id, brand_id, generation_id, operation, recorded_at)
        VALUES ('h-1', 999, 1, 'insert', '2026-01-01T00:00:00+00:00')
        "#,
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "foreign key to sake_master must be enforced");
}
