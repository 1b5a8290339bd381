//! Generation database operations
//!
//! Completion and failure updates are guarded by `status = 'running'`, so a
//! terminal generation can never be rewritten.

use chrono::{DateTime, Utc};
use sake_common::time::parse_rfc3339;
use sake_common::{Error, Result};
use sqlx::{Row, SqliteConnection};

use crate::models::{ChangeCounts, Generation, GenerationStatus};

/// Create a running generation; the store assigns the identifier
pub async fn create(conn: &mut SqliteConnection, started_at: DateTime<Utc>) -> Result<i64> {
    let generation_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO sync_generations (started_at, status)
        VALUES (?, 'running')
        RETURNING generation_id
        "#,
    )
    .bind(started_at.to_rfc3339())
    .fetch_one(&mut *conn)
    .await?;

    Ok(generation_id)
}

/// Mark a running generation completed with its counters
///
/// Returns `false` when the generation was not running.
pub async fn complete(
    conn: &mut SqliteConnection,
    generation_id: i64,
    counts: &ChangeCounts,
    completed_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE sync_generations SET
            status = 'completed',
            completed_at = ?,
            inserted_count = ?,
            updated_count = ?,
            deleted_count = ?,
            unchanged_count = ?
        WHERE generation_id = ? AND status = 'running'
        "#,
    )
    .bind(completed_at.to_rfc3339())
    .bind(counts.inserted as i64)
    .bind(counts.updated as i64)
    .bind(counts.deleted as i64)
    .bind(counts.unchanged as i64)
    .bind(generation_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Mark a running generation failed with the error message and detail payload
///
/// Returns `false` when the generation was not running.
pub async fn fail(
    conn: &mut SqliteConnection,
    generation_id: i64,
    error_message: &str,
    error_detail: &serde_json::Value,
    completed_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE sync_generations SET
            status = 'failed',
            completed_at = ?,
            error_message = ?,
            error_detail = ?
        WHERE generation_id = ? AND status = 'running'
        "#,
    )
    .bind(completed_at.to_rfc3339())
    .bind(error_message)
    .bind(error_detail.to_string())
    .bind(generation_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Load a generation by id
pub async fn load(conn: &mut SqliteConnection, generation_id: i64) -> Result<Option<Generation>> {
    let row = sqlx::query(
        r#"
        SELECT generation_id, started_at, completed_at, status,
               inserted_count, updated_count, deleted_count, unchanged_count,
               error_message, error_detail
        FROM sync_generations
        WHERE generation_id = ?
        "#,
    )
    .bind(generation_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let started_at: String = row.get("started_at");
    let completed_at: Option<String> = row.get("completed_at");
    let status: String = row.get("status");
    let error_detail: Option<String> = row.get("error_detail");

    Ok(Some(Generation {
        generation_id: row.get("generation_id"),
        started_at: parse_rfc3339(&started_at)?,
        completed_at: completed_at.as_deref().map(parse_rfc3339).transpose()?,
        status: GenerationStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("Unknown generation status: {}", status)))?,
        counts: ChangeCounts {
            inserted: row.get::<i64, _>("inserted_count") as usize,
            updated: row.get::<i64, _>("updated_count") as usize,
            deleted: row.get::<i64, _>("deleted_count") as usize,
            unchanged: row.get::<i64, _>("unchanged_count") as usize,
        },
        error_message: row.get("error_message"),
        error_detail: error_detail
            .map(|json| serde_json::from_str(&json))
            .transpose()?,
    }))
}
