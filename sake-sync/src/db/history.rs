//! History entry database operations
//!
//! Append-only: there is no update or delete for `sake_history`.

use sake_common::time::parse_rfc3339;
use sake_common::{Error, Result};
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use crate::models::{ChangeOperation, HistoryEntry, RecordSnapshot};

/// Append one history entry
pub async fn append(conn: &mut SqliteConnection, entry: &HistoryEntry) -> Result<()> {
    let old_data = entry.old_data.as_ref().map(serde_json::to_string).transpose()?;
    let new_data = entry.new_data.as_ref().map(serde_json::to_string).transpose()?;
    let changed_fields = serde_json::to_string(&entry.changed_fields)?;

    sqlx::query(
        r#"
        INSERT INTO sake_history (
            history_id, brand_id, generation_id, operation,
            old_data, new_data, changed_fields, recorded_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.history_id.to_string())
    .bind(entry.brand_id)
    .bind(entry.generation_id)
    .bind(entry.operation.as_str())
    .bind(old_data)
    .bind(new_data)
    .bind(changed_fields)
    .bind(entry.recorded_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn parse_snapshot(value: Option<String>) -> Result<Option<RecordSnapshot>> {
    value
        .map(|json| serde_json::from_str::<RecordSnapshot>(&json))
        .transpose()
        .map_err(Error::from)
}

/// Load every history entry written by one generation, in write order
pub async fn for_generation(
    conn: &mut SqliteConnection,
    generation_id: i64,
) -> Result<Vec<HistoryEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT history_id, brand_id, generation_id, operation,
               old_data, new_data, changed_fields, recorded_at
        FROM sake_history
        WHERE generation_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(generation_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| {
            let history_id: String = row.get("history_id");
            let operation: String = row.get("operation");
            let changed_fields: String = row.get("changed_fields");
            let recorded_at: String = row.get("recorded_at");

            Ok(HistoryEntry {
                history_id: Uuid::parse_str(&history_id)
                    .map_err(|e| Error::Internal(format!("Failed to parse history_id: {}", e)))?,
                brand_id: row.get("brand_id"),
                generation_id: row.get("generation_id"),
                operation: ChangeOperation::parse(&operation).ok_or_else(|| {
                    Error::Internal(format!("Unknown history operation: {}", operation))
                })?,
                old_data: parse_snapshot(row.get("old_data"))?,
                new_data: parse_snapshot(row.get("new_data"))?,
                changed_fields: serde_json::from_str(&changed_fields)?,
                recorded_at: parse_rfc3339(&recorded_at)?,
            })
        })
        .collect()
}

/// Number of history entries carrying a generation id
pub async fn count_for_generation(conn: &mut SqliteConnection, generation_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sake_history WHERE generation_id = ?")
        .bind(generation_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}
