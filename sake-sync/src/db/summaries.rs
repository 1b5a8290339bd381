//! Change summary database operations

use sake_common::time::parse_rfc3339;
use sake_common::{Error, Result};
use sqlx::{Row, SqliteConnection};

use crate::models::{ChangeSummary, Severity};

/// Store the summary of a generation (at most one per generation)
pub async fn append(conn: &mut SqliteConnection, summary: &ChangeSummary) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO change_summaries (
            generation_id, added_names, removed_names, updated_names,
            total_changes, severity, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(summary.generation_id)
    .bind(serde_json::to_string(&summary.added)?)
    .bind(serde_json::to_string(&summary.removed)?)
    .bind(serde_json::to_string(&summary.updated)?)
    .bind(summary.total_changes as i64)
    .bind(summary.severity.as_str())
    .bind(summary.created_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Load the summary of a generation
pub async fn load(
    conn: &mut SqliteConnection,
    generation_id: i64,
) -> Result<Option<ChangeSummary>> {
    let row = sqlx::query(
        r#"
        SELECT generation_id, added_names, removed_names, updated_names,
               total_changes, severity, created_at
        FROM change_summaries
        WHERE generation_id = ?
        "#,
    )
    .bind(generation_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let added: String = row.get("added_names");
    let removed: String = row.get("removed_names");
    let updated: String = row.get("updated_names");
    let severity: String = row.get("severity");
    let created_at: String = row.get("created_at");

    Ok(Some(ChangeSummary {
        generation_id: row.get("generation_id"),
        added: serde_json::from_str(&added)?,
        removed: serde_json::from_str(&removed)?,
        updated: serde_json::from_str(&updated)?,
        total_changes: row.get::<i64, _>("total_changes") as usize,
        severity: Severity::parse(&severity)
            .ok_or_else(|| Error::Internal(format!("Unknown severity: {}", severity)))?,
        created_at: parse_rfc3339(&created_at)?,
    }))
}
