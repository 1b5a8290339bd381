//! Master record database operations
//!
//! Rows are never physically deleted; see [`soft_delete`].

use chrono::{DateTime, Utc};
use sake_common::time::parse_rfc3339;
use sake_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::models::{FlavorProfile, MasterRecord};

const MASTER_COLUMNS: &str = r#"
    brand_id, name, brewery_id, brewery_name, sweetness, richness,
    f1, f2, f3, f4, f5, f6, content_hash, generation_id, is_active,
    created_at, updated_at, deleted_at
"#;

fn row_to_master(row: &SqliteRow) -> Result<MasterRecord> {
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    let deleted_at: Option<String> = row.get("deleted_at");

    Ok(MasterRecord {
        brand_id: row.get("brand_id"),
        name: row.get("name"),
        brewery_id: row.get("brewery_id"),
        brewery_name: row.get("brewery_name"),
        sweetness: row.get("sweetness"),
        richness: row.get("richness"),
        flavors: FlavorProfile {
            f1: row.get("f1"),
            f2: row.get("f2"),
            f3: row.get("f3"),
            f4: row.get("f4"),
            f5: row.get("f5"),
            f6: row.get("f6"),
        },
        content_hash: row.get("content_hash"),
        generation_id: row.get("generation_id"),
        is_active: row.get::<i64, _>("is_active") != 0,
        created_at: parse_rfc3339(&created_at)?,
        updated_at: parse_rfc3339(&updated_at)?,
        deleted_at: deleted_at.as_deref().map(parse_rfc3339).transpose()?,
    })
}

/// Load every active master record, ordered by brand id
pub async fn list_active(conn: &mut SqliteConnection) -> Result<Vec<MasterRecord>> {
    let sql = format!(
        "SELECT {} FROM sake_master WHERE is_active = 1 ORDER BY brand_id",
        MASTER_COLUMNS
    );
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

    rows.iter().map(row_to_master).collect()
}

/// Load one master record (active or not)
pub async fn load(conn: &mut SqliteConnection, brand_id: i64) -> Result<Option<MasterRecord>> {
    let sql = format!("SELECT {} FROM sake_master WHERE brand_id = ?", MASTER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(brand_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(row_to_master).transpose()
}

/// Insert a master record
///
/// A deactivated row with the same key is reactivated in place; its
/// `created_at` is kept.
pub async fn insert(conn: &mut SqliteConnection, record: &MasterRecord) -> Result<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO sake_master (
            brand_id, name, brewery_id, brewery_name, sweetness, richness,
            f1, f2, f3, f4, f5, f6, content_hash, generation_id, is_active,
            created_at, updated_at, deleted_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, NULL)
        ON CONFLICT(brand_id) DO UPDATE SET
            name = excluded.name,
            brewery_id = excluded.brewery_id,
            brewery_name = excluded.brewery_name,
            sweetness = excluded.sweetness,
            richness = excluded.richness,
            f1 = excluded.f1,
            f2 = excluded.f2,
            f3 = excluded.f3,
            f4 = excluded.f4,
            f5 = excluded.f5,
            f6 = excluded.f6,
            content_hash = excluded.content_hash,
            generation_id = excluded.generation_id,
            is_active = 1,
            updated_at = excluded.updated_at,
            deleted_at = NULL
        WHERE sake_master.is_active = 0
        "#,
    )
    .bind(record.brand_id)
    .bind(&record.name)
    .bind(record.brewery_id)
    .bind(&record.brewery_name)
    .bind(record.sweetness)
    .bind(record.richness)
    .bind(record.flavors.f1)
    .bind(record.flavors.f2)
    .bind(record.flavors.f3)
    .bind(record.flavors.f4)
    .bind(record.flavors.f5)
    .bind(record.flavors.f6)
    .bind(&record.content_hash)
    .bind(record.generation_id)
    .bind(record.created_at.to_rfc3339())
    .bind(record.updated_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;

    // Conflict with an active row: change detection should have produced an update
    if result.rows_affected() == 0 {
        return Err(Error::InvalidInput(format!(
            "brand {} is already active",
            record.brand_id
        )));
    }

    Ok(())
}

/// Overwrite the comparable fields, hash and generation of an active record
pub async fn update(
    conn: &mut SqliteConnection,
    brand_id: i64,
    record: &MasterRecord,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE sake_master SET
            name = ?,
            brewery_id = ?,
            brewery_name = ?,
            sweetness = ?,
            richness = ?,
            f1 = ?, f2 = ?, f3 = ?, f4 = ?, f5 = ?, f6 = ?,
            content_hash = ?,
            generation_id = ?,
            updated_at = ?
        WHERE brand_id = ? AND is_active = 1
        "#,
    )
    .bind(&record.name)
    .bind(record.brewery_id)
    .bind(&record.brewery_name)
    .bind(record.sweetness)
    .bind(record.richness)
    .bind(record.flavors.f1)
    .bind(record.flavors.f2)
    .bind(record.flavors.f3)
    .bind(record.flavors.f4)
    .bind(record.flavors.f5)
    .bind(record.flavors.f6)
    .bind(&record.content_hash)
    .bind(record.generation_id)
    .bind(record.updated_at.to_rfc3339())
    .bind(brand_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("active master record {}", brand_id)));
    }

    Ok(())
}

/// Deactivate a record: `is_active = 0`, `deleted_at` stamped, generation recorded
///
/// All other fields (including the hash) are left untouched.
pub async fn soft_delete(
    conn: &mut SqliteConnection,
    brand_id: i64,
    generation_id: i64,
    at: DateTime<Utc>,
) -> Result<()> {
    let at = at.to_rfc3339();
    let result = sqlx::query(
        r#"
        UPDATE sake_master SET
            is_active = 0,
            deleted_at = ?,
            updated_at = ?,
            generation_id = ?
        WHERE brand_id = ? AND is_active = 1
        "#,
    )
    .bind(&at)
    .bind(&at)
    .bind(generation_id)
    .bind(brand_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("active master record {}", brand_id)));
    }

    Ok(())
}
