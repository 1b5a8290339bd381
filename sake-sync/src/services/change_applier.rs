//! Change applier
//!
//! Writes a detected change set to the master store. Every master write, its
//! history entry and the generation's change summary share one transaction:
//! either the whole run lands or none of it does.

use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use crate::db::{self, CatalogRepository};
use crate::error::SyncResult;
use crate::models::{
    ChangeCounts, ChangeSet, ChangeSummary, HistoryEntry, MasterRecord, RECORD_FIELDS,
};
use crate::services::content_hasher::content_hash;

pub struct ChangeApplier {
    repository: CatalogRepository,
}

impl ChangeApplier {
    pub fn new(repository: CatalogRepository) -> Self {
        Self { repository }
    }

    /// Apply `change_set` under `generation_id` and store `summary`
    ///
    /// On error the transaction is rolled back and nothing from this
    /// generation remains in the master or history tables.
    pub async fn apply(
        &self,
        generation_id: i64,
        change_set: &ChangeSet,
        summary: &ChangeSummary,
    ) -> SyncResult<ChangeCounts> {
        let mut tx = self.repository.begin().await?;

        match apply_changes(&mut *tx, generation_id, change_set, summary).await {
            Ok(()) => {
                tx.commit().await?;
                let counts = change_set.counts();
                info!(
                    generation_id,
                    inserted = counts.inserted,
                    updated = counts.updated,
                    deleted = counts.deleted,
                    "Change set committed"
                );
                Ok(counts)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(generation_id, "Rollback failed: {}", rollback_err);
                }
                warn!(generation_id, "Change set rolled back: {}", e);
                Err(e)
            }
        }
    }
}

async fn apply_changes(
    conn: &mut SqliteConnection,
    generation_id: i64,
    change_set: &ChangeSet,
    summary: &ChangeSummary,
) -> SyncResult<()> {
    let now = sake_common::time::now();

    for candidate in &change_set.inserts {
        let hash = content_hash(candidate);
        let record = MasterRecord::from_candidate(candidate, hash, generation_id, now);
        db::masters::insert(conn, &record).await?;

        let changed_fields = RECORD_FIELDS.iter().map(|f| f.to_string()).collect();
        let entry = HistoryEntry::insert(generation_id, record.snapshot(), changed_fields, now);
        db::history::append(conn, &entry).await?;
        debug!(brand_id = record.brand_id, name = %record.name, "Inserted");
    }

    for update in &change_set.updates {
        let hash = content_hash(&update.new);
        let record = update.old.with_candidate(&update.new, hash, generation_id, now);
        db::masters::update(conn, record.brand_id, &record).await?;

        let entry = HistoryEntry::update(
            generation_id,
            update.old.snapshot(),
            record.snapshot(),
            update.changed_fields.clone(),
            now,
        );
        db::history::append(conn, &entry).await?;
        debug!(brand_id = record.brand_id, fields = ?update.changed_fields, "Updated");
    }

    for old in &change_set.deletes {
        db::masters::soft_delete(conn, old.brand_id, generation_id, now).await?;

        let entry = HistoryEntry::delete(generation_id, old.snapshot(), now);
        db::history::append(conn, &entry).await?;
        debug!(brand_id = old.brand_id, name = %old.name, "Deactivated");
    }

    db::summaries::append(conn, summary).await?;

    Ok(())
}
