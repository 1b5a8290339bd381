//! Database access for sake-sync
//!
//! Row-level operations live in the submodules and take a
//! `&mut SqliteConnection`, so they run equally against a pooled connection or
//! inside a transaction. [`CatalogRepository`] wraps the pool and exposes each
//! operation as a single atomic call.

pub mod generations;
pub mod history;
pub mod lock;
pub mod masters;
pub mod summaries;

use chrono::{DateTime, Utc};
use sake_common::Result;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::warn;

use crate::models::{ChangeCounts, ChangeSummary, Generation, HistoryEntry, MasterRecord};

pub use lock::LockAttempt;

/// Repository over the catalog store
#[derive(Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Create new repository with database pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a transaction spanning several row operations
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Current active master snapshot
    ///
    /// A missing master table means the store was never bootstrapped and is
    /// read as an empty set.
    pub async fn list_active_master_records(&self) -> Result<Vec<MasterRecord>> {
        let mut conn = self.pool.acquire().await?;
        match masters::list_active(&mut conn).await {
            Ok(records) => Ok(records),
            Err(e) if e.is_missing_table() => {
                warn!("Master table not found, treating master set as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn load_master_record(&self, brand_id: i64) -> Result<Option<MasterRecord>> {
        let mut conn = self.pool.acquire().await?;
        masters::load(&mut conn, brand_id).await
    }

    pub async fn insert_master_record(&self, record: &MasterRecord) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        masters::insert(&mut conn, record).await
    }

    pub async fn update_master_record(&self, brand_id: i64, record: &MasterRecord) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        masters::update(&mut conn, brand_id, record).await
    }

    pub async fn soft_delete_master_record(
        &self,
        brand_id: i64,
        generation_id: i64,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        masters::soft_delete(&mut conn, brand_id, generation_id, at).await
    }

    pub async fn append_history_entry(&self, entry: &HistoryEntry) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        history::append(&mut conn, entry).await
    }

    pub async fn history_for_generation(&self, generation_id: i64) -> Result<Vec<HistoryEntry>> {
        let mut conn = self.pool.acquire().await?;
        history::for_generation(&mut conn, generation_id).await
    }

    pub async fn count_history_for_generation(&self, generation_id: i64) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        history::count_for_generation(&mut conn, generation_id).await
    }

    pub async fn create_generation(&self, started_at: DateTime<Utc>) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        generations::create(&mut conn, started_at).await
    }

    pub async fn complete_generation(
        &self,
        generation_id: i64,
        counts: &ChangeCounts,
        completed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        generations::complete(&mut conn, generation_id, counts, completed_at).await
    }

    pub async fn fail_generation(
        &self,
        generation_id: i64,
        error_message: &str,
        error_detail: &serde_json::Value,
        completed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        generations::fail(&mut conn, generation_id, error_message, error_detail, completed_at)
            .await
    }

    pub async fn load_generation(&self, generation_id: i64) -> Result<Option<Generation>> {
        let mut conn = self.pool.acquire().await?;
        generations::load(&mut conn, generation_id).await
    }

    pub async fn append_change_summary(&self, summary: &ChangeSummary) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        summaries::append(&mut conn, summary).await
    }

    pub async fn load_change_summary(&self, generation_id: i64) -> Result<Option<ChangeSummary>> {
        let mut conn = self.pool.acquire().await?;
        summaries::load(&mut conn, generation_id).await
    }

    pub async fn try_acquire_sync_lock(
        &self,
        holder: &str,
        now: DateTime<Utc>,
        stale_after: chrono::Duration,
    ) -> Result<LockAttempt> {
        let mut conn = self.pool.acquire().await?;
        lock::try_acquire(&mut conn, holder, now, stale_after).await
    }

    pub async fn release_sync_lock(&self, holder: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        lock::release(&mut conn, holder).await
    }
}
