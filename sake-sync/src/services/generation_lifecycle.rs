//! Generation lifecycle
//!
//! Opens a generation at the start of a run and closes it as completed or
//! failed. In dry-run mode nothing is persisted and the placeholder id
//! [`DRY_RUN_GENERATION_ID`] is used throughout.

use serde_json::json;
use tracing::{error, info};

use crate::db::CatalogRepository;
use crate::error::{RunStage, SyncError, SyncResult};
use crate::models::{ChangeCounts, GenerationStatus, DRY_RUN_GENERATION_ID};

pub struct GenerationLifecycle {
    repository: CatalogRepository,
    dry_run: bool,
}

impl GenerationLifecycle {
    pub fn new(repository: CatalogRepository, dry_run: bool) -> Self {
        Self {
            repository,
            dry_run,
        }
    }

    /// Open a new running generation and return its id
    pub async fn start(&self) -> SyncResult<i64> {
        if self.dry_run {
            info!("Dry run: generation not persisted");
            return Ok(DRY_RUN_GENERATION_ID);
        }

        let generation_id = self
            .repository
            .create_generation(sake_common::time::now())
            .await?;
        info!(generation_id, "Generation started");
        Ok(generation_id)
    }

    /// Mark the generation completed with its final counters
    pub async fn complete(&self, generation_id: i64, counts: &ChangeCounts) -> SyncResult<()> {
        if self.dry_run {
            return Ok(());
        }

        self.ensure_transition(generation_id, GenerationStatus::Completed)
            .await?;
        let updated = self
            .repository
            .complete_generation(generation_id, counts, sake_common::time::now())
            .await?;
        if !updated {
            return Err(self.rejected_transition(generation_id).await);
        }

        info!(
            generation_id,
            inserted = counts.inserted,
            updated = counts.updated,
            deleted = counts.deleted,
            "Generation completed"
        );
        Ok(())
    }

    /// Mark the generation failed, recording the error and the stage reached
    pub async fn fail(
        &self,
        generation_id: i64,
        cause: &SyncError,
        stage: RunStage,
    ) -> SyncResult<()> {
        if self.dry_run {
            return Ok(());
        }

        self.ensure_transition(generation_id, GenerationStatus::Failed)
            .await?;
        let detail = error_detail(cause, stage);
        let updated = self
            .repository
            .fail_generation(
                generation_id,
                &cause.to_string(),
                &detail,
                sake_common::time::now(),
            )
            .await?;
        if !updated {
            return Err(self.rejected_transition(generation_id).await);
        }

        error!(generation_id, stage = ?stage, "Generation failed: {}", cause);
        Ok(())
    }

    /// Check the stored status allows moving to `next`
    ///
    /// The status update itself stays guarded on `running`, so a run that
    /// changes the row between this check and the update is still rejected.
    async fn ensure_transition(
        &self,
        generation_id: i64,
        next: GenerationStatus,
    ) -> SyncResult<()> {
        let status = match self.repository.load_generation(generation_id).await? {
            Some(generation) if generation.status.can_transition_to(next) => return Ok(()),
            Some(generation) => generation.status.as_str().to_string(),
            None => "missing".to_string(),
        };
        Err(SyncError::InvalidTransition {
            generation_id,
            status,
        })
    }

    async fn rejected_transition(&self, generation_id: i64) -> SyncError {
        let status = match self.repository.load_generation(generation_id).await {
            Ok(Some(generation)) => generation.status.as_str().to_string(),
            Ok(None) => "missing".to_string(),
            Err(e) => return e.into(),
        };
        SyncError::InvalidTransition {
            generation_id,
            status,
        }
    }
}

/// Structured error payload stored on a failed generation
pub fn error_detail(cause: &SyncError, stage: RunStage) -> serde_json::Value {
    json!({
        "kind": cause.kind(),
        "stage": stage,
        "chain": cause.chain(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use sake_common::db::init_memory_database;

    async fn lifecycle(dry_run: bool) -> (GenerationLifecycle, CatalogRepository) {
        let pool = init_memory_database().await.unwrap();
        let repository = CatalogRepository::new(pool);
        (GenerationLifecycle::new(repository.clone(), dry_run), repository)
    }

    #[tokio::test]
    async fn test_start_and_complete() {
        let (lifecycle, repository) = lifecycle(false).await;

        let id = lifecycle.start().await.unwrap();
        let counts = ChangeCounts {
            inserted: 1,
            ..Default::default()
        };
        lifecycle.complete(id, &counts).await.unwrap();

        let generation = repository.load_generation(id).await.unwrap().unwrap();
        assert_eq!(generation.status, GenerationStatus::Completed);
        assert_eq!(generation.counts.inserted, 1);
        assert!(generation.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_fail_records_stage_and_chain() {
        let (lifecycle, repository) = lifecycle(false).await;

        let id = lifecycle.start().await.unwrap();
        let cause = SyncError::Fetch(FetchError::Timeout {
            endpoint: "brands".to_string(),
        });
        lifecycle.fail(id, &cause, RunStage::Fetch).await.unwrap();

        let generation = repository.load_generation(id).await.unwrap().unwrap();
        assert_eq!(generation.status, GenerationStatus::Failed);
        assert_eq!(
            generation.error_message.as_deref(),
            Some("Fetch failed: Request to brands timed out")
        );
        let detail = generation.error_detail.unwrap();
        assert_eq!(detail["stage"], "fetch");
        assert_eq!(detail["kind"], "fetch");
        assert_eq!(detail["chain"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_terminal_generation_cannot_transition() {
        let (lifecycle, _) = lifecycle(false).await;

        let id = lifecycle.start().await.unwrap();
        lifecycle.complete(id, &ChangeCounts::default()).await.unwrap();

        let cause = SyncError::Internal("late failure".to_string());
        let result = lifecycle.fail(id, &cause, RunStage::Report).await;
        assert!(matches!(
            result,
            Err(SyncError::InvalidTransition { status, .. }) if status == "completed"
        ));
    }

    #[tokio::test]
    async fn test_failed_generation_cannot_complete() {
        let (lifecycle, repository) = lifecycle(false).await;

        let id = lifecycle.start().await.unwrap();
        let cause = SyncError::Internal("boom".to_string());
        lifecycle.fail(id, &cause, RunStage::Apply).await.unwrap();

        let counts = ChangeCounts {
            inserted: 3,
            ..Default::default()
        };
        let result = lifecycle.complete(id, &counts).await;
        assert!(matches!(
            result,
            Err(SyncError::InvalidTransition { status, .. }) if status == "failed"
        ));

        // Row untouched by the rejected completion
        let generation = repository.load_generation(id).await.unwrap().unwrap();
        assert_eq!(generation.status, GenerationStatus::Failed);
        assert_eq!(generation.counts.inserted, 0);
    }

    #[tokio::test]
    async fn test_unknown_generation_is_rejected() {
        let (lifecycle, _) = lifecycle(false).await;

        let result = lifecycle.complete(42, &ChangeCounts::default()).await;
        assert!(matches!(
            result,
            Err(SyncError::InvalidTransition { generation_id: 42, status }) if status == "missing"
        ));
    }

    #[tokio::test]
    async fn test_dry_run_persists_nothing() {
        let (lifecycle, repository) = lifecycle(true).await;

        let id = lifecycle.start().await.unwrap();
        assert_eq!(id, DRY_RUN_GENERATION_ID);
        lifecycle.complete(id, &ChangeCounts::default()).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_generations")
            .fetch_one(repository.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
