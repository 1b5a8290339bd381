//! Synchronization orchestrator
//!
//! Drives one run end to end:
//!
//! ```text
//! lock → start generation → fetch → load master → detect
//!      → [dry run: preview] | [summary + apply]
//!      → complete / fail → report → unlock
//! ```
//!
//! Every fatal error marks the generation failed (when one was opened and
//! writes are enabled), produces an error report, and is returned to the
//! caller.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::{CatalogRepository, LockAttempt};
use crate::error::{RunStage, SyncError, SyncResult};
use crate::models::{ChangeCounts, ChangeSummary, GenerationStatus};
use crate::services::catalog_client::CatalogSource;
use crate::services::change_applier::ChangeApplier;
use crate::services::change_detector::detect;
use crate::services::generation_lifecycle::GenerationLifecycle;
use crate::services::reporter::{render_preview, ErrorReport, Reporter, RunReport, RunStatistics};
use crate::services::source_fetcher::{FetchStats, SourceDataFetcher};
use crate::services::summary_builder::build_summary;

/// Default age after which an abandoned run lock is taken over
pub const DEFAULT_LOCK_STALE_AFTER_SECS: u64 = 3600;

/// Run options
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Compute and report the change set without writing
    pub dry_run: bool,
    pub lock_stale_after: chrono::Duration,
    /// Identity recorded in the run lock
    pub holder: String,
}

impl SyncOptions {
    pub fn new(dry_run: bool, lock_stale_after: chrono::Duration) -> Self {
        Self {
            dry_run,
            lock_stale_after,
            holder: format!("sake-sync-{}-{}", std::process::id(), Uuid::new_v4().simple()),
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::new(
            false,
            chrono::Duration::seconds(DEFAULT_LOCK_STALE_AFTER_SECS as i64),
        )
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Persisted generation id, or `0` for a dry run
    pub generation_id: i64,
    pub dry_run: bool,
    pub counts: ChangeCounts,
    pub fetch: FetchStats,
    pub summary: ChangeSummary,
    /// Human-readable change preview (dry run only)
    pub preview: Option<String>,
    pub report_path: PathBuf,
}

#[derive(Default)]
struct RunProgress {
    stage: Option<RunStage>,
    generation_id: Option<i64>,
    statistics: RunStatistics,
}

impl RunProgress {
    fn enter(&mut self, stage: RunStage) {
        debug!(stage = ?stage, "Entering stage");
        self.stage = Some(stage);
    }

    fn stage(&self) -> RunStage {
        self.stage.unwrap_or(RunStage::Lock)
    }
}

struct ExecutedRun {
    generation_id: i64,
    counts: ChangeCounts,
    fetch: FetchStats,
    summary: ChangeSummary,
    preview: Option<String>,
}

/// Catalog synchronization engine
pub struct SyncOrchestrator<S: CatalogSource> {
    repository: CatalogRepository,
    fetcher: SourceDataFetcher<S>,
    lifecycle: GenerationLifecycle,
    applier: ChangeApplier,
    reporter: Reporter,
    options: SyncOptions,
}

impl<S: CatalogSource> SyncOrchestrator<S> {
    pub fn new(
        repository: CatalogRepository,
        source: S,
        reporter: Reporter,
        options: SyncOptions,
    ) -> Self {
        Self {
            fetcher: SourceDataFetcher::new(source),
            lifecycle: GenerationLifecycle::new(repository.clone(), options.dry_run),
            applier: ChangeApplier::new(repository.clone()),
            repository,
            reporter,
            options,
        }
    }

    /// Execute one synchronization run
    pub async fn run(&self) -> SyncResult<RunOutcome> {
        let started_at = sake_common::time::now();
        let mut progress = RunProgress::default();
        info!(dry_run = self.options.dry_run, "Synchronization run starting");

        if !self.options.dry_run {
            progress.enter(RunStage::Lock);
            if let Err(e) = self.acquire_lock().await {
                self.report_failure(started_at, &progress, &e).await;
                return Err(e);
            }
        }

        let result = match self.execute(&mut progress).await {
            Ok(executed) => {
                self.report_success(started_at, &progress.statistics, executed)
                    .await
            }
            Err(e) => {
                self.mark_failed(&progress, &e).await;
                self.report_failure(started_at, &progress, &e).await;
                Err(e)
            }
        };

        if !self.options.dry_run {
            self.release_lock().await;
        }

        result
    }

    async fn execute(&self, progress: &mut RunProgress) -> SyncResult<ExecutedRun> {
        progress.enter(RunStage::Start);
        let generation_id = self.lifecycle.start().await?;
        progress.generation_id = Some(generation_id);

        progress.enter(RunStage::Fetch);
        let (candidates, fetch) = self.fetcher.fetch().await?;
        progress.statistics.fetch = Some(fetch);

        progress.enter(RunStage::LoadMaster);
        let master = self.repository.list_active_master_records().await?;
        progress.statistics.master_records = Some(master.len());
        info!(active = master.len(), "Loaded master snapshot");

        progress.enter(RunStage::Detect);
        let change_set = detect(&candidates, master);
        progress.statistics.counts = Some(change_set.counts());

        let summary = build_summary(generation_id, &change_set, sake_common::time::now());

        let (counts, preview) = if self.options.dry_run {
            let preview = render_preview(&change_set);
            info!(
                changes = summary.total_changes,
                severity = summary.severity.as_str(),
                "Dry run: no changes written"
            );
            (change_set.counts(), Some(preview))
        } else {
            progress.enter(RunStage::Apply);
            if change_set.is_empty() {
                info!("No changes detected");
            }
            let counts = self.applier.apply(generation_id, &change_set, &summary).await?;
            (counts, None)
        };

        progress.enter(RunStage::Complete);
        self.lifecycle.complete(generation_id, &counts).await?;

        Ok(ExecutedRun {
            generation_id,
            counts,
            fetch,
            summary,
            preview,
        })
    }

    async fn acquire_lock(&self) -> SyncResult<()> {
        let attempt = self
            .repository
            .try_acquire_sync_lock(
                &self.options.holder,
                sake_common::time::now(),
                self.options.lock_stale_after,
            )
            .await?;

        match attempt {
            LockAttempt::Acquired => {
                debug!(holder = %self.options.holder, "Run lock acquired");
                Ok(())
            }
            LockAttempt::TookOver {
                previous_holder,
                since,
            } => {
                warn!(
                    previous_holder = %previous_holder,
                    since = %since,
                    "Took over stale run lock"
                );
                Ok(())
            }
            LockAttempt::Held { holder, since } => Err(SyncError::AlreadyRunning {
                holder,
                since: since.to_rfc3339(),
            }),
        }
    }

    async fn release_lock(&self) {
        match self.repository.release_sync_lock(&self.options.holder).await {
            Ok(true) => debug!("Run lock released"),
            Ok(false) => warn!(holder = %self.options.holder, "Run lock was no longer held"),
            Err(e) => error!("Failed to release run lock: {}", e),
        }
    }

    async fn mark_failed(&self, progress: &RunProgress, cause: &SyncError) {
        let Some(generation_id) = progress.generation_id else {
            return;
        };
        if let Err(e) = self
            .lifecycle
            .fail(generation_id, cause, progress.stage())
            .await
        {
            error!(generation_id, "Failed to mark generation failed: {}", e);
        }
    }

    async fn report_success(
        &self,
        started_at: DateTime<Utc>,
        statistics: &RunStatistics,
        executed: ExecutedRun,
    ) -> SyncResult<RunOutcome> {
        let finished_at = sake_common::time::now();
        let report = RunReport {
            generation_id: Some(executed.generation_id),
            status: GenerationStatus::Completed,
            dry_run: self.options.dry_run,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
            counts: executed.counts,
            statistics: statistics.clone(),
            summary: Some(executed.summary.clone()),
            error: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        };

        let report_path = self.reporter.write_report(&report).await.map_err(|e| {
            error!(generation_id = executed.generation_id, "Run report not written: {}", e);
            e
        })?;

        info!(
            generation_id = executed.generation_id,
            duration_ms = report.duration_ms,
            "Synchronization run completed"
        );

        Ok(RunOutcome {
            generation_id: executed.generation_id,
            dry_run: self.options.dry_run,
            counts: executed.counts,
            fetch: executed.fetch,
            summary: executed.summary,
            preview: executed.preview,
            report_path,
        })
    }

    /// Write the run report and the error report of a failed run
    ///
    /// Report errors are logged; the run's own error is what the caller sees.
    async fn report_failure(
        &self,
        started_at: DateTime<Utc>,
        progress: &RunProgress,
        cause: &SyncError,
    ) {
        let finished_at = sake_common::time::now();
        let report = RunReport {
            generation_id: progress.generation_id,
            status: GenerationStatus::Failed,
            dry_run: self.options.dry_run,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
            counts: ChangeCounts::default(),
            statistics: progress.statistics.clone(),
            summary: None,
            error: Some(cause.to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        if let Err(e) = self.reporter.write_report(&report).await {
            error!("Run report not written: {}", e);
        }

        let error_report = ErrorReport::new(
            progress.generation_id,
            self.options.dry_run,
            progress.stage(),
            cause,
            progress.statistics.clone(),
        );
        if let Err(e) = self.reporter.write_error_report(started_at, &error_report).await {
            error!("Error report not written: {}", e);
        }

        error!(stage = ?progress.stage(), "Synchronization run failed: {}", cause);
    }
}
