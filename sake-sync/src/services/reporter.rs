//! Run reports
//!
//! Every run writes `sync-report-<timestamp>.json` to the report directory,
//! with a `-N` suffix when a run starting in the same millisecond already
//! claimed the name. A failed run also writes `sync-error-<timestamp>.json`
//! with the error chain, the stage reached and the statistics gathered up to
//! that point. Reports are for operators; the engine never reads them back.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{RunStage, SyncError, SyncResult};
use crate::models::{ChangeCounts, ChangeSet, ChangeSummary, GenerationStatus};
use crate::services::source_fetcher::FetchStats;
use sake_common::time::compact_timestamp;

/// Statistics accumulated while a run progresses
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStatistics {
    pub fetch: Option<FetchStats>,
    /// Active master records loaded before detection
    pub master_records: Option<usize>,
    pub counts: Option<ChangeCounts>,
}

/// Full report of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Absent when the run stopped before a generation was opened
    pub generation_id: Option<i64>,
    pub status: GenerationStatus,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub counts: ChangeCounts,
    pub statistics: RunStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ChangeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub version: String,
}

/// Error report written alongside the run report of a failed run
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub generation_id: Option<i64>,
    pub dry_run: bool,
    pub occurred_at: DateTime<Utc>,
    pub stage: RunStage,
    pub kind: String,
    pub message: String,
    pub chain: Vec<String>,
    pub statistics: RunStatistics,
}

impl ErrorReport {
    pub fn new(
        generation_id: Option<i64>,
        dry_run: bool,
        stage: RunStage,
        error: &SyncError,
        statistics: RunStatistics,
    ) -> Self {
        Self {
            generation_id,
            dry_run,
            occurred_at: sake_common::time::now(),
            stage,
            kind: error.kind().to_string(),
            message: error.to_string(),
            chain: error.chain(),
            statistics,
        }
    }
}

/// Suffixes tried before giving up on a report name
const MAX_NAME_ATTEMPTS: usize = 100;

/// Writes report files into one directory
pub struct Reporter {
    report_dir: PathBuf,
}

impl Reporter {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    /// Write the run report, named after the run's start time
    pub async fn write_report(&self, report: &RunReport) -> SyncResult<PathBuf> {
        let stem = format!("sync-report-{}", compact_timestamp(report.started_at));
        let path = self.write_json(&stem, report).await?;
        info!(path = %path.display(), "Run report written");
        Ok(path)
    }

    /// Write the error report of a failed run
    pub async fn write_error_report(
        &self,
        started_at: DateTime<Utc>,
        report: &ErrorReport,
    ) -> SyncResult<PathBuf> {
        let stem = format!("sync-error-{}", compact_timestamp(started_at));
        let path = self.write_json(&stem, report).await?;
        info!(path = %path.display(), "Error report written");
        Ok(path)
    }

    /// Write `value` to `<stem>.json`, or `<stem>-N.json` when that name is taken
    ///
    /// Existing reports are never replaced.
    async fn write_json<T: Serialize>(&self, stem: &str, value: &T) -> SyncResult<PathBuf> {
        tokio::fs::create_dir_all(&self.report_dir)
            .await
            .map_err(|e| {
                SyncError::Report(format!(
                    "Failed to create report directory {}: {}",
                    self.report_dir.display(),
                    e
                ))
            })?;

        let json = serde_json::to_vec_pretty(value)
            .map_err(|e| SyncError::Report(format!("Failed to serialize report: {}", e)))?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let file_name = match attempt {
                0 => format!("{}.json", stem),
                n => format!("{}-{}.json", stem, n),
            };
            let path = self.report_dir.join(file_name);

            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Report name taken");
                    continue;
                }
                Err(e) => {
                    return Err(SyncError::Report(format!(
                        "Failed to create {}: {}",
                        path.display(),
                        e
                    )))
                }
            };

            file.write_all(&json).await.map_err(|e| {
                SyncError::Report(format!("Failed to write {}: {}", path.display(), e))
            })?;
            file.flush().await.map_err(|e| {
                SyncError::Report(format!("Failed to write {}: {}", path.display(), e))
            })?;
            return Ok(path);
        }

        Err(SyncError::Report(format!(
            "No free report name for {} in {}",
            stem,
            self.report_dir.display()
        )))
    }
}

/// Human-readable preview of a change set (dry-run output)
pub fn render_preview(change_set: &ChangeSet) -> String {
    let counts = change_set.counts();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Dry run: {} insert(s), {} update(s), {} delete(s), {} unchanged",
        counts.inserted, counts.updated, counts.deleted, counts.unchanged
    );

    if change_set.is_empty() {
        let _ = writeln!(out, "No changes detected.");
        return out;
    }

    for candidate in &change_set.inserts {
        let _ = writeln!(
            out,
            "  + [{}] {} ({})",
            candidate.brand_id, candidate.name, candidate.brewery_name
        );
    }
    for update in &change_set.updates {
        let fields = if update.changed_fields.is_empty() {
            "hash only".to_string()
        } else {
            update.changed_fields.join(", ")
        };
        let _ = writeln!(
            out,
            "  ~ [{}] {}: {}",
            update.new.brand_id, update.new.name, fields
        );
    }
    for record in &change_set.deletes {
        let _ = writeln!(
            out,
            "  - [{}] {} ({})",
            record.brand_id, record.name, record.brewery_name
        );
    }

    out
}
