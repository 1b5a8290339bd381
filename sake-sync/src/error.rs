//! Error types for sake-sync
//!
//! Fatal errors are classified by the stage at which they occur so the error
//! report can tell an operator whether any writes were attempted.

use serde::Serialize;
use thiserror::Error;

/// Catalog provider errors
///
/// Any of these aborts the fetch; no partial candidate set is returned.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error fetching {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("API error {status} from {endpoint}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Parse error in {endpoint}: {message}")]
    Parse { endpoint: String, message: String },

    /// Payload decoded but violates the expected shape or value ranges
    #[error("Schema violation in {endpoint}: {message}")]
    Schema { endpoint: String, message: String },
}

/// Stage of a run at which a fatal error surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Lock,
    Start,
    Fetch,
    LoadMaster,
    Detect,
    Apply,
    Complete,
    Report,
}

/// Synchronization run error
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Store error: {0}")]
    Store(#[from] sake_common::Error),

    /// Another run holds the single-flight lock
    #[error("Another synchronization run is active (holder {holder}, since {since})")]
    AlreadyRunning { holder: String, since: String },

    /// Generation status may only move forward from `running`
    #[error("Generation {generation_id} is not running (status {status})")]
    InvalidTransition { generation_id: i64, status: String },

    #[error("Report error: {0}")]
    Report(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        SyncError::Store(sake_common::Error::Database(err))
    }
}

impl SyncError {
    /// Short machine-readable classification
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Fetch(_) => "fetch",
            SyncError::Store(_) => "store",
            SyncError::AlreadyRunning { .. } => "already_running",
            SyncError::InvalidTransition { .. } => "invalid_transition",
            SyncError::Report(_) => "report",
            SyncError::Internal(_) => "internal",
        }
    }

    /// Causes of this error, outermost first
    ///
    /// Serialized into the generation's error detail and the error report.
    pub fn chain(&self) -> Vec<String> {
        let mut chain = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }
        chain
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
