//! Generations (one per synchronization run)
//!
//! Status only moves forward: `running → completed` or `running → failed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder identifier reported by dry runs (never persisted)
pub const DRY_RUN_GENERATION_ID: i64 = 0;

/// Generation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Running,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Running => "running",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "running" => Some(GenerationStatus::Running),
            "completed" => Some(GenerationStatus::Completed),
            "failed" => Some(GenerationStatus::Failed),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: GenerationStatus) -> bool {
        matches!(
            (self, next),
            (GenerationStatus::Running, GenerationStatus::Completed)
                | (GenerationStatus::Running, GenerationStatus::Failed)
        )
    }
}

/// Aggregate change counters recorded on completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

impl ChangeCounts {
    /// Number of mutations (unchanged records excluded)
    pub fn total_changes(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }
}

/// One row of `sync_generations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub generation_id: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: GenerationStatus,
    pub counts: ChangeCounts,
    pub error_message: Option<String>,
    pub error_detail: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_moves_forward_only() {
        use GenerationStatus::*;

        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Failed));
        assert!(!Completed.can_transition_to(Running));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Running.can_transition_to(Running));
    }

    #[test]
    fn test_total_changes_excludes_unchanged() {
        let counts = ChangeCounts {
            inserted: 2,
            updated: 3,
            deleted: 1,
            unchanged: 40,
        };
        assert_eq!(counts.total_changes(), 6);
    }
}
