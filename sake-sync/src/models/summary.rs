//! Change summaries (impact overview of one generation)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse impact tier derived from the total number of changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Minor,
    Moderate,
    Major,
}

impl Severity {
    /// 0 → none, ≤10 → minor, ≤100 → moderate, otherwise major
    pub fn from_total(total_changes: usize) -> Self {
        match total_changes {
            0 => Severity::None,
            1..=10 => Severity::Minor,
            11..=100 => Severity::Moderate,
            _ => Severity::Major,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Major => "major",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Severity::None),
            "minor" => Some(Severity::Minor),
            "moderate" => Some(Severity::Moderate),
            "major" => Some(Severity::Major),
            _ => None,
        }
    }
}

/// One row of `change_summaries` (at most one per generation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub generation_id: i64,
    /// Display names of inserted records
    pub added: Vec<String>,
    /// Display names of deactivated records
    pub removed: Vec<String>,
    /// Display names of updated records
    pub updated: Vec<String>,
    pub total_changes: usize,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(Severity::from_total(0), Severity::None);
        assert_eq!(Severity::from_total(1), Severity::Minor);
        assert_eq!(Severity::from_total(10), Severity::Minor);
        assert_eq!(Severity::from_total(11), Severity::Moderate);
        assert_eq!(Severity::from_total(100), Severity::Moderate);
        assert_eq!(Severity::from_total(101), Severity::Major);
    }
}
