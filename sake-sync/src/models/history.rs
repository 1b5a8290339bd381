//! History entries (append-only audit trail)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::RecordSnapshot;

/// Operation applied to a master record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

impl ChangeOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOperation::Insert => "insert",
            ChangeOperation::Update => "update",
            ChangeOperation::Delete => "delete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "insert" => Some(ChangeOperation::Insert),
            "update" => Some(ChangeOperation::Update),
            "delete" => Some(ChangeOperation::Delete),
            _ => None,
        }
    }
}

/// One row of `sake_history`
///
/// Snapshot presence follows the operation: insert has no `old_data`,
/// delete has no `new_data` and an empty `changed_fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub history_id: Uuid,
    pub brand_id: i64,
    pub generation_id: i64,
    pub operation: ChangeOperation,
    pub old_data: Option<RecordSnapshot>,
    pub new_data: Option<RecordSnapshot>,
    pub changed_fields: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn insert(
        generation_id: i64,
        new: RecordSnapshot,
        changed_fields: Vec<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            history_id: Uuid::new_v4(),
            brand_id: new.brand_id,
            generation_id,
            operation: ChangeOperation::Insert,
            old_data: None,
            new_data: Some(new),
            changed_fields,
            recorded_at: at,
        }
    }

    pub fn update(
        generation_id: i64,
        old: RecordSnapshot,
        new: RecordSnapshot,
        changed_fields: Vec<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            history_id: Uuid::new_v4(),
            brand_id: new.brand_id,
            generation_id,
            operation: ChangeOperation::Update,
            old_data: Some(old),
            new_data: Some(new),
            changed_fields,
            recorded_at: at,
        }
    }

    pub fn delete(generation_id: i64, old: RecordSnapshot, at: DateTime<Utc>) -> Self {
        Self {
            history_id: Uuid::new_v4(),
            brand_id: old.brand_id,
            generation_id,
            operation: ChangeOperation::Delete,
            old_data: Some(old),
            new_data: None,
            changed_fields: Vec::new(),
            recorded_at: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_round_trips_through_text() {
        for op in [ChangeOperation::Insert, ChangeOperation::Update, ChangeOperation::Delete] {
            assert_eq!(ChangeOperation::parse(op.as_str()), Some(op));
        }
        assert_eq!(ChangeOperation::parse("upsert"), None);
    }
}
