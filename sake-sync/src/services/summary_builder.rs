//! Change summary builder

use chrono::{DateTime, Utc};

use crate::models::{ChangeSet, ChangeSummary, Severity};

/// Summarize a change set by display name with its severity tier
pub fn build_summary(
    generation_id: i64,
    change_set: &ChangeSet,
    created_at: DateTime<Utc>,
) -> ChangeSummary {
    let added: Vec<String> = change_set.inserts.iter().map(|c| c.name.clone()).collect();
    let removed: Vec<String> = change_set.deletes.iter().map(|m| m.name.clone()).collect();
    let updated: Vec<String> = change_set
        .updates
        .iter()
        .map(|u| u.new.name.clone())
        .collect();

    let total_changes = change_set.counts().total_changes();

    ChangeSummary {
        generation_id,
        added,
        removed,
        updated,
        total_changes,
        severity: Severity::from_total(total_changes),
        created_at,
    }
}
