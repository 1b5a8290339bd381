//! Change detection
//!
//! Classifies each candidate against the active master snapshot:
//! - key absent from master → insert
//! - key present, same content hash → unchanged
//! - key present, different hash → update, with the fields that differ
//! - active master key absent from candidates → delete

use std::collections::HashMap;
use tracing::info;

use crate::models::{CandidateRecord, ChangeSet, MasterRecord, RecordUpdate};
use crate::services::content_hasher::content_hash;

/// Numeric fields differing by no more than this are considered equal
pub const NUMERIC_EPSILON: f64 = 0.001;

fn numbers_differ(a: f64, b: f64) -> bool {
    (a - b).abs() > NUMERIC_EPSILON
}

/// Names of the comparable fields that differ between `old` and `new`
///
/// Reported in canonical order: name, brewery_name, sweetness, richness, f1..f6.
pub fn changed_fields(old: &MasterRecord, new: &CandidateRecord) -> Vec<String> {
    let mut fields = Vec::new();

    if old.name != new.name {
        fields.push("name".to_string());
    }
    if old.brewery_name != new.brewery_name {
        fields.push("brewery_name".to_string());
    }
    if numbers_differ(old.sweetness, new.sweetness) {
        fields.push("sweetness".to_string());
    }
    if numbers_differ(old.richness, new.richness) {
        fields.push("richness".to_string());
    }
    let flavor_pairs = old.flavors.named().into_iter().zip(new.flavors.named());
    for ((field, old_value), (_, new_value)) in flavor_pairs {
        if numbers_differ(old_value, new_value) {
            fields.push(field.to_string());
        }
    }

    fields
}

/// Classify `candidates` against the active `master` records
///
/// Inserts and updates follow candidate order; deletes are ordered by brand id.
pub fn detect(candidates: &[CandidateRecord], master: Vec<MasterRecord>) -> ChangeSet {
    let mut index: HashMap<i64, MasterRecord> = master
        .into_iter()
        .filter(|record| record.is_active)
        .map(|record| (record.brand_id, record))
        .collect();

    let mut change_set = ChangeSet::default();

    for candidate in candidates {
        match index.remove(&candidate.brand_id) {
            None => change_set.inserts.push(candidate.clone()),
            Some(existing) => {
                if content_hash(candidate) == existing.content_hash {
                    change_set.unchanged += 1;
                } else {
                    let changed_fields = changed_fields(&existing, candidate);
                    change_set.updates.push(RecordUpdate {
                        old: existing,
                        new: candidate.clone(),
                        changed_fields,
                    });
                }
            }
        }
    }

    let mut deletes: Vec<MasterRecord> = index.into_values().collect();
    deletes.sort_by_key(|record| record.brand_id);
    change_set.deletes = deletes;

    let counts = change_set.counts();
    info!(
        inserted = counts.inserted,
        updated = counts.updated,
        deleted = counts.deleted,
        unchanged = counts.unchanged,
        "Change detection complete"
    );

    change_set
}
