//! Classified changes produced by change detection

use crate::models::{CandidateRecord, ChangeCounts, MasterRecord};

/// An update: the stored row, the incoming candidate, and the fields that differ
#[derive(Debug, Clone, PartialEq)]
pub struct RecordUpdate {
    pub old: MasterRecord,
    pub new: CandidateRecord,
    pub changed_fields: Vec<String>,
}

/// Every candidate and active master record, classified
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub inserts: Vec<CandidateRecord>,
    pub updates: Vec<RecordUpdate>,
    /// Active master records absent from this run's candidates
    pub deletes: Vec<MasterRecord>,
    pub unchanged: usize,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    pub fn counts(&self) -> ChangeCounts {
        ChangeCounts {
            inserted: self.inserts.len(),
            updated: self.updates.len(),
            deleted: self.deletes.len(),
            unchanged: self.unchanged,
        }
    }
}
