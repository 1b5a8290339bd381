//! Master records (durable current state of one catalog entry)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CandidateRecord, FlavorProfile};

/// Field names written to history for an insert, in canonical order
pub const RECORD_FIELDS: [&str; 11] = [
    "name",
    "brewery_id",
    "brewery_name",
    "sweetness",
    "richness",
    "f1",
    "f2",
    "f3",
    "f4",
    "f5",
    "f6",
];

/// One row of `sake_master`
///
/// Never physically removed: absence from the source sets `is_active = false`
/// and stamps `deleted_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterRecord {
    pub brand_id: i64,
    pub name: String,
    pub brewery_id: i64,
    pub brewery_name: String,
    pub sweetness: f64,
    pub richness: f64,
    pub flavors: FlavorProfile,
    pub content_hash: String,
    /// Generation that last touched this row
    pub generation_id: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl MasterRecord {
    /// Build a fresh active row from a candidate
    pub fn from_candidate(
        candidate: &CandidateRecord,
        content_hash: String,
        generation_id: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            brand_id: candidate.brand_id,
            name: candidate.name.clone(),
            brewery_id: candidate.brewery_id,
            brewery_name: candidate.brewery_name.clone(),
            sweetness: candidate.sweetness,
            richness: candidate.richness,
            flavors: candidate.flavors,
            content_hash,
            generation_id,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Copy of this row with the candidate's comparable fields applied
    pub fn with_candidate(
        &self,
        candidate: &CandidateRecord,
        content_hash: String,
        generation_id: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name: candidate.name.clone(),
            brewery_id: candidate.brewery_id,
            brewery_name: candidate.brewery_name.clone(),
            sweetness: candidate.sweetness,
            richness: candidate.richness,
            flavors: candidate.flavors,
            content_hash,
            generation_id,
            updated_at: now,
            ..self.clone()
        }
    }

    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            brand_id: self.brand_id,
            name: self.name.clone(),
            brewery_id: self.brewery_id,
            brewery_name: self.brewery_name.clone(),
            sweetness: self.sweetness,
            richness: self.richness,
            flavors: self.flavors,
            content_hash: self.content_hash.clone(),
            is_active: self.is_active,
        }
    }
}

/// Point-in-time copy of a master record stored in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub brand_id: i64,
    pub name: String,
    pub brewery_id: i64,
    pub brewery_name: String,
    pub sweetness: f64,
    pub richness: f64,
    #[serde(flatten)]
    pub flavors: FlavorProfile,
    pub content_hash: String,
    pub is_active: bool,
}
