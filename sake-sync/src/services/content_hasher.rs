//! Content hashing for change detection
//!
//! SHA-256 over a canonical JSON array of the comparable fields in a fixed
//! order: name, brewery name, sweetness, richness, f1..f6. Numbers are
//! rounded to three decimals and rendered as fixed-width text, so float noise
//! below that precision never changes the hash.

use sha2::{Digest, Sha256};

use crate::models::{CandidateRecord, FlavorProfile, MasterRecord};

/// Decimal places kept before hashing
pub const HASH_DECIMALS: usize = 3;

/// Fields that participate in the content hash
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparableFields<'a> {
    pub name: &'a str,
    pub brewery_name: &'a str,
    pub sweetness: f64,
    pub richness: f64,
    pub flavors: FlavorProfile,
}

impl<'a> From<&'a CandidateRecord> for ComparableFields<'a> {
    fn from(record: &'a CandidateRecord) -> Self {
        Self {
            name: &record.name,
            brewery_name: &record.brewery_name,
            sweetness: record.sweetness,
            richness: record.richness,
            flavors: record.flavors,
        }
    }
}

impl<'a> From<&'a MasterRecord> for ComparableFields<'a> {
    fn from(record: &'a MasterRecord) -> Self {
        Self {
            name: &record.name,
            brewery_name: &record.brewery_name,
            sweetness: record.sweetness,
            richness: record.richness,
            flavors: record.flavors,
        }
    }
}

/// Round to three decimals and render with exactly three decimals
///
/// `-0.000` is rendered as `0.000`.
fn canonical_number(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.*}", HASH_DECIMALS, rounded)
}

/// Canonical pre-hash representation
pub fn canonical_form(fields: &ComparableFields<'_>) -> String {
    let mut values = vec![
        serde_json::Value::String(fields.name.to_string()),
        serde_json::Value::String(fields.brewery_name.to_string()),
        serde_json::Value::String(canonical_number(fields.sweetness)),
        serde_json::Value::String(canonical_number(fields.richness)),
    ];
    values.extend(
        fields
            .flavors
            .as_array()
            .iter()
            .map(|f| serde_json::Value::String(canonical_number(*f))),
    );

    serde_json::Value::Array(values).to_string()
}

/// Hex-encoded SHA-256 of the canonical form
pub fn content_hash<'a>(fields: impl Into<ComparableFields<'a>>) -> String {
    let canonical = canonical_form(&fields.into());
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}
