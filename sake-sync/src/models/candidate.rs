//! Candidate records (one per joined brand, rebuilt every run)

use serde::{Deserialize, Serialize};

use crate::models::FlavorChartEntry;

/// Length of the normalized flavor vector (six axes plus two coordinates)
pub const FLAVOR_VECTOR_LEN: usize = 8;

/// The six raw flavor scalars
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlavorProfile {
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
    pub f4: f64,
    pub f5: f64,
    pub f6: f64,
}

impl FlavorProfile {
    pub fn new(f1: f64, f2: f64, f3: f64, f4: f64, f5: f64, f6: f64) -> Self {
        Self { f1, f2, f3, f4, f5, f6 }
    }

    /// Values in axis order f1..f6
    pub fn as_array(&self) -> [f64; 6] {
        [self.f1, self.f2, self.f3, self.f4, self.f5, self.f6]
    }

    /// Field names paired with values, in axis order
    pub fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("f1", self.f1),
            ("f2", self.f2),
            ("f3", self.f3),
            ("f4", self.f4),
            ("f5", self.f5),
            ("f6", self.f6),
        ]
    }
}

impl From<&FlavorChartEntry> for FlavorProfile {
    fn from(chart: &FlavorChartEntry) -> Self {
        Self::new(chart.f1, chart.f2, chart.f3, chart.f4, chart.f5, chart.f6)
    }
}

/// A joined brand/brewery/flavor triple ready for change detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Identity key (provider brand id)
    pub brand_id: i64,
    /// Display name
    pub name: String,
    pub brewery_id: i64,
    pub brewery_name: String,
    /// Derived coordinate in [-3, 3]
    pub sweetness: f64,
    /// Derived coordinate in [-3, 3]
    pub richness: f64,
    pub flavors: FlavorProfile,
    /// f1..f6 followed by sweetness/3 and richness/3
    pub flavor_vector: [f64; FLAVOR_VECTOR_LEN],
}
