//! Flavor coordinate mapping
//!
//! Converts the six raw flavor scalars into two derived axes:
//! - sweetness from f2 (sweet) against f5 (dry)
//! - richness from f3 (rich) against f6 (light)
//!
//! The arithmetic order is fixed; stored hashes depend on bit-identical output.

use crate::models::{FlavorProfile, FLAVOR_VECTOR_LEN};

/// Bound of both derived axes
pub const COORDINATE_LIMIT: f64 = 3.0;

/// Derived (sweetness, richness) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub sweetness: f64,
    pub richness: f64,
}

/// Map raw flavor scalars to clamped coordinates in [-3, 3]
pub fn map_coordinates(flavors: &FlavorProfile) -> Coordinates {
    let sweetness_raw = flavors.f2 * 2.0 - flavors.f5 * 2.0;
    let sweetness = (sweetness_raw * 3.0).clamp(-COORDINATE_LIMIT, COORDINATE_LIMIT);

    let richness_raw = flavors.f3 * 2.0 - flavors.f6 * 2.0;
    let richness = (richness_raw * 3.0).clamp(-COORDINATE_LIMIT, COORDINATE_LIMIT);

    Coordinates {
        sweetness,
        richness,
    }
}

/// Normalized flavor vector: f1..f6 followed by both coordinates divided by 3
pub fn flavor_vector(
    flavors: &FlavorProfile,
    coordinates: Coordinates,
) -> [f64; FLAVOR_VECTOR_LEN] {
    let [f1, f2, f3, f4, f5, f6] = flavors.as_array();
    [
        f1,
        f2,
        f3,
        f4,
        f5,
        f6,
        coordinates.sweetness / COORDINATE_LIMIT,
        coordinates.richness / COORDINATE_LIMIT,
    ]
}
