//! Catalog provider payloads
//!
//! Each endpoint returns one JSON object wrapping a single collection keyed by
//! integer identifiers. Field names follow the provider (camelCase).

use serde::{Deserialize, Serialize};

/// One brand from `GET /brands`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandEntry {
    pub id: i64,
    pub name: String,
    pub brewery_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandsResponse {
    pub brands: Vec<BrandEntry>,
}

/// One brewery from `GET /breweries`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreweryEntry {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreweriesResponse {
    pub breweries: Vec<BreweryEntry>,
}

/// One flavor chart from `GET /flavor-charts`
///
/// `f1`..`f6` are the provider's six flavor axes, each in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlavorChartEntry {
    pub brand_id: i64,
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
    pub f4: f64,
    pub f5: f64,
    pub f6: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlavorChartsResponse {
    pub flavor_charts: Vec<FlavorChartEntry>,
}

/// The three collections fetched in one run
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub brands: Vec<BrandEntry>,
    pub breweries: Vec<BreweryEntry>,
    pub flavor_charts: Vec<FlavorChartEntry>,
}
