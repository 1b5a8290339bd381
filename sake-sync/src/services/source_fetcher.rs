//! Source data fetcher
//!
//! Pulls brands, breweries and flavor charts concurrently, validates them at
//! the boundary and joins them into [`CandidateRecord`]s. A brand joins only
//! when both its brewery and its flavor chart are present.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::models::{
    BrandEntry, BreweryEntry, CandidateRecord, CatalogSnapshot, FlavorChartEntry, FlavorProfile,
};
use crate::services::catalog_client::{CatalogSource, FLAVOR_CHARTS_ENDPOINT};
use crate::services::coordinate_mapper::{flavor_vector, map_coordinates};

/// Counters describing one fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    pub brands: usize,
    pub breweries: usize,
    pub flavor_charts: usize,
    /// Brand entries dropped because an earlier entry had the same id
    pub duplicate_brands: usize,
    pub missing_brewery: usize,
    pub missing_flavor_chart: usize,
    pub candidates: usize,
}

impl FetchStats {
    /// Brands excluded from the join
    pub fn excluded(&self) -> usize {
        self.missing_brewery + self.missing_flavor_chart
    }
}

/// Fetches the catalog and builds this run's candidate set
pub struct SourceDataFetcher<S: CatalogSource> {
    source: S,
}

impl<S: CatalogSource> SourceDataFetcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch all three collections and join them
    ///
    /// Any failed request or invalid payload aborts the whole fetch.
    pub async fn fetch(&self) -> Result<(Vec<CandidateRecord>, FetchStats), FetchError> {
        let (brands, breweries, flavor_charts) = tokio::try_join!(
            self.source.fetch_brands(),
            self.source.fetch_breweries(),
            self.source.fetch_flavor_charts(),
        )?;

        build_candidates(CatalogSnapshot {
            brands,
            breweries,
            flavor_charts,
        })
    }
}

fn validate_flavor_chart(chart: &FlavorChartEntry) -> Result<(), FetchError> {
    let profile = FlavorProfile::from(chart);
    for (field, value) in profile.named() {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(FetchError::Schema {
                endpoint: FLAVOR_CHARTS_ENDPOINT.to_string(),
                message: format!(
                    "brand {} has {} = {} (expected a value in [0, 1])",
                    chart.brand_id, field, value
                ),
            });
        }
    }
    Ok(())
}

/// Join a fetched snapshot into candidate records
///
/// Candidates keep the order of the brand catalog.
pub fn build_candidates(
    snapshot: CatalogSnapshot,
) -> Result<(Vec<CandidateRecord>, FetchStats), FetchError> {
    let mut stats = FetchStats {
        brands: snapshot.brands.len(),
        breweries: snapshot.breweries.len(),
        flavor_charts: snapshot.flavor_charts.len(),
        ..Default::default()
    };

    for chart in &snapshot.flavor_charts {
        validate_flavor_chart(chart)?;
    }

    let mut breweries: HashMap<i64, BreweryEntry> = HashMap::new();
    for brewery in snapshot.breweries {
        breweries.entry(brewery.id).or_insert(brewery);
    }

    let mut charts: HashMap<i64, FlavorChartEntry> = HashMap::new();
    for chart in snapshot.flavor_charts {
        charts.entry(chart.brand_id).or_insert(chart);
    }

    let mut seen_brands: HashSet<i64> = HashSet::new();
    let mut brands: Vec<BrandEntry> = Vec::with_capacity(snapshot.brands.len());
    for brand in snapshot.brands {
        if !seen_brands.insert(brand.id) {
            warn!(
                brand_id = brand.id,
                name = %brand.name,
                "Duplicate brand id, keeping first entry"
            );
            stats.duplicate_brands += 1;
            continue;
        }
        brands.push(brand);
    }

    let mut candidates = Vec::with_capacity(brands.len());
    for brand in brands {
        let Some(brewery) = breweries.get(&brand.brewery_id) else {
            debug!(brand_id = brand.id, brewery_id = brand.brewery_id, "Brewery not found");
            stats.missing_brewery += 1;
            continue;
        };
        let Some(chart) = charts.get(&brand.id) else {
            debug!(brand_id = brand.id, "Flavor chart not found");
            stats.missing_flavor_chart += 1;
            continue;
        };

        let flavors = FlavorProfile::from(chart);
        let coordinates = map_coordinates(&flavors);

        candidates.push(CandidateRecord {
            brand_id: brand.id,
            name: brand.name,
            brewery_id: brewery.id,
            brewery_name: brewery.name.clone(),
            sweetness: coordinates.sweetness,
            richness: coordinates.richness,
            flavors,
            flavor_vector: flavor_vector(&flavors, coordinates),
        });
    }

    stats.candidates = candidates.len();

    if stats.excluded() > 0 {
        info!(
            missing_brewery = stats.missing_brewery,
            missing_flavor_chart = stats.missing_flavor_chart,
            "Excluded {} brands without a complete join",
            stats.excluded()
        );
    }
    if candidates.is_empty() {
        warn!("Catalog join produced no candidates");
    } else {
        info!(candidates = stats.candidates, "Built candidate records");
    }

    Ok((candidates, stats))
}
