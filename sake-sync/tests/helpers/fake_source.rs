//! In-process catalog source with mutable contents

use async_trait::async_trait;
use sake_sync::error::FetchError;
use sake_sync::models::{BrandEntry, BreweryEntry, CatalogSnapshot, FlavorChartEntry};
use sake_sync::services::CatalogSource;
use std::sync::{Arc, Mutex};

/// Catalog source serving a snapshot the test can replace between runs
#[derive(Clone, Default)]
pub struct FakeCatalogSource {
    snapshot: Arc<Mutex<CatalogSnapshot>>,
    timeout_endpoint: Arc<Mutex<Option<String>>>,
}

impl FakeCatalogSource {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        let source = Self::default();
        source.set(snapshot);
        source
    }

    pub fn set(&self, snapshot: CatalogSnapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    /// Make every request to `endpoint` time out
    pub fn time_out(&self, endpoint: &str) {
        *self.timeout_endpoint.lock().unwrap() = Some(endpoint.to_string());
    }

    fn check(&self, endpoint: &str) -> Result<(), FetchError> {
        match self.timeout_endpoint.lock().unwrap().as_deref() {
            Some(e) if e == endpoint => Err(FetchError::Timeout {
                endpoint: endpoint.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogSource for FakeCatalogSource {
    async fn fetch_brands(&self) -> Result<Vec<BrandEntry>, FetchError> {
        self.check("brands")?;
        Ok(self.snapshot.lock().unwrap().brands.clone())
    }

    async fn fetch_breweries(&self) -> Result<Vec<BreweryEntry>, FetchError> {
        self.check("breweries")?;
        Ok(self.snapshot.lock().unwrap().breweries.clone())
    }

    async fn fetch_flavor_charts(&self) -> Result<Vec<FlavorChartEntry>, FetchError> {
        self.check("flavor-charts")?;
        Ok(self.snapshot.lock().unwrap().flavor_charts.clone())
    }
}

pub fn brand(id: i64, name: &str, brewery_id: i64) -> BrandEntry {
    BrandEntry {
        id,
        name: name.to_string(),
        brewery_id,
    }
}

pub fn brewery(id: i64, name: &str) -> BreweryEntry {
    BreweryEntry {
        id,
        name: name.to_string(),
        area_id: Some(35),
    }
}

pub fn chart(brand_id: i64, f: [f64; 6]) -> FlavorChartEntry {
    FlavorChartEntry {
        brand_id,
        f1: f[0],
        f2: f[1],
        f3: f[2],
        f4: f[3],
        f5: f[4],
        f6: f[5],
    }
}
