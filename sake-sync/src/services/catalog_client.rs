//! Catalog provider client
//!
//! The provider exposes three read-only collections over HTTP. Each call is
//! treated as an immutable snapshot; nothing is cached between runs.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::FetchError;
use crate::models::{
    BrandEntry, BrandsResponse, BreweriesResponse, BreweryEntry, FlavorChartEntry,
    FlavorChartsResponse,
};

/// Public endpoint of the sake catalog provider
pub const DEFAULT_SOURCE_URL: &str = "https://muro.sakenowa.com/sakenowa-data/api";

/// Default per-request timeout
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("sake-sync/", env!("CARGO_PKG_VERSION"));

pub const BRANDS_ENDPOINT: &str = "brands";
pub const BREWERIES_ENDPOINT: &str = "breweries";
pub const FLAVOR_CHARTS_ENDPOINT: &str = "flavor-charts";

/// Read-only access to the three catalog collections
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_brands(&self) -> Result<Vec<BrandEntry>, FetchError>;

    async fn fetch_breweries(&self) -> Result<Vec<BreweryEntry>, FetchError>;

    async fn fetch_flavor_charts(&self) -> Result<Vec<FlavorChartEntry>, FetchError>;
}

/// HTTP implementation of [`CatalogSource`]
pub struct HttpCatalogSource {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogSource {
    /// Create a client; every request is bounded by `timeout`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network {
                endpoint: "client".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, FetchError> {
        let url = self.endpoint_url(endpoint);
        tracing::debug!(endpoint = %endpoint, url = %url, "Fetching catalog collection");

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    endpoint: endpoint.to_string(),
                }
            } else {
                FetchError::Network {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    endpoint: endpoint.to_string(),
                }
            } else {
                FetchError::Network {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        serde_json::from_slice(&bytes).map_err(|e| FetchError::Parse {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_brands(&self) -> Result<Vec<BrandEntry>, FetchError> {
        let response: BrandsResponse = self.get_json(BRANDS_ENDPOINT).await?;
        tracing::info!(count = response.brands.len(), "Fetched brands");
        Ok(response.brands)
    }

    async fn fetch_breweries(&self) -> Result<Vec<BreweryEntry>, FetchError> {
        let response: BreweriesResponse = self.get_json(BREWERIES_ENDPOINT).await?;
        tracing::info!(count = response.breweries.len(), "Fetched breweries");
        Ok(response.breweries)
    }

    async fn fetch_flavor_charts(&self) -> Result<Vec<FlavorChartEntry>, FetchError> {
        let response: FlavorChartsResponse = self.get_json(FLAVOR_CHARTS_ENDPOINT).await?;
        tracing::info!(count = response.flavor_charts.len(), "Fetched flavor charts");
        Ok(response.flavor_charts)
    }
}
