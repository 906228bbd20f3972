use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::Config;
use crate::filter::FilterQuery;
use crate::models::{Category, City, JobCountRecord};

// --- Source trait ---

/// Where observations and reference data come from. Shared across the
/// dashboard's worker threads, hence `Sync`.
pub trait JobMarketSource: Send + Sync {
    fn fetch_observations(&self, query: &FilterQuery) -> Result<Vec<JobCountRecord>>;
    fn fetch_categories(&self) -> Result<Vec<Category>>;
    fn fetch_cities(&self) -> Result<Vec<City>>;
}

// --- HTTP source ---

#[derive(Debug)]
pub struct HttpSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: config.api_url.clone(),
            client,
        })
    }

    fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "Stats API request {} failed with status {}: {}",
                endpoint,
                status,
                error_text
            ));
        }

        response
            .json()
            .with_context(|| format!("Failed to parse response from {}", endpoint))
    }
}

impl JobMarketSource for HttpSource {
    fn fetch_observations(&self, query: &FilterQuery) -> Result<Vec<JobCountRecord>> {
        self.get(&query.endpoint())
    }

    fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.get("/api/categories")
    }

    fn fetch_cities(&self) -> Result<Vec<City>> {
        self.get("/api/cities")
    }
}
