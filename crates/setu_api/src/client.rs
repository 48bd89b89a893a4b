use crate::types::{SetuItem, SetuQuery, SetuResponse};
use anyhow::{Context, Result};
use setu_core::config::ApiConfig;
use std::time::Duration;

/// Thin client over `POST /setu/v2`.
///
/// Every failure mode collapses to `None`: the caller only needs to know
/// whether there is something to download.
#[derive(Debug, Clone)]
pub struct SetuClient {
    endpoint: String,
    client: reqwest::Client,
}

impl SetuClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }

    pub fn from_config(cfg: &ApiConfig) -> Result<Self> {
        Self::new(&cfg.base_url, Duration::from_secs(cfg.timeout_secs))
    }

    /// Issue one request. No retry.
    pub async fn fetch(&self, query: &SetuQuery) -> Option<Vec<SetuItem>> {
        let response = match self.client.post(&self.endpoint).json(query).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!("HTTP request to {} failed: {}", self.endpoint, e);
                return None;
            }
        };

        let body: SetuResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to decode API response: {}", e);
                return None;
            }
        };

        if let Some(error) = body.error.filter(|e| !e.is_empty()) {
            tracing::warn!("API error: {}", error);
            return None;
        }

        match body.data {
            Some(items) => {
                tracing::debug!("API returned {} item(s)", items.len());
                Some(items)
            }
            None => {
                tracing::warn!("API response carried no data list");
                None
            }
        }
    }
}
