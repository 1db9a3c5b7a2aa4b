//! HTTP client for the Customer Care API.
//!
//! Wraps a `reqwest::Client` configured with the request timeout and the
//! session's bearer token, and exposes one method per endpoint.

use super::error::ApiError;
use crate::access::Session;
use crate::config::ApiConfig;
use crate::models::{SitesResponse, StatsResponse, TableInfo};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Client for the dashboard endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http_client: reqwest::Client,
}

impl ApiClient {
    /// Create a client. The session token, if any, is sent on every request.
    pub fn new(mut config: ApiConfig, session: Option<&Session>) -> Result<Self, ApiError> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        if let Some(token) = session.and_then(|s| s.token.as_deref()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::Client(format!("invalid token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// `GET /api/tables`
    pub async fn fetch_tables(&self) -> Result<Vec<TableInfo>, ApiError> {
        self.get_json(&self.config.tables_path).await
    }

    /// `GET /api/sites`
    pub async fn fetch_sites(&self) -> Result<SitesResponse, ApiError> {
        self.get_json(&self.config.sites_path).await
    }

    /// `GET` the summary statistics endpoint.
    pub async fn fetch_stats(&self) -> Result<StatsResponse, ApiError> {
        self.get_json(&self.config.stats_path).await
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.config.base_url, path)
        } else {
            format!("{}/{}", self.config.base_url, path)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url_for(path);
        let seconds = self.config.timeout_seconds;
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&url, seconds, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { url, status, body });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::from_reqwest(&url, seconds, e))
    }
}
