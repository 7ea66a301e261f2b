//! Openverse provider
//!
//! Anonymous image search. Licenses arrive as short codes ("by-sa", "pdm")
//! which map directly onto the common vocabulary.
//!
//! API Documentation: https://api.openverse.org/v1/

use super::http::{self, DirectRateLimiter};
use crate::search::provider::{Provider, ProviderError, RawResult};
use async_trait::async_trait;
use evs_common::documents::MediaType;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const OPENVERSE_API_URL: &str = "https://api.openverse.org/v1/images/";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ImageResult>,
}

#[derive(Debug, Deserialize)]
struct ImageResult {
    id: String,
    #[serde(default)]
    title: Option<String>,
    url: String,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    creator: Option<String>,
    #[serde(default)]
    license: String,
    #[serde(default)]
    license_url: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// Openverse client
pub struct OpenverseProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
    rate_limiter: DirectRateLimiter,
}

impl OpenverseProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: OPENVERSE_API_URL.to_string(),
            timeout,
            // Anonymous quota is small
            rate_limiter: http::rate_limiter(1),
        })
    }

    pub fn parse_response(body: &str) -> Result<Vec<RawResult>, ProviderError> {
        let response: SearchResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(response
            .results
            .into_iter()
            .map(|r| RawResult {
                title: r.title.unwrap_or_default(),
                description: String::new(),
                tags: r.tags.into_iter().map(|t| t.name).collect(),
                media_type: MediaType::Image,
                thumbnail_url: r.thumbnail.unwrap_or_else(|| r.url.clone()),
                url: r.url,
                duration_sec: None,
                width: r.width,
                height: r.height,
                license_raw: r.license,
                license_url: r.license_url,
                creator: r.creator,
                native_id: r.id,
            })
            .collect())
    }
}

#[async_trait]
impl Provider for OpenverseProvider {
    fn name(&self) -> &'static str {
        "openverse"
    }

    async fn query(&self, text: &str, max_results: usize) -> Result<Vec<RawResult>, ProviderError> {
        self.rate_limiter.until_ready().await;

        let page_size = max_results.clamp(1, 20).to_string();
        debug!(query = %text, "Querying Openverse");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", text), ("page_size", page_size.as_str())])
            .send()
            .await
            .map_err(|e| http::map_send_error(e, self.timeout))?;

        let response = http::check_status(response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Self::parse_response(&body)
    }
}
