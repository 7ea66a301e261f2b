//! Pixabay provider
//!
//! Stock image search. The API key travels as the `key` query parameter.
//!
//! API Documentation: https://pixabay.com/api/docs/

use super::http::{self, DirectRateLimiter};
use crate::search::provider::{Provider, ProviderError, RawResult};
use async_trait::async_trait;
use evs_common::config::is_valid_key;
use evs_common::documents::MediaType;
use evs_common::License;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const PIXABAY_API_URL: &str = "https://pixabay.com/api/";
const PIXABAY_LICENSE_URL: &str = "https://pixabay.com/service/license-summary/";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Hit {
    id: u64,
    #[serde(default)]
    tags: String,
    #[serde(default, rename = "previewURL")]
    preview_url: Option<String>,
    #[serde(default, rename = "webformatURL")]
    webformat_url: Option<String>,
    #[serde(default, rename = "largeImageURL")]
    large_image_url: Option<String>,
    #[serde(default)]
    image_width: Option<u32>,
    #[serde(default)]
    image_height: Option<u32>,
    #[serde(default)]
    user: Option<String>,
}

/// Pixabay client
pub struct PixabayProvider {
    client: Client,
    api_key: Option<String>,
    timeout: Duration,
    rate_limiter: DirectRateLimiter,
}

impl PixabayProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            api_key: api_key.filter(|k| is_valid_key(k)),
            timeout,
            rate_limiter: http::rate_limiter(1),
        })
    }

    pub fn parse_response(body: &str) -> Result<Vec<RawResult>, ProviderError> {
        let response: SearchResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(response
            .hits
            .into_iter()
            .filter_map(|hit| {
                let url = hit.large_image_url.or(hit.webformat_url.clone())?;
                let tags: Vec<String> = hit
                    .tags
                    .split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
                Some(RawResult {
                    native_id: hit.id.to_string(),
                    // Pixabay has no titles; tags are the closest thing
                    title: tags.join(" "),
                    description: String::new(),
                    tags,
                    media_type: MediaType::Image,
                    url,
                    thumbnail_url: hit.preview_url.or(hit.webformat_url).unwrap_or_default(),
                    duration_sec: None,
                    width: hit.image_width,
                    height: hit.image_height,
                    license_raw: "pixabay".to_string(),
                    license_url: Some(PIXABAY_LICENSE_URL.to_string()),
                    creator: hit.user,
                })
            })
            .collect())
    }
}

#[async_trait]
impl Provider for PixabayProvider {
    fn name(&self) -> &'static str {
        "pixabay"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn query(&self, text: &str, max_results: usize) -> Result<Vec<RawResult>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials("pixabay"))?;

        self.rate_limiter.until_ready().await;

        // Pixabay rejects per_page below 3
        let per_page = max_results.clamp(3, 200).to_string();
        debug!(query = %text, "Querying Pixabay");

        let response = self
            .client
            .get(PIXABAY_API_URL)
            .query(&[
                ("key", api_key),
                ("q", text),
                ("per_page", per_page.as_str()),
                ("safesearch", "true"),
            ])
            .send()
            .await
            .map_err(|e| http::map_send_error(e, self.timeout))?;

        let response = http::check_status(response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let mut results = Self::parse_response(&body)?;
        results.truncate(max_results);
        Ok(results)
    }

    fn license_for(&self, _raw: &RawResult) -> License {
        License::ProviderStock
    }
}
