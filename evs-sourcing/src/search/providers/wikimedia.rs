//! Wikimedia Commons provider
//!
//! Searches the File namespace through the MediaWiki action API and reads the
//! license from `extmetadata.LicenseShortName`. No credentials required.
//!
//! API Documentation: https://www.mediawiki.org/wiki/API:Imageinfo

use super::http::{self, DirectRateLimiter};
use crate::search::provider::{Provider, ProviderError, RawResult};
use async_trait::async_trait;
use evs_common::documents::MediaType;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const WIKIMEDIA_API_URL: &str = "https://commons.wikimedia.org/w/api.php";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: Option<ApiQuery>,
}

#[derive(Debug, Deserialize)]
struct ApiQuery {
    #[serde(default)]
    pages: Vec<ApiPage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    pageid: u64,
    title: String,
    /// Search rank (1-based)
    #[serde(default)]
    index: u32,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    url: String,
    #[serde(default)]
    thumburl: Option<String>,
    #[serde(default)]
    descriptionurl: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    mime: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    extmetadata: HashMap<String, MetadataValue>,
}

#[derive(Debug, Deserialize)]
struct MetadataValue {
    #[serde(default)]
    value: serde_json::Value,
}

impl ImageInfo {
    fn meta(&self, key: &str) -> Option<String> {
        let value = self.extmetadata.get(key)?;
        let text = match &value.value {
            serde_json::Value::String(s) => http::strip_html(s),
            serde_json::Value::Null => return None,
            other => other.to_string(),
        };
        (!text.is_empty()).then_some(text)
    }
}

/// Wikimedia Commons client
pub struct WikimediaProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
    rate_limiter: DirectRateLimiter,
}

impl WikimediaProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: WIKIMEDIA_API_URL.to_string(),
            timeout,
            rate_limiter: http::rate_limiter(5),
        })
    }

    /// Parse an action API response into results, in search rank order
    ///
    /// Pages that are not images or videos (PDF, audio) are skipped.
    pub fn parse_response(body: &str) -> Result<Vec<RawResult>, ProviderError> {
        let response: ApiResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
        let mut pages = response.query.map(|q| q.pages).unwrap_or_default();
        pages.sort_by_key(|p| (p.index, p.pageid));

        let results = pages
            .into_iter()
            .filter_map(|page| {
                let info = page.imageinfo.into_iter().next()?;
                let media_type = if info.mime.starts_with("video/") {
                    MediaType::Video
                } else if info.mime.starts_with("image/") {
                    MediaType::Image
                } else {
                    return None;
                };
                let title = page
                    .title
                    .strip_prefix("File:")
                    .unwrap_or(&page.title)
                    .to_string();

                Some(RawResult {
                    native_id: page.pageid.to_string(),
                    description: info.meta("ImageDescription").unwrap_or_default(),
                    tags: info
                        .meta("Categories")
                        .map(|c| c.split('|').map(str::to_string).collect())
                        .unwrap_or_default(),
                    media_type,
                    url: info.url.clone(),
                    thumbnail_url: info
                        .thumburl
                        .clone()
                        .or_else(|| info.descriptionurl.clone())
                        .unwrap_or_default(),
                    duration_sec: info.duration,
                    width: info.width,
                    height: info.height,
                    license_raw: info.meta("LicenseShortName").unwrap_or_default(),
                    license_url: info.meta("LicenseUrl"),
                    creator: info.meta("Artist"),
                    title,
                })
            })
            .collect();

        Ok(results)
    }
}

#[async_trait]
impl Provider for WikimediaProvider {
    fn name(&self) -> &'static str {
        "wikimedia"
    }

    async fn query(&self, text: &str, max_results: usize) -> Result<Vec<RawResult>, ProviderError> {
        self.rate_limiter.until_ready().await;

        let limit = max_results.clamp(1, 50).to_string();
        debug!(query = %text, "Querying Wikimedia Commons");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("generator", "search"),
                ("gsrsearch", text),
                ("gsrnamespace", "6"),
                ("gsrlimit", limit.as_str()),
                ("prop", "imageinfo"),
                ("iiprop", "url|size|mime|extmetadata"),
                ("iiurlwidth", "320"),
                (
                    "iiextmetadatafilter",
                    "LicenseShortName|LicenseUrl|Artist|ImageDescription|Categories",
                ),
            ])
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
