//! Pexels provider
//!
//! Stock video (default) or photo search. Requires an API key sent in the
//! `Authorization` header. Everything Pexels serves is under its own license.
//!
//! API Documentation: https://www.pexels.com/api/documentation/

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

const PEXELS_VIDEO_URL: &str = "https://api.pexels.com/videos/search";
const PEXELS_PHOTO_URL: &str = "https://api.pexels.com/v1/search";
const PEXELS_LICENSE_URL: &str = "https://www.pexels.com/license/";

#[derive(Debug, Deserialize)]
struct VideoResponse {
    #[serde(default)]
    videos: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    id: u64,
    width: Option<u32>,
    height: Option<u32>,
    /// Landing page; the slug is the only title Pexels gives
    url: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    video_files: Vec<VideoFile>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    link: String,
    #[serde(default)]
    width: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct User {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PhotoResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    id: u64,
    width: Option<u32>,
    height: Option<u32>,
    url: String,
    #[serde(default)]
    alt: Option<String>,
    #[serde(default)]
    photographer: Option<String>,
    src: PhotoSources,
}

#[derive(Debug, Deserialize)]
struct PhotoSources {
    original: String,
    #[serde(default)]
    medium: Option<String>,
}

/// Derive a readable title from a Pexels landing URL slug
///
/// `https://www.pexels.com/video/old-stone-wall-854123/` → "old stone wall"
fn title_from_url(url: &str) -> String {
    let slug = url.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    let words: Vec<&str> = slug
        .split('-')
        .filter(|w| !w.is_empty() && !w.chars().all(|c| c.is_ascii_digit()))
        .collect();
    words.join(" ")
}

/// Pexels client
pub struct PexelsProvider {
    client: Client,
    api_key: Option<String>,
    videos: bool,
    timeout: Duration,
    rate_limiter: DirectRateLimiter,
}

impl PexelsProvider {
    pub fn new(
        api_key: Option<String>,
        videos: bool,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            api_key: api_key.filter(|k| is_valid_key(k)),
            videos,
            timeout,
            rate_limiter: http::rate_limiter(2),
        })
    }

    pub fn parse_videos(body: &str) -> Result<Vec<RawResult>, ProviderError> {
        let response: VideoResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(response
            .videos
            .into_iter()
            .filter_map(|v| {
                // Widest rendition
                let file = v
                    .video_files
                    .iter()
                    .max_by_key(|f| f.width.unwrap_or(0))?;
                Some(RawResult {
                    native_id: v.id.to_string(),
                    title: title_from_url(&v.url),
                    description: String::new(),
                    tags: vec![],
                    media_type: MediaType::Video,
                    url: file.link.clone(),
                    thumbnail_url: v.image.unwrap_or_default(),
                    duration_sec: v.duration,
                    width: v.width,
                    height: v.height,
                    license_raw: "pexels".to_string(),
                    license_url: Some(PEXELS_LICENSE_URL.to_string()),
                    creator: v.user.map(|u| u.name),
                })
            })
            .collect())
    }

    pub fn parse_photos(body: &str) -> Result<Vec<RawResult>, ProviderError> {
        let response: PhotoResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(response
            .photos
            .into_iter()
            .map(|p| {
                let slug_title = title_from_url(&p.url);
                RawResult {
                    native_id: p.id.to_string(),
                    title: p.alt.clone().filter(|a| !a.trim().is_empty()).unwrap_or(slug_title),
                    description: p.alt.unwrap_or_default(),
                    tags: vec![],
                    media_type: MediaType::Image,
                    thumbnail_url: p.src.medium.unwrap_or_else(|| p.src.original.clone()),
                    url: p.src.original,
                    duration_sec: None,
                    width: p.width,
                    height: p.height,
                    license_raw: "pexels".to_string(),
                    license_url: Some(PEXELS_LICENSE_URL.to_string()),
                    creator: p.photographer,
                }
            })
            .collect())
    }
}

#[async_trait]
impl Provider for PexelsProvider {
    fn name(&self) -> &'static str {
        "pexels"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn query(&self, text: &str, max_results: usize) -> Result<Vec<RawResult>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials("pexels"))?;

        self.rate_limiter.until_ready().await;

        let per_page = max_results.clamp(1, 80).to_string();
        let url = if self.videos { PEXELS_VIDEO_URL } else { PEXELS_PHOTO_URL };
        debug!(query = %text, videos = self.videos, "Querying Pexels");

        let response = self
            .client
            .get(url)
            .header("Authorization", api_key)
            .query(&[("query", text), ("per_page", per_page.as_str())])
            .send()
            .await
            .map_err(|e| http::map_send_error(e, self.timeout))?;

        let response = http::check_status(response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if self.videos {
            Self::parse_videos(&body)
        } else {
            Self::parse_photos(&body)
        }
    }

    fn license_for(&self, _raw: &RawResult) -> License {
        License::ProviderStock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_from_url() {
        assert_eq!(
            title_from_url("https://www.pexels.com/video/old-stone-wall-854123/"),
            "old stone wall"
        );
        assert_eq!(title_from_url("https://www.pexels.com/photo/2014422/"), "");
    }

    #[test]
    fn test_parse_videos_picks_widest_file() {
        let body = r#"{"page": 1, "per_page": 15, "total_results": 1, "videos": [
            {"id": 854123, "width": 1920, "height": 1080, "duration": 14,
             "url": "https://www.pexels.com/video/candle-flame-in-the-dark-854123/",
             "image": "https://images.pexels.com/videos/854123/thumb.jpeg",
             "user": {"id": 1, "name": "Pat Lee", "url": "https://www.pexels.com/@pat"},
             "video_files": [
                {"id": 1, "quality": "sd", "file_type": "video/mp4", "width": 640, "height": 360,
                 "link": "https://player.vimeo.com/sd.mp4"},
                {"id": 2, "quality": "hd", "file_type": "video/mp4", "width": 1920, "height": 1080,
                 "link": "https://player.vimeo.com/hd.mp4"}
             ]},
            {"id": 1, "width": 10, "height": 10, "url": "https://www.pexels.com/video/x-1/",
             "video_files": []}
        ]}"#;

        let results = PexelsProvider::parse_videos(body).unwrap();
        assert_eq!(results.len(), 1);
        let clip = &results[0];
        assert_eq!(clip.title, "candle flame in the dark");
        assert_eq!(clip.url, "https://player.vimeo.com/hd.mp4");
        assert_eq!(clip.duration_sec, Some(14.0));
        assert_eq!(clip.creator.as_deref(), Some("Pat Lee"));
    }

    #[test]
    fn test_parse_photos_uses_alt_text() {
        let body = r#"{"photos": [
            {"id": 2014422, "width": 3024, "height": 3024,
             "url": "https://www.pexels.com/photo/brown-rocks-2014422/",
             "photographer": "Joey Farina", "alt": "Brown rocks during golden hour",
             "src": {"original": "https://images.pexels.com/2014422.jpeg",
                     "medium": "https://images.pexels.com/2014422-m.jpeg"}}
        ]}"#;

        let results = PexelsProvider::parse_photos(body).unwrap();
        assert_eq!(results[0].title, "Brown rocks during golden hour");
        assert_eq!(results[0].media_type, MediaType::Image);
        assert_eq!(results[0].thumbnail_url, "https://images.pexels.com/2014422-m.jpeg");
    }

    #[tokio::test]
    async fn test_missing_key_is_unconfigured() {
        let provider = PexelsProvider::new(None, true, Duration::from_secs(5)).unwrap();
        assert!(!provider.is_configured());
        let err = provider.query("anything", 5).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials("pexels")));
    }

    #[test]
    fn test_license_is_provider_stock() {
        let provider = PexelsProvider::new(Some("k".into()), true, Duration::from_secs(5)).unwrap();
        let body = r#"{"photos": [{"id": 1, "width": 1, "height": 1, "url": "u",
            "src": {"original": "o"}}]}"#;
        let results = PexelsProvider::parse_photos(body).unwrap();
        assert_eq!(provider.license_for(&results[0]), License::ProviderStock);
    }
}
