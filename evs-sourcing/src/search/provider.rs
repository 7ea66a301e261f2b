//! Uniform provider capability
//!
//! Every media source implements [`Provider`]. Provider-specific quirks
//! (license strings, pagination, auth, rate limits) stay inside the
//! implementation; the search adapter never branches on provider identity.

use crate::utils::Transient;
use async_trait::async_trait;
use evs_common::documents::MediaType;
use evs_common::License;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Provider-native search result, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    /// Provider-local identifier
    pub native_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Provider tags/keywords, if any
    #[serde(default)]
    pub tags: Vec<String>,
    pub media_type: MediaType,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub duration_sec: Option<f64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// License exactly as the provider reports it
    #[serde(default)]
    pub license_raw: String,
    #[serde(default)]
    pub license_url: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
}

/// Provider call errors
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Missing credentials for {0}")]
    MissingCredentials(&'static str),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Transient for ProviderError {
    /// Network failures, timeouts, 429 and 5xx are worth retrying
    fn is_transient(&self) -> bool {
        match self {
            ProviderError::Network(_) | ProviderError::Timeout(_) | ProviderError::RateLimited => {
                true
            }
            ProviderError::Api(status, _) => *status >= 500,
            ProviderError::MissingCredentials(_) | ProviderError::Parse(_) => false,
        }
    }
}

/// A media search provider
///
/// # Example
/// ```rust,ignore
/// struct ArchiveProvider { client: reqwest::Client }
///
/// #[async_trait]
/// impl Provider for ArchiveProvider {
///     fn name(&self) -> &'static str { "archive" }
///     async fn query(&self, text: &str, max_results: usize)
///         -> Result<Vec<RawResult>, ProviderError> { /* HTTP call + parse */ }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable provider name, used as the `source_id` prefix
    fn name(&self) -> &'static str;

    /// Whether required credentials are present
    ///
    /// Unconfigured providers are skipped for the whole run.
    fn is_configured(&self) -> bool {
        true
    }

    /// Run one search
    async fn query(&self, text: &str, max_results: usize) -> Result<Vec<RawResult>, ProviderError>;

    /// Normalize this provider's license string
    fn license_for(&self, raw: &RawResult) -> License {
        License::from_native(&raw.license_raw)
    }
}
