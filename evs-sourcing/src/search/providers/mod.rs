//! Concrete provider clients and registry construction

pub mod http;
pub mod openverse;
pub mod pexels;
pub mod pixabay;
pub mod wikimedia;

pub use openverse::OpenverseProvider;
pub use pexels::PexelsProvider;
pub use pixabay::PixabayProvider;
pub use wikimedia::WikimediaProvider;

use super::provider::{Provider, ProviderError};
use evs_common::config::{self, TomlConfig, PEXELS_KEY_ENV_VAR, PIXABAY_KEY_ENV_VAR};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the provider registry in fixed registration order
///
/// Registration order is part of the output ordering contract: results for a
/// query are listed provider by provider in this order. Key-based providers
/// are always registered; without a key they report `is_configured() == false`
/// and the adapter skips them.
pub fn build_providers(config: &TomlConfig) -> Result<Vec<Arc<dyn Provider>>, ProviderError> {
    let timeout = Duration::from_secs(config.search.call_timeout_secs.max(1));
    let settings = &config.providers;
    let mut providers: Vec<Arc<dyn Provider>> = Vec::new();

    if settings.wikimedia_enabled {
        providers.push(Arc::new(WikimediaProvider::new(timeout)?));
    }
    if settings.openverse_enabled {
        providers.push(Arc::new(OpenverseProvider::new(timeout)?));
    }

    let pexels_key =
        config::resolve_api_key(PEXELS_KEY_ENV_VAR, settings.pexels_api_key.as_deref());
    providers.push(Arc::new(PexelsProvider::new(
        pexels_key,
        settings.pexels_videos,
        timeout,
    )?));

    let pixabay_key =
        config::resolve_api_key(PIXABAY_KEY_ENV_VAR, settings.pixabay_api_key.as_deref());
    providers.push(Arc::new(PixabayProvider::new(pixabay_key, timeout)?));

    let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
    info!(providers = ?names, "Provider registry built");
    Ok(providers)
}
