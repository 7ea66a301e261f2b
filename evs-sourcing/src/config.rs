//! Runtime configuration for evs-sourcing
//!
//! Layers command-line overrides on top of the loaded [`TomlConfig`] and
//! derives the objects the stages take (retry policy, cache, gate).

use crate::gate::CoverageGate;
use crate::search::QueryCache;
use crate::utils::RetryPolicy;
use evs_common::config::TomlConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Command-line overrides (unset fields keep the file/default value)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub max_queries: Option<usize>,
    pub allow_unknown_licenses: bool,
    pub no_cache: bool,
    pub cache_dir: Option<PathBuf>,
    pub min_coverage_ratio: Option<f64>,
}

/// Effective configuration of one run
#[derive(Debug, Clone, PartialEq)]
pub struct SourcingConfig {
    pub toml: TomlConfig,
}

impl SourcingConfig {
    pub fn new(toml: TomlConfig) -> Self {
        Self { toml }
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(max_queries) = overrides.max_queries {
            info!(max_queries, "Query cap overridden from command line");
            self.toml.director.max_queries = max_queries;
        }
        if overrides.allow_unknown_licenses {
            info!("Unknown licenses allowed into the side list");
            self.toml.search.allow_unknown_licenses = true;
        }
        if overrides.no_cache {
            self.toml.search.cache_enabled = false;
        }
        if let Some(dir) = &overrides.cache_dir {
            self.toml.search.cache_dir = Some(dir.clone());
        }
        if let Some(ratio) = overrides.min_coverage_ratio {
            self.toml.gate.min_coverage_ratio = ratio;
        }
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_settings(&self.toml.retry)
    }

    /// Search cache, or `None` when caching is disabled
    pub fn cache(&self) -> Option<QueryCache> {
        if !self.toml.search.cache_enabled {
            return None;
        }
        let ttl = Duration::from_secs(self.toml.search.cache_ttl_hours.saturating_mul(3600));
        Some(QueryCache::new(self.toml.cache_dir(), ttl))
    }

    pub fn coverage_gate(&self) -> CoverageGate {
        CoverageGate::from_settings(&self.toml.gate)
    }
}
