//! Configuration loading and resolution
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `EVS_CONFIG` environment variable
//! 3. `<config_dir>/evs/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing or unreadable file never stops a run: the loader warns and
//! continues with defaults. A file that exists but fails to parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "EVS_CONFIG";
/// Environment variable holding the Pexels API key
pub const PEXELS_KEY_ENV_VAR: &str = "EVS_PEXELS_API_KEY";
/// Environment variable holding the Pixabay API key
pub const PIXABAY_KEY_ENV_VAR: &str = "EVS_PIXABAY_API_KEY";

/// Root of the TOML configuration file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub search: SearchSettings,
    pub retry: RetrySettings,
    pub director: DirectorSettings,
    pub curator: CuratorSettings,
    pub gate: GateSettings,
    pub providers: ProviderSettings,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[search]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub max_results_per_provider: usize,
    /// Concurrent outbound provider calls
    pub max_concurrency: usize,
    /// Hard timeout per provider call
    pub call_timeout_secs: u64,
    /// Episode-level budget for the whole search phase
    pub search_budget_secs: u64,
    pub cache_enabled: bool,
    pub cache_ttl_hours: u64,
    /// Overrides the platform cache directory
    pub cache_dir: Option<PathBuf>,
    /// Keep `unknown`-license results in a separate side list
    pub allow_unknown_licenses: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results_per_provider: 20,
            max_concurrency: 6,
            call_timeout_secs: 20,
            search_budget_secs: 300,
            cache_enabled: true,
            cache_ttl_hours: 24 * 7,
            cache_dir: None,
            allow_unknown_licenses: false,
        }
    }
}

/// `[retry]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Fraction of each delay randomized (0.0-1.0)
    pub jitter: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
            jitter: 0.2,
        }
    }
}

/// `[director]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorSettings {
    pub max_queries: usize,
    /// Warn when the raw query duplicate rate exceeds this
    pub duplicate_rate_warning: f64,
    /// Warn when one visual type dominates the unique queries beyond this share
    pub dominant_type_warning: f64,
}

impl Default for DirectorSettings {
    fn default() -> Self {
        Self {
            max_queries: 8,
            duplicate_rate_warning: 0.5,
            dominant_type_warning: 0.7,
        }
    }
}

/// `[curator]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuratorSettings {
    pub min_relevance: f64,
    pub min_quality: f64,
}

impl Default for CuratorSettings {
    fn default() -> Self {
        Self {
            min_relevance: 0.2,
            min_quality: 0.3,
        }
    }
}

/// `[gate]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    /// Minimum share of scenes with at least one real asset
    pub min_coverage_ratio: f64,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            min_coverage_ratio: 0.5,
        }
    }
}

/// `[providers]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub wikimedia_enabled: bool,
    pub openverse_enabled: bool,
    pub pexels_api_key: Option<String>,
    pub pixabay_api_key: Option<String>,
    /// Search Pexels videos instead of photos
    pub pexels_videos: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            wikimedia_enabled: true,
            openverse_enabled: true,
            pexels_api_key: None,
            pixabay_api_key: None,
            pexels_videos: true,
        }
    }
}

/// Resolve which config file to read, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    dirs::config_dir().map(|d| d.join("evs").join("config.toml"))
}

/// Load configuration with graceful degradation
///
/// Missing file → warning + defaults. Parse failure → `Error::Config`.
pub fn load_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        warn!("No config file location available, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            path = %path.display(),
            "Config file not found, using compiled defaults"
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Resolve a provider API key: environment variable first, then TOML
///
/// Blank values count as absent. Returns `None` when neither source has a key;
/// the caller disables that provider.
pub fn resolve_api_key(env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_key = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_value.filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            env_var,
            "API key found in both environment and TOML config. Using environment."
        );
    }

    if let Some(key) = env_key {
        info!(env_var, "API key loaded from environment variable");
        return Some(key.trim().to_string());
    }

    toml_key.map(|key| {
        info!(env_var, "API key loaded from TOML config");
        key.trim().to_string()
    })
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Default on-disk search cache directory
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("evs").join("search"))
        .unwrap_or_else(|| PathBuf::from("./evs_cache/search"))
}

impl TomlConfig {
    /// Effective cache directory (configured or platform default)
    pub fn cache_dir(&self) -> PathBuf {
        self.search
            .cache_dir
            .clone()
            .unwrap_or_else(default_cache_dir)
    }
}
