//! On-disk search result cache
//!
//! One JSON file per `(provider, normalized query, max_results)` key, named by
//! the SHA-256 of the key. Entries older than the TTL are ignored. Writes go to
//! a unique temporary file that is then renamed over the target, so
//! concurrent writers of the same key race harmlessly (same query ⇒ same
//! content) and readers never observe a partial file.

use super::provider::RawResult;
use chrono::{DateTime, Utc};
use evs_common::text::normalize_query;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    provider: String,
    query: String,
    max_results: usize,
    stored_at: DateTime<Utc>,
    results: Vec<RawResult>,
}

/// Provider result cache with time-to-live
#[derive(Debug, Clone)]
pub struct QueryCache {
    dir: PathBuf,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache key for a provider query
    pub fn key(provider: &str, query: &str, max_results: usize) -> String {
        let mut hasher = Sha256::new();
        hasher.update(provider.as_bytes());
        hasher.update(b"\n");
        hasher.update(normalize_query(query).as_bytes());
        hasher.update(b"\n");
        hasher.update(max_results.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Fresh cached results, or `None` on miss, expiry or unreadable entry
    pub async fn get(
        &self,
        provider: &str,
        query: &str,
        max_results: usize,
    ) -> Option<Vec<RawResult>> {
        let key = Self::key(provider, query, max_results);
        let path = self.entry_path(&key);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(_) => return None,
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable cache entry");
                return None;
            }
        };

        let age = Utc::now().signed_duration_since(entry.stored_at);
        let ttl = chrono::Duration::from_std(self.ttl)
            .unwrap_or_else(|_| chrono::Duration::days(365 * 100));
        if age > ttl {
            debug!(provider, query, "Cache entry expired");
            return None;
        }

        debug!(provider, query, results = entry.results.len(), "Cache hit");
        Some(entry.results)
    }

    /// Store results (atomic replace). Failures are logged, never raised.
    pub async fn put(
        &self,
        provider: &str,
        query: &str,
        max_results: usize,
        results: &[RawResult],
    ) {
        if let Err(e) = self.try_put(provider, query, max_results, results).await {
            warn!(provider, query, error = %e, "Cache write failed");
        }
    }

    async fn try_put(
        &self,
        provider: &str,
        query: &str,
        max_results: usize,
        results: &[RawResult],
    ) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let entry = CacheEntry {
            provider: provider.to_string(),
            query: normalize_query(query),
            max_results,
            stored_at: Utc::now(),
            results: results.to_vec(),
        };
        let json = serde_json::to_vec(&entry)?;

        let key = Self::key(provider, query, max_results);
        let target = self.entry_path(&key);
        let temp = self.dir.join(format!("{}.{}.tmp", key, Uuid::new_v4()));

        tokio::fs::write(&temp, json).await?;
        if let Err(e) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        Ok(())
    }
}
