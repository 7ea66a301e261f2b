//! In-process providers standing in for the network

use super::fixtures::raw_result;
use async_trait::async_trait;
use evs_common::text::normalize_query;
use evs_sourcing::search::{Provider, ProviderError, RawResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Answers from a fixed query → results table; unknown queries get nothing
pub struct CatalogProvider {
    name: &'static str,
    catalog: HashMap<String, Vec<RawResult>>,
    calls: AtomicUsize,
}

impl CatalogProvider {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            catalog: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, query: &str, results: Vec<RawResult>) -> Self {
        self.catalog
            .entry(normalize_query(query))
            .or_default()
            .extend(results);
        self
    }

    /// Number of `query` calls that reached this provider
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Total results across every query in the table
    pub fn result_count(&self) -> usize {
        self.catalog.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl Provider for CatalogProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn query(&self, text: &str, max_results: usize) -> Result<Vec<RawResult>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut results = self
            .catalog
            .get(&normalize_query(text))
            .cloned()
            .unwrap_or_default();
        results.truncate(max_results);
        Ok(results)
    }
}

/// Fails every call with the same error
pub struct FailingProvider {
    name: &'static str,
    error: ProviderError,
    calls: AtomicUsize,
}

impl FailingProvider {
    pub fn new(name: &'static str, error: ProviderError) -> Self {
        Self {
            name,
            error,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn query(
        &self,
        _text: &str,
        _max_results: usize,
    ) -> Result<Vec<RawResult>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

/// Fails with a network error for the first `failures` calls, then answers
pub struct FlakyProvider {
    name: &'static str,
    failures: usize,
    results: Vec<RawResult>,
    calls: AtomicUsize,
}

impl FlakyProvider {
    pub fn new(name: &'static str, failures: usize, results: Vec<RawResult>) -> Self {
        Self {
            name,
            failures,
            results,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for FlakyProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn query(
        &self,
        _text: &str,
        _max_results: usize,
    ) -> Result<Vec<RawResult>, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(ProviderError::Network("connection reset by peer".to_string()));
        }
        Ok(self.results.clone())
    }
}

/// Queries of [`super::napoleon_plan`], normalized
pub const NAPOLEON_QUERIES: [&str; 6] = [
    "portrait of napoleon",
    "portrait of josephine",
    "map of europe 1805",
    "map of russia campaign",
    "treaty of tilsit",
    "napoleonic code manuscript",
];

/// Queries for which `gamma` also returns a non-commercial result
const OFF_LICENSE_QUERIES: [&str; 3] = [
    "portrait of napoleon",
    "map of europe 1805",
    "treaty of tilsit",
];

/// Native id `gamma` returns for every query
pub const SHARED_NATIVE_ID: &str = "napoleon-engraving";

fn slug(query: &str) -> String {
    query.replace(' ', "-")
}

/// Three providers answering the napoleon plan with 33 raw results
///
/// - `alpha`: two CC0 results per query (12)
/// - `beta`: two CC BY results per query (12)
/// - `gamma`: the same public-domain engraving for every query (6, five of
///   them duplicates by `source_id`) plus a CC BY-NC result for three
///   queries (3)
pub fn napoleon_providers() -> (Arc<CatalogProvider>, Arc<CatalogProvider>, Arc<CatalogProvider>) {
    let mut alpha = CatalogProvider::new("alpha");
    let mut beta = CatalogProvider::new("beta");
    let mut gamma = CatalogProvider::new("gamma");

    for query in NAPOLEON_QUERIES {
        let s = slug(query);
        alpha = alpha.with(
            query,
            (1..=2)
                .map(|i| {
                    let id = format!("{}-a{}", s, i);
                    raw_result(&id, &format!("{} alpha {}", query, i), query, "cc0")
                })
                .collect(),
        );
        beta = beta.with(
            query,
            (1..=2)
                .map(|i| {
                    let id = format!("{}-b{}", s, i);
                    raw_result(&id, &format!("{} beta {}", query, i), query, "by")
                })
                .collect(),
        );

        let mut gamma_results = vec![raw_result(
            SHARED_NATIVE_ID,
            "Napoleon engraving collection",
            query,
            "pd",
        )];
        if OFF_LICENSE_QUERIES.contains(&query) {
            gamma_results.push(raw_result(
                &format!("{}-nc", s),
                &format!("{} gamma", query),
                query,
                "by-nc",
            ));
        }
        gamma = gamma.with(query, gamma_results);
    }

    (Arc::new(alpha), Arc::new(beta), Arc::new(gamma))
}
