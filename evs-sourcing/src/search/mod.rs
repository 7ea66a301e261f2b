//! Multi-Source Search Adapter
//!
//! Runs each strategic query against every configured provider concurrently,
//! normalizes the answers into [`Candidate`]s and applies the license gate.
//!
//! # Behavior
//! - Providers without credentials are skipped for the whole run (logged once
//!   at construction)
//! - Each `(query, provider)` call is wrapped in a hard timeout and retried per
//!   the [`RetryPolicy`] on transient failure; after the final failure that
//!   provider contributes nothing for that query only
//! - Results are cached per `(provider, normalized query)`; hits skip the network
//! - The episode-level budget (and the cancellation token) end the fan-out
//!   early; whatever finished is kept and `budget_exhausted` is set
//! - Output order follows query order, then provider registration order, then
//!   provider rank, regardless of completion order
//!
//! # License gate
//! Only whitelisted licenses reach `results_by_query`. With
//! `allow_unknown_licenses`, `unknown` results go to the separate
//! `unknown_license_candidates` list; `restricted` results are always dropped.

pub mod cache;
pub mod normalizer;
pub mod provider;
pub mod providers;

pub use cache::QueryCache;
pub use normalizer::{KeywordOverlapScorer, RelevanceScorer};
pub use provider::{Provider, ProviderError, RawResult};

use crate::utils::RetryPolicy;
use evs_common::config::SearchSettings;
use evs_common::documents::{Candidate, QueryResults, SearchReport, SearchSummary, StrategicQuery};
use evs_common::License;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of one strategic query across all providers
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySearchOutcome {
    /// Whitelisted candidates, provider registration order then provider rank
    pub results: QueryResults,
    /// `unknown`-license candidates kept by the override
    pub unknown_license: Vec<Candidate>,
    /// Results dropped by the license gate
    pub license_rejected: usize,
    /// Providers whose call failed (after retries) or never finished
    pub providers_failed: Vec<String>,
    /// At least one provider answered
    pub successful: bool,
}

/// Search adapter over a fixed provider registry
pub struct SearchAdapter {
    providers: Vec<Arc<dyn Provider>>,
    skipped: Vec<String>,
    settings: SearchSettings,
    retry: RetryPolicy,
    cache: Option<QueryCache>,
    scorer: Arc<dyn RelevanceScorer>,
    cancel: CancellationToken,
}

impl SearchAdapter {
    /// Create an adapter; unconfigured providers are dropped here
    pub fn new(providers: Vec<Arc<dyn Provider>>, settings: SearchSettings) -> Self {
        let mut active = Vec::with_capacity(providers.len());
        let mut skipped = Vec::new();
        for provider in providers {
            if provider.is_configured() {
                active.push(provider);
            } else {
                warn!(
                    provider = provider.name(),
                    "Provider missing credentials, skipped for this run"
                );
                skipped.push(provider.name().to_string());
            }
        }

        Self {
            providers: active,
            skipped,
            settings,
            retry: RetryPolicy::default(),
            cache: None,
            scorer: Arc::new(KeywordOverlapScorer::default()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn RelevanceScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Token that ends the search phase early when cancelled
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Names of active providers, in registration order
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Providers skipped for missing credentials
    pub fn skipped_providers(&self) -> &[String] {
        &self.skipped
    }

    /// Search one strategic query against every active provider
    pub async fn search(&self, query: &StrategicQuery) -> QuerySearchOutcome {
        let (mut outcomes, _) = self.run(std::slice::from_ref(query)).await;
        outcomes
            .pop()
            .unwrap_or_else(|| self.assemble(query, 0, &mut HashMap::new()))
    }

    /// Search every strategic query and build the episode report
    pub async fn search_episode(&self, queries: &[StrategicQuery]) -> SearchReport {
        let (outcomes, budget_exhausted) = self.run(queries).await;

        let mut summary = SearchSummary {
            queries_total: queries.len(),
            providers_skipped: self.skipped.clone(),
            budget_exhausted,
            ..Default::default()
        };
        let mut results_by_query = Vec::with_capacity(outcomes.len());
        let mut unknown_license_candidates = Vec::new();

        for outcome in outcomes {
            if outcome.successful {
                summary.queries_successful += 1;
            }
            summary.candidates_total += outcome.results.results.len();
            summary.license_rejected += outcome.license_rejected;
            unknown_license_candidates.extend(outcome.unknown_license);
            results_by_query.push(outcome.results);
        }

        info!(
            queries = summary.queries_total,
            successful = summary.queries_successful,
            candidates = summary.candidates_total,
            license_rejected = summary.license_rejected,
            unknown_kept = unknown_license_candidates.len(),
            budget_exhausted,
            "Search phase complete"
        );

        SearchReport {
            results_by_query,
            unknown_license_candidates,
            summary,
        }
    }

    /// Fan out every `(query, provider)` pair; returns one outcome per query
    /// in input order and whether the budget or cancellation cut the run short
    async fn run(&self, queries: &[StrategicQuery]) -> (Vec<QuerySearchOutcome>, bool) {
        let pairs: Vec<(usize, usize)> = (0..queries.len())
            .flat_map(|qi| (0..self.providers.len()).map(move |pi| (qi, pi)))
            .collect();
        let total_calls = pairs.len();

        let deadline = Instant::now() + Duration::from_secs(self.settings.search_budget_secs);
        let concurrency = self.settings.max_concurrency.max(1);

        let calls = stream::iter(pairs)
            .map(|(qi, pi)| async move {
                let provider = &self.providers[pi];
                let result = self.fetch(provider.as_ref(), &queries[qi].query_text).await;
                ((qi, pi), result)
            })
            .buffer_unordered(concurrency);
        let mut calls = std::pin::pin!(calls);

        let mut answers: HashMap<(usize, usize), Result<Vec<RawResult>, ProviderError>> =
            HashMap::with_capacity(total_calls);
        let mut cut_short = false;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!(
                        finished = answers.len(),
                        total_calls,
                        "Search cancelled, keeping finished calls"
                    );
                    cut_short = true;
                    break;
                }
                next = tokio::time::timeout_at(deadline, calls.next()) => match next {
                    Ok(Some((key, result))) => {
                        answers.insert(key, result);
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!(
                            finished = answers.len(),
                            total_calls,
                            budget_secs = self.settings.search_budget_secs,
                            "Search budget exhausted, keeping finished calls"
                        );
                        cut_short = true;
                        break;
                    }
                }
            }
        }

        let outcomes = queries
            .iter()
            .enumerate()
            .map(|(qi, query)| self.assemble(query, qi, &mut answers))
            .collect();
        (outcomes, cut_short)
    }

    /// One provider call: cache, then timeout + retry around the network
    async fn fetch(
        &self,
        provider: &dyn Provider,
        text: &str,
    ) -> Result<Vec<RawResult>, ProviderError> {
        let name = provider.name();
        let max_results = self.settings.max_results_per_provider;

        if let Some(cache) = &self.cache {
            if let Some(results) = cache.get(name, text, max_results).await {
                return Ok(results);
            }
        }

        let call_timeout = Duration::from_secs(self.settings.call_timeout_secs.max(1));
        let operation = format!("{} query", name);
        let results = self
            .retry
            .run(&operation, move || async move {
                tokio::time::timeout(call_timeout, provider.query(text, max_results))
                    .await
                    .unwrap_or(Err(ProviderError::Timeout(call_timeout)))
            })
            .await?;

        if let Some(cache) = &self.cache {
            cache.put(name, text, max_results, &results).await;
        }
        Ok(results)
    }

    /// Normalize and license-gate one query's answers in registration order
    fn assemble(
        &self,
        query: &StrategicQuery,
        qi: usize,
        answers: &mut HashMap<(usize, usize), Result<Vec<RawResult>, ProviderError>>,
    ) -> QuerySearchOutcome {
        let mut outcome = QuerySearchOutcome {
            results: QueryResults {
                query_id: query.query_id.clone(),
                query_text: query.query_text.clone(),
                results: Vec::new(),
            },
            unknown_license: Vec::new(),
            license_rejected: 0,
            providers_failed: Vec::new(),
            successful: false,
        };

        for (pi, provider) in self.providers.iter().enumerate() {
            let name = provider.name();
            let raws = match answers.remove(&(qi, pi)) {
                Some(Ok(raws)) => raws,
                Some(Err(e)) => {
                    warn!(
                        query_id = %query.query_id,
                        provider = name,
                        error = %e,
                        "Provider failed, no results for this query"
                    );
                    outcome.providers_failed.push(name.to_string());
                    continue;
                }
                None => {
                    debug!(
                        query_id = %query.query_id,
                        provider = name,
                        "Provider call did not finish"
                    );
                    outcome.providers_failed.push(name.to_string());
                    continue;
                }
            };
            outcome.successful = true;

            let total = raws.len();
            for (rank, raw) in raws.iter().enumerate() {
                let license = provider.license_for(raw);
                let relevance = self.scorer.score(&query.query_text, raw, rank, total);
                let candidate =
                    normalizer::to_candidate(raw, name, license, &query.query_id, relevance);

                if license.is_whitelisted() {
                    outcome.results.results.push(candidate);
                } else if license == License::Unknown && self.settings.allow_unknown_licenses {
                    outcome.unknown_license.push(candidate);
                } else {
                    debug!(
                        source_id = %candidate.source_id,
                        license = %license,
                        raw_license = %raw.license_raw,
                        "License gate rejected result"
                    );
                    outcome.license_rejected += 1;
                }
            }
        }

        debug!(
            query_id = %query.query_id,
            results = outcome.results.results.len(),
            rejected = outcome.license_rejected,
            "Query searched"
        );
        outcome
    }
}
