//! Episode Pipeline Orchestrator
//!
//! Composes director, search adapter, curator and source pack builder.
//!
//! # Error Handling
//! - Provider failures are absorbed by the search adapter (zero results for
//!   that query only)
//! - Coverage shortfalls are reported in the documents, never raised here
//! - Malformed shot plans, license gate bypass and duplicate assignment end
//!   the run
//!
//! # Example
//! ```rust,ignore
//! let pipeline = EpisodePipeline::new(config, providers).with_events(tx);
//! let run = pipeline.run(&plan).await?;
//! run.write_documents(&out_dir).await?;
//! run.check_coverage(&pipeline.config().coverage_gate())?;
//! ```

use super::{PipelineEvent, Stage};
use crate::config::SourcingConfig;
use crate::curator::Curator;
use crate::director::QueryDirector;
use crate::error::{SourcingError, SourcingResult};
use crate::gate::{CoverageGate, CoverageSummary};
use crate::search::{Provider, RelevanceScorer, SearchAdapter};
use crate::source_pack::SourcePackBuilder;
use chrono::{DateTime, Utc};
use evs_common::documents::{CurationOutput, DirectorOutput, SearchReport, ShotPlan, SourcePack};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// File names of the stage documents written by [`PipelineRun::write_documents`]
pub const STRATEGIC_QUERIES_FILE: &str = "strategic_queries.json";
pub const SEARCH_RESULTS_FILE: &str = "search_results.json";
pub const CURATED_ASSETS_FILE: &str = "curated_assets.json";
pub const SOURCE_PACK_FILE: &str = "source_pack.json";

/// Every stage document of one episode run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub director: DirectorOutput,
    pub search: SearchReport,
    pub curation: CurationOutput,
    pub source_pack: SourcePack,
}

impl PipelineRun {
    /// Apply the coverage gate to this run's source pack
    pub fn check_coverage(&self, gate: &CoverageGate) -> SourcingResult<CoverageSummary> {
        gate.check(&self.source_pack, &self.curation.deficits)
    }

    /// Write the four stage documents into `out_dir` (created if missing)
    pub async fn write_documents(&self, out_dir: &Path) -> SourcingResult<Vec<PathBuf>> {
        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(evs_common::Error::from)?;

        let documents = [
            (STRATEGIC_QUERIES_FILE, to_json(&self.director)?),
            (SEARCH_RESULTS_FILE, to_json(&self.search)?),
            (CURATED_ASSETS_FILE, to_json(&self.curation)?),
            (SOURCE_PACK_FILE, self.source_pack.to_json_pretty()?),
        ];

        let mut written = Vec::with_capacity(documents.len());
        for (name, json) in documents {
            let path = out_dir.join(name);
            tokio::fs::write(&path, json)
                .await
                .map_err(evs_common::Error::from)?;
            written.push(path);
        }

        info!(run_id = %self.run_id, out_dir = %out_dir.display(), "Stage documents written");
        Ok(written)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> SourcingResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| SourcingError::Common(e.into()))
}

/// Episode pipeline
pub struct EpisodePipeline {
    config: SourcingConfig,
    providers: Vec<Arc<dyn Provider>>,
    scorer: Option<Arc<dyn RelevanceScorer>>,
    cancel: CancellationToken,
    event_tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl EpisodePipeline {
    /// Create pipeline over a provider registry (registration order matters)
    pub fn new(config: SourcingConfig, providers: Vec<Arc<dyn Provider>>) -> Self {
        Self {
            config,
            providers,
            scorer: None,
            cancel: CancellationToken::new(),
            event_tx: None,
        }
    }

    /// Create pipeline with event channel for progress reporting
    pub fn with_events(mut self, event_tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace the default relevance scorer
    pub fn with_scorer(mut self, scorer: Arc<dyn RelevanceScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn config(&self) -> &SourcingConfig {
        &self.config
    }

    /// Query Director only
    pub fn plan(&self, plan: &ShotPlan) -> SourcingResult<DirectorOutput> {
        plan.validate()
            .map_err(|e| SourcingError::InvalidDocument(e.to_string()))?;
        Ok(QueryDirector::new(self.config.toml.director.clone()).build_strategic_queries(plan))
    }

    fn search_adapter(&self) -> SearchAdapter {
        let settings = self.config.toml.search.clone();
        let mut adapter = SearchAdapter::new(self.providers.clone(), settings)
            .with_retry(self.config.retry_policy())
            .with_cancellation(self.cancel.clone());
        if let Some(cache) = self.config.cache() {
            adapter = adapter.with_cache(cache);
        }
        if let Some(scorer) = &self.scorer {
            adapter = adapter.with_scorer(scorer.clone());
        }
        adapter
    }

    /// Run every stage; the coverage gate is left to the caller
    pub async fn run(&self, plan: &ShotPlan) -> SourcingResult<PipelineRun> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, scenes = plan.scenes.len(), "Episode run started");

        // Plan
        self.emit_event(PipelineEvent::StageStarted { stage: Stage::Plan }).await;
        let director = self.plan(plan)?;
        self.emit_event(PipelineEvent::QueriesPlanned {
            count: director.strategic_queries.len(),
            capped: director.dedupe_report.capped_count,
        })
        .await;

        // Search
        self.emit_event(PipelineEvent::StageStarted {
            stage: Stage::Search,
        })
        .await;
        let adapter = self.search_adapter();
        for provider in adapter.skipped_providers() {
            self.emit_event(PipelineEvent::ProviderSkipped {
                provider: provider.clone(),
            })
            .await;
        }
        let search = adapter.search_episode(&director.strategic_queries).await;
        for query in &search.results_by_query {
            self.emit_event(PipelineEvent::QuerySearched {
                query_id: query.query_id.clone(),
                results: query.results.len(),
            })
            .await;
        }
        if search.summary.budget_exhausted {
            self.emit_event(PipelineEvent::BudgetExhausted {
                queries_successful: search.summary.queries_successful,
                queries_total: search.summary.queries_total,
            })
            .await;
        }
        if search.summary.queries_total > 0 && search.summary.queries_successful == 0 {
            warn!(%run_id, "No provider answered any query");
        }

        // Curate
        self.emit_event(PipelineEvent::StageStarted {
            stage: Stage::Curate,
        })
        .await;
        let mut candidates = search.candidates();
        if self.config.toml.search.allow_unknown_licenses {
            candidates.extend(search.unknown_license_candidates.iter().cloned());
        }
        let curation = Curator::new(self.config.toml.curator.clone())
            .with_unknown_licenses(self.config.toml.search.allow_unknown_licenses)
            .with_query_plan(&director.strategic_queries)
            .curate(&candidates, &plan.scenes, &director.coverage_requirements)?;
        self.emit_event(PipelineEvent::CurationCompleted {
            unique_assets: curation.curated_assets.len(),
            deficits: curation.deficits.len(),
        })
        .await;

        // Assign
        self.emit_event(PipelineEvent::StageStarted {
            stage: Stage::Assign,
        })
        .await;
        let source_pack = SourcePackBuilder::new()
            .with_curator_deficits(&curation.deficits)
            .build(&curation.curated_assets, &plan.scenes)?;
        self.emit_event(PipelineEvent::PackBuilt {
            scenes_covered: source_pack.scenes_covered(),
            scenes_total: source_pack.scene_assignments.len(),
            warnings: source_pack.warnings.len(),
        })
        .await;

        let finished_at = Utc::now();
        info!(
            %run_id,
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            covered = source_pack.scenes_covered(),
            scenes = source_pack.scene_assignments.len(),
            "Episode run complete"
        );

        Ok(PipelineRun {
            run_id,
            started_at,
            finished_at,
            director,
            search,
            curation,
            source_pack,
        })
    }

    async fn emit_event(&self, event: PipelineEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event).await;
        }
    }
}
