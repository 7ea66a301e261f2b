//! Episode pipeline orchestration
//!
//! Runs the four stages in order:
//! 1. **Plan**: Query Director over the shot plan
//! 2. **Search**: Multi-Source Search Adapter over the strategic queries
//! 3. **Curate**: Visual Curator over the license-safe candidates
//! 4. **Assign**: Source Pack Builder over the curated assets
//!
//! The coverage gate is applied by the caller (see [`PipelineRun::check_coverage`]),
//! so a run with poor coverage still yields every document for inspection.

pub mod pipeline;

pub use pipeline::{EpisodePipeline, PipelineRun};

use serde::{Deserialize, Serialize};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Plan,
    Search,
    Curate,
    Assign,
}

/// Progress events for an episode run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// Stage started
    StageStarted {
        stage: Stage,
    },

    /// Strategic queries built
    QueriesPlanned {
        /// Strategic queries kept
        count: usize,
        /// Unique queries dropped by the cap
        capped: usize,
    },

    /// Provider disabled for the run (missing credentials)
    ProviderSkipped {
        provider: String,
    },

    /// One strategic query searched across all providers
    QuerySearched {
        query_id: String,
        /// License-safe candidates returned
        results: usize,
    },

    /// Search budget ran out or the run was cancelled mid-search
    BudgetExhausted {
        queries_successful: usize,
        queries_total: usize,
    },

    /// Curation finished
    CurationCompleted {
        unique_assets: usize,
        /// Visual types short of their minimum
        deficits: usize,
    },

    /// Source pack assembled
    PackBuilt {
        scenes_covered: usize,
        scenes_total: usize,
        warnings: usize,
    },
}
