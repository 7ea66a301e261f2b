//! Query director output document

use crate::visual_type::VisualType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A deduplicated, prioritized search string serving one or more scenes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicQuery {
    pub query_id: String,
    pub query_text: String,
    /// Higher = more important
    pub priority: u32,
    pub visual_type: VisualType,
    pub intended_scene_ids: Vec<String>,
    /// Diagnostic only
    #[serde(default)]
    pub reasoning: String,
}

/// Minimum asset count needed for one visual category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRequirement {
    pub min_assets: u32,
    pub reason: String,
}

/// Coverage requirements keyed by visual type
pub type CoverageRequirements = BTreeMap<VisualType, CoverageRequirement>;

/// Query deduplication diagnostics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryDedupeReport {
    pub raw_count: usize,
    pub unique_count: usize,
    /// `(raw - unique) / raw`, 0 when there were no raw queries
    pub duplicate_rate: f64,
    /// Unique query pairs that are textually near-identical
    #[serde(default)]
    pub near_duplicate_pairs: usize,
    /// Share of unique queries belonging to the most common visual type
    #[serde(default)]
    pub dominant_visual_type_share: f64,
    /// Unique queries dropped by the query cap
    #[serde(default)]
    pub capped_count: usize,
}

/// `{strategic_queries, coverage_requirements, dedupe_report}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DirectorOutput {
    pub strategic_queries: Vec<StrategicQuery>,
    pub coverage_requirements: CoverageRequirements,
    pub dedupe_report: QueryDedupeReport,
}

impl DirectorOutput {
    /// Look up a query by id
    pub fn query(&self, query_id: &str) -> Option<&StrategicQuery> {
        self.strategic_queries.iter().find(|q| q.query_id == query_id)
    }
}
