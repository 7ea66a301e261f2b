//! Visual curator output document

use super::candidate::Candidate;
use crate::visual_type::VisualType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A candidate promoted past filtering, deduplication and global ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedAsset {
    #[serde(flatten)]
    pub candidate: Candidate,
    /// 1-based position in the global ranking
    pub global_rank: usize,
    pub global_score: f64,
    pub visual_type: VisualType,
    pub recommended_scene_ids: Vec<String>,
    /// Identity fingerprint (hex SHA-256)
    pub fingerprint: String,
}

impl CuratedAsset {
    pub fn source_id(&self) -> &str {
        &self.candidate.source_id
    }

    /// Whether the curator recommended this asset for `scene_id`
    pub fn recommends(&self, scene_id: &str) -> bool {
        self.recommended_scene_ids.iter().any(|s| s == scene_id)
    }
}

/// Shortfall between required and available assets of one visual type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deficit {
    pub visual_type: VisualType,
    pub shortfall: u32,
}

/// Candidate deduplication diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CurationDedupeReport {
    pub total_candidates: usize,
    /// Dropped by the relevance/quality/generic-title pre-filter
    #[serde(default)]
    pub prefilter_rejected: usize,
    pub unique_assets: usize,
    pub duplicates_removed: usize,
}

/// `{curated_assets, coverage_balance, deficits, dedupe_report}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurationOutput {
    pub curated_assets: Vec<CuratedAsset>,
    pub coverage_balance: BTreeMap<VisualType, u32>,
    pub deficits: Vec<Deficit>,
    pub dedupe_report: CurationDedupeReport,
}

impl CurationOutput {
    /// Shortfall reported for `visual_type` (0 when satisfied)
    pub fn shortfall(&self, visual_type: VisualType) -> u32 {
        self.deficits
            .iter()
            .find(|d| d.visual_type == visual_type)
            .map_or(0, |d| d.shortfall)
    }
}
