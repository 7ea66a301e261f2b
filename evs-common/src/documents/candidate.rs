//! Search adapter output: normalized candidates

use crate::license::License;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Weight of relevance in the composite score
pub const RELEVANCE_WEIGHT: f64 = 0.6;
/// Weight of quality in the composite score
pub const QUALITY_WEIGHT: f64 = 0.4;

/// Media kind of a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Video,
    Image,
}

/// A raw search result normalized to the common shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// `provider:native_id`, unique across providers
    pub source_id: String,
    pub provider: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub media_type: MediaType,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub license: License,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
    /// Required when the license requires attribution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    pub relevance_score: f64,
    pub quality_score: f64,
    /// Strategic query that produced this candidate
    pub query_source_id: String,
}

impl Candidate {
    /// `relevance * 0.6 + quality * 0.4`
    pub fn composite_score(&self) -> f64 {
        self.relevance_score * RELEVANCE_WEIGHT + self.quality_score * QUALITY_WEIGHT
    }

    /// Boundary validation for candidates entering the curator
    pub fn validate(&self) -> Result<()> {
        if self.source_id.trim().is_empty() {
            return Err(Error::InvalidInput("candidate with empty source_id".to_string()));
        }
        for (name, score) in [
            ("relevance_score", self.relevance_score),
            ("quality_score", self.quality_score),
        ] {
            if !(0.0..=1.0).contains(&score) {
                return Err(Error::InvalidInput(format!(
                    "candidate {} has {} {} outside 0..1",
                    self.source_id, name, score
                )));
            }
        }
        if self.license.requires_attribution()
            && self.attribution.as_deref().map_or(true, |a| a.trim().is_empty())
        {
            return Err(Error::InvalidInput(format!(
                "candidate {} is {} but carries no attribution",
                self.source_id, self.license
            )));
        }
        Ok(())
    }
}

/// Results of one strategic query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
    pub query_id: String,
    pub query_text: String,
    pub results: Vec<Candidate>,
}

/// Search phase totals
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchSummary {
    pub queries_total: usize,
    /// Queries for which at least one provider call succeeded
    pub queries_successful: usize,
    pub candidates_total: usize,
    /// Results dropped by the license gate
    #[serde(default)]
    pub license_rejected: usize,
    /// Providers disabled for the run (missing credentials)
    #[serde(default)]
    pub providers_skipped: Vec<String>,
    /// The episode-level search budget ran out before all calls finished
    #[serde(default)]
    pub budget_exhausted: bool,
}

/// `{results_by_query, unknown_license_candidates, summary}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchReport {
    pub results_by_query: Vec<QueryResults>,
    /// Unknown-license items retained by the explicit override, never mixed
    /// into `results_by_query`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_license_candidates: Vec<Candidate>,
    pub summary: SearchSummary,
}

impl SearchReport {
    /// All main-stream candidates in query order
    pub fn candidates(&self) -> Vec<Candidate> {
        self.results_by_query
            .iter()
            .flat_map(|q| q.results.iter().cloned())
            .collect()
    }
}
