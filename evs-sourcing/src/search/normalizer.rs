//! RawResult → Candidate normalization
//!
//! # Scoring
//! - **Relevance** comes from a [`RelevanceScorer`]. The default
//!   [`KeywordOverlapScorer`] blends query/metadata keyword overlap (80%) with
//!   the provider's own result rank (20%), plus a small bonus when the title
//!   contains the whole query phrase. An external classifier can replace it
//!   behind the same trait.
//! - **Quality** is a resolution heuristic on the short image side, penalized
//!   for extreme aspect ratios and very short clips.

use super::provider::RawResult;
use evs_common::documents::{Candidate, MediaType};
use evs_common::text::{content_words, normalize_query, normalize_title};
use evs_common::License;

/// Relevance scoring seam: any implementation must return a value in 0..=1
pub trait RelevanceScorer: Send + Sync {
    /// Score one result for `query_text`; `rank` is its 0-based position in
    /// the provider's answer of `total` results
    fn score(&self, query_text: &str, raw: &RawResult, rank: usize, total: usize) -> f64;
}

/// Default heuristic scorer
#[derive(Debug, Clone, Copy)]
pub struct KeywordOverlapScorer {
    overlap_weight: f64,
    rank_weight: f64,
    phrase_bonus: f64,
}

impl Default for KeywordOverlapScorer {
    fn default() -> Self {
        Self {
            overlap_weight: 0.8,
            rank_weight: 0.2,
            phrase_bonus: 0.1,
        }
    }
}

impl RelevanceScorer for KeywordOverlapScorer {
    fn score(&self, query_text: &str, raw: &RawResult, rank: usize, total: usize) -> f64 {
        let query_words = content_words(query_text);
        let metadata = format!("{} {} {}", raw.title, raw.description, raw.tags.join(" "));
        let result_words = content_words(&metadata);

        let overlap = if query_words.is_empty() {
            0.5
        } else {
            let hits = query_words.intersection(&result_words).count();
            hits as f64 / query_words.len() as f64
        };

        let rank_factor = if total <= 1 {
            1.0
        } else {
            1.0 - (rank.min(total - 1) as f64 / total as f64)
        };

        let query_phrase = normalize_query(query_text);
        let phrase_in_title =
            !query_phrase.is_empty() && normalize_title(&raw.title).contains(&query_phrase);
        let bonus = if phrase_in_title {
            self.phrase_bonus
        } else {
            0.0
        };

        (overlap * self.overlap_weight + rank_factor * self.rank_weight + bonus).clamp(0.0, 1.0)
    }
}

/// Resolution/composition heuristic in 0..=1
pub fn quality_score(raw: &RawResult) -> f64 {
    let mut score: f64 = match (raw.width, raw.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => {
            let short_side = w.min(h);
            let base = match short_side {
                s if s >= 1080 => 1.0,
                s if s >= 720 => 0.85,
                s if s >= 480 => 0.65,
                s if s >= 320 => 0.45,
                _ => 0.25,
            };
            let aspect = w.max(h) as f64 / short_side as f64;
            if aspect > 3.0 {
                base * 0.8
            } else {
                base
            }
        }
        // Unknown dimensions: neutral
        _ => 0.5,
    };

    if raw.media_type == MediaType::Video {
        match raw.duration_sec {
            Some(d) if d < 3.0 => score *= 0.7,
            Some(d) if d > 600.0 => score *= 0.9,
            _ => {}
        }
    }

    score.clamp(0.0, 1.0)
}

/// Attribution line for licenses that need one (or when the creator is known)
pub fn attribution_for(raw: &RawResult, provider: &str, license: License) -> Option<String> {
    let creator = raw
        .creator
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    if creator.is_none() && !license.requires_attribution() {
        return None;
    }

    Some(format!(
        "\"{}\" by {} via {} ({})",
        raw.title.trim(),
        creator.unwrap_or("unknown author"),
        provider,
        license.label()
    ))
}

/// Build the common candidate shape from a provider result
pub fn to_candidate(
    raw: &RawResult,
    provider: &str,
    license: License,
    query_id: &str,
    relevance_score: f64,
) -> Candidate {
    let description = if raw.description.trim().is_empty() && !raw.tags.is_empty() {
        raw.tags.join(", ")
    } else {
        raw.description.clone()
    };

    Candidate {
        source_id: format!("{}:{}", provider, raw.native_id),
        provider: provider.to_string(),
        title: raw.title.clone(),
        description,
        media_type: raw.media_type,
        url: raw.url.clone(),
        thumbnail_url: raw.thumbnail_url.clone(),
        duration_sec: raw.duration_sec,
        width: raw.width,
        height: raw.height,
        license,
        license_url: raw.license_url.clone(),
        attribution: attribution_for(raw, provider, license),
        relevance_score: relevance_score.clamp(0.0, 1.0),
        quality_score: quality_score(raw),
        query_source_id: query_id.to_string(),
    }
}
