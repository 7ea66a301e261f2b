//! Query duplication diagnostics
//!
//! Near-duplicates are distinct normalized queries whose normalized
//! Levenshtein similarity is at or above [`NEAR_DUPLICATE_SIMILARITY`]
//! ("roman legion" / "roman legions"). They are reported, never merged.

use evs_common::VisualType;
use std::collections::BTreeMap;

/// Similarity at which two distinct queries count as near-duplicates
pub const NEAR_DUPLICATE_SIMILARITY: f64 = 0.85;

/// Number of near-duplicate pairs among distinct query texts
pub fn near_duplicate_pairs(texts: &[&str]) -> usize {
    let mut pairs = 0;
    for (i, a) in texts.iter().enumerate() {
        for b in &texts[i + 1..] {
            if a != b && strsim::normalized_levenshtein(a, b) >= NEAR_DUPLICATE_SIMILARITY {
                pairs += 1;
            }
        }
    }
    pairs
}

/// Share of the most common visual type (0 for an empty list)
pub fn dominant_type_share(types: &[VisualType]) -> f64 {
    if types.is_empty() {
        return 0.0;
    }
    let mut counts: BTreeMap<VisualType, usize> = BTreeMap::new();
    for visual_type in types {
        *counts.entry(*visual_type).or_insert(0) += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    max as f64 / types.len() as f64
}

/// Share of raw queries that duplicated an earlier one
pub fn duplicate_rate(raw_count: usize, unique_count: usize) -> f64 {
    if raw_count == 0 {
        return 0.0;
    }
    raw_count.saturating_sub(unique_count) as f64 / raw_count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_near_duplicates() {
        let texts = ["roman legion", "roman legions", "map of gaul"];
        assert_eq!(near_duplicate_pairs(&texts), 1);
        assert_eq!(near_duplicate_pairs(&["a"]), 0);
    }

    #[test]
    fn test_dominant_share() {
        let types = [
            VisualType::Portrait,
            VisualType::Portrait,
            VisualType::Portrait,
            VisualType::Map,
        ];
        assert!((dominant_type_share(&types) - 0.75).abs() < 1e-9);
        assert_eq!(dominant_type_share(&[]), 0.0);
    }

    #[test]
    fn test_duplicate_rate() {
        assert!((duplicate_rate(10, 4) - 0.6).abs() < 1e-9);
        assert_eq!(duplicate_rate(0, 0), 0.0);
    }
}
