//! Relevance/quality pre-filter

use evs_common::config::CuratorSettings;
use evs_common::documents::Candidate;
use evs_common::text::words;
use std::fmt;

/// Title words that carry no information on their own
const GENERIC_WORDS: &[&str] = &[
    "untitled", "image", "img", "photo", "picture", "pic", "file", "video", "clip", "dsc",
    "dscn", "dscf", "scan", "unknown", "no", "title", "copy", "jpg", "jpeg", "png", "mp4",
];

/// Why a candidate was dropped before deduplication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    LowRelevance,
    LowQuality,
    GenericTitle,
    Invalid,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::LowRelevance => "low relevance",
            RejectReason::LowQuality => "low quality",
            RejectReason::GenericTitle => "generic title",
            RejectReason::Invalid => "invalid candidate",
        };
        f.write_str(s)
    }
}

/// Whether a title says nothing about the content
///
/// "untitled", "IMG_1234", "DSC01234", "file 003.jpg" and empty titles are
/// generic; any real word makes the title informative.
pub fn is_generic_title(title: &str) -> bool {
    words(title).iter().all(|word| {
        if word.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
        if GENERIC_WORDS.contains(&word.as_str()) {
            return true;
        }
        // Camera-style token: generic prefix followed by digits ("dsc01234")
        let prefix_len = word
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit())
            .map_or(word.len(), |(i, _)| i);
        let (prefix, rest) = word.split_at(prefix_len);
        !rest.is_empty()
            && rest.chars().all(|c| c.is_ascii_digit())
            && GENERIC_WORDS.contains(&prefix)
    })
}

/// Check one candidate against the thresholds
pub fn check(candidate: &Candidate, settings: &CuratorSettings) -> Result<(), RejectReason> {
    if candidate.validate().is_err() {
        return Err(RejectReason::Invalid);
    }
    if candidate.relevance_score < settings.min_relevance {
        return Err(RejectReason::LowRelevance);
    }
    if candidate.quality_score < settings.min_quality {
        return Err(RejectReason::LowQuality);
    }
    if is_generic_title(&candidate.title) {
        return Err(RejectReason::GenericTitle);
    }
    Ok(())
}
