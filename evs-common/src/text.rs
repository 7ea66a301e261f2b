//! Text normalization shared by the query director, search adapter and curator

use std::collections::BTreeSet;

/// Words ignored when comparing queries against result metadata
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "at", "by", "for", "from", "in", "into", "of", "on", "or", "the", "to",
    "with", "during", "over", "under", "about", "after", "before",
];

/// File extensions stripped from titles before comparison
const MEDIA_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".tif", ".tiff", ".webp", ".svg", ".mp4", ".webm", ".ogv",
    ".mov",
];

/// Normalize a search query: lowercase, trim, collapse internal whitespace
pub fn normalize_query(raw: &str) -> String {
    raw.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize a media title for identity comparison
///
/// Lowercases, drops a `File:` prefix and media file extension, replaces
/// punctuation with spaces and collapses whitespace.
pub fn normalize_title(raw: &str) -> String {
    let mut title = raw.trim().to_lowercase();
    if let Some(rest) = title.strip_prefix("file:") {
        title = rest.to_string();
    }
    for ext in MEDIA_EXTENSIONS {
        if let Some(stripped) = title.strip_suffix(ext) {
            title = stripped.to_string();
            break;
        }
    }
    let cleaned: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    normalize_query(&cleaned)
}

/// Split text into lowercase alphanumeric words
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Content words of a text (stopwords and single characters removed), deduplicated
pub fn content_words(text: &str) -> BTreeSet<String> {
    words(text)
        .into_iter()
        .filter(|w| w.chars().count() > 1 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}
