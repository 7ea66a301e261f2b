//! Metadata-level identity fingerprints
//!
//! `SHA-256(lowercased source_id, normalized title, duration bucket)`, hex
//! encoded. Videos fall into 5-second buckets; images share the `still` bucket.

use evs_common::documents::{Candidate, MediaType};
use evs_common::text::normalize_title;
use sha2::{Digest, Sha256};

/// Width of a video duration bucket in seconds
pub const DURATION_BUCKET_SECS: f64 = 5.0;

/// Duration bucket label for a candidate
pub fn duration_bucket(media_type: MediaType, duration_sec: Option<f64>) -> String {
    match media_type {
        MediaType::Image => "still".to_string(),
        MediaType::Video => match duration_sec {
            Some(d) if d.is_finite() && d >= 0.0 => {
                let bucket = (d / DURATION_BUCKET_SECS).floor() as u64;
                format!("{}s", bucket.saturating_mul(DURATION_BUCKET_SECS as u64))
            }
            _ => "video".to_string(),
        },
    }
}

/// Identity fingerprint of a candidate
pub fn fingerprint(candidate: &Candidate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(candidate.source_id.to_lowercase().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(normalize_title(&candidate.title).as_bytes());
    hasher.update(b"\x1f");
    hasher.update(duration_bucket(candidate.media_type, candidate.duration_sec).as_bytes());
    format!("{:x}", hasher.finalize())
}
