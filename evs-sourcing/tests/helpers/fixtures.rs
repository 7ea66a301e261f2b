//! Shot plan and configuration fixtures

use evs_common::config::TomlConfig;
use evs_common::documents::{MediaType, Scene, ShotPlan};
use evs_common::text::content_words;
use evs_common::VisualType;
use evs_sourcing::search::RawResult;
use evs_sourcing::SourcingConfig;
use std::path::Path;

/// Build a five-second scene starting at `start_sec`
pub fn scene(id: &str, start_sec: f64, hints: &[VisualType], queries: &[&str]) -> Scene {
    Scene {
        scene_id: id.to_string(),
        start_sec,
        end_sec: start_sec + 5.0,
        narration_text: format!("Narration for {}", id),
        keywords: queries
            .iter()
            .flat_map(|q| content_words(q))
            .collect(),
        visual_type_hints: hints.to_vec(),
        search_queries: queries.iter().map(|q| q.to_string()).collect(),
    }
}

/// Six scenes: two portraits, two maps, two documents
pub fn napoleon_plan() -> ShotPlan {
    ShotPlan {
        episode_topic: Some("Napoleon".to_string()),
        scenes: vec![
            scene("s1", 0.0, &[VisualType::Portrait], &["portrait of napoleon"]),
            scene("s2", 5.0, &[VisualType::Portrait], &["Portrait of  Josephine"]),
            scene("s3", 10.0, &[VisualType::Map], &["map of europe 1805"]),
            scene("s4", 15.0, &[VisualType::Map], &["map of russia campaign"]),
            scene("s5", 20.0, &[VisualType::Document], &["treaty of tilsit"]),
            scene("s6", 25.0, &[VisualType::Document], &["napoleonic code manuscript"]),
        ],
    }
}

/// 1280x720 still with a creator, tagged with the query's content words
pub fn raw_result(native_id: &str, title: &str, query: &str, license: &str) -> RawResult {
    RawResult {
        native_id: native_id.to_string(),
        title: title.to_string(),
        description: String::new(),
        tags: content_words(query).into_iter().collect(),
        media_type: MediaType::Image,
        url: format!("https://media.example.org/{}.jpg", native_id),
        thumbnail_url: format!("https://media.example.org/thumb/{}.jpg", native_id),
        duration_sec: None,
        width: Some(1280),
        height: Some(720),
        license_raw: license.to_string(),
        license_url: None,
        creator: Some("Archive contributor".to_string()),
    }
}

/// Fast retries, short timeouts, cache only when a directory is given
pub fn test_config(cache_dir: Option<&Path>) -> SourcingConfig {
    let mut toml = TomlConfig::default();
    toml.search.call_timeout_secs = 2;
    toml.search.search_budget_secs = 30;
    toml.search.cache_enabled = cache_dir.is_some();
    toml.search.cache_dir = cache_dir.map(Path::to_path_buf);
    toml.retry.max_attempts = 3;
    toml.retry.base_delay_ms = 1;
    toml.retry.max_delay_ms = 5;
    toml.retry.jitter = 0.0;
    SourcingConfig::new(toml)
}
