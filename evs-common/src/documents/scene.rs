//! Shot plan input contract (produced by the upstream shot planner)

use crate::visual_type::VisualType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A timed unit of narration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub scene_id: String,
    pub start_sec: f64,
    pub end_sec: f64,
    #[serde(default)]
    pub narration_text: String,
    /// Ordered concrete noun phrases
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub visual_type_hints: Vec<VisualType>,
    /// Raw per-scene search queries suggested by the planner
    #[serde(default)]
    pub search_queries: Vec<String>,
}

impl Scene {
    /// Whether any hint names `visual_type`
    pub fn hints(&self, visual_type: VisualType) -> bool {
        self.visual_type_hints.contains(&visual_type)
    }
}

/// Upstream shot plan document: `{episode_topic?, scenes: [...]}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShotPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_topic: Option<String>,
    pub scenes: Vec<Scene>,
}

impl ShotPlan {
    /// Parse and validate a shot plan JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let plan: ShotPlan = serde_json::from_str(json)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Reject malformed plans before they reach any stage
    pub fn validate(&self) -> Result<()> {
        validate_scenes(&self.scenes)
    }

    /// Scenes sorted by `start_sec`, ties broken by `scene_id`
    pub fn scenes_in_time_order(&self) -> Vec<&Scene> {
        scenes_in_time_order(&self.scenes)
    }
}

/// Validate a scene list: unique non-empty ids, finite ordered timings
pub fn validate_scenes(scenes: &[Scene]) -> Result<()> {
    let mut seen = HashSet::new();
    for scene in scenes {
        if scene.scene_id.trim().is_empty() {
            return Err(Error::InvalidInput("scene with empty scene_id".to_string()));
        }
        if !seen.insert(scene.scene_id.as_str()) {
            return Err(Error::InvalidInput(format!(
                "duplicate scene_id: {}",
                scene.scene_id
            )));
        }
        if !scene.start_sec.is_finite() || !scene.end_sec.is_finite() {
            return Err(Error::InvalidInput(format!(
                "scene {} has non-finite timing",
                scene.scene_id
            )));
        }
        if scene.end_sec < scene.start_sec {
            return Err(Error::InvalidInput(format!(
                "scene {} ends ({}) before it starts ({})",
                scene.scene_id, scene.end_sec, scene.start_sec
            )));
        }
    }
    Ok(())
}

/// Scenes sorted by `start_sec`, ties broken by `scene_id`
pub fn scenes_in_time_order(scenes: &[Scene]) -> Vec<&Scene> {
    let mut ordered: Vec<&Scene> = scenes.iter().collect();
    ordered.sort_by(|a, b| {
        a.start_sec
            .total_cmp(&b.start_sec)
            .then_with(|| a.scene_id.cmp(&b.scene_id))
    });
    ordered
}
