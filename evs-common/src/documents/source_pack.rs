//! Final per-scene asset assignment document, consumed by the compiler

use super::curated::CuratedAsset;
use crate::visual_type::VisualType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reference to a curated asset from a scene assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSlot {
    pub source_id: String,
    pub global_rank: usize,
    pub visual_type: VisualType,
}

impl From<&CuratedAsset> for AssetSlot {
    fn from(asset: &CuratedAsset) -> Self {
        Self {
            source_id: asset.candidate.source_id.clone(),
            global_rank: asset.global_rank,
            visual_type: asset.visual_type,
        }
    }
}

/// Assets assigned to one scene, by role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneAssignment {
    pub scene_id: String,
    pub primary_assets: Vec<AssetSlot>,
    pub secondary_assets: Vec<AssetSlot>,
    pub texture_assets: Vec<AssetSlot>,
    /// No real asset could be assigned
    pub has_deficit: bool,
}

impl SceneAssignment {
    /// All slots in role order
    pub fn all_slots(&self) -> impl Iterator<Item = &AssetSlot> {
        self.primary_assets
            .iter()
            .chain(self.secondary_assets.iter())
            .chain(self.texture_assets.iter())
    }

    pub fn asset_count(&self) -> usize {
        self.all_slots().count()
    }
}

/// Unassigned assets kept for the compiler's own fallback decisions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FallbackPools {
    /// Low-motion assets for scenes wanting ambience
    pub texture_pool: Vec<CuratedAsset>,
    /// Last-resort assets usable by any scene
    pub emergency_pool: Vec<CuratedAsset>,
}

/// A `source_id` found in two scene assignments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateUse {
    pub source_id: String,
    pub first_scene: String,
    pub second_scene: String,
}

/// `{episode_asset_pool, scene_assignments, fallback_pools, warnings}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourcePack {
    /// Curated assets assigned to at least one scene, rank order
    pub episode_asset_pool: Vec<CuratedAsset>,
    pub scene_assignments: Vec<SceneAssignment>,
    pub fallback_pools: FallbackPools,
    pub warnings: Vec<String>,
}

impl SourcePack {
    /// Find the first `source_id` assigned to more than one scene
    pub fn find_duplicate_use(&self) -> Option<DuplicateUse> {
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for assignment in &self.scene_assignments {
            for slot in assignment.all_slots() {
                if let Some(first) = owners.insert(&slot.source_id, &assignment.scene_id) {
                    if first != assignment.scene_id {
                        return Some(DuplicateUse {
                            source_id: slot.source_id.clone(),
                            first_scene: first.to_string(),
                            second_scene: assignment.scene_id.clone(),
                        });
                    }
                }
            }
        }
        None
    }

    /// Number of scenes with at least one real asset
    pub fn scenes_covered(&self) -> usize {
        self.scene_assignments
            .iter()
            .filter(|a| a.asset_count() > 0)
            .count()
    }

    /// Scenes with at least one asset / total scenes (0 for an empty pack)
    pub fn coverage_ratio(&self) -> f64 {
        if self.scene_assignments.is_empty() {
            return 0.0;
        }
        self.scenes_covered() as f64 / self.scene_assignments.len() as f64
    }

    /// Serialize to pretty JSON
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
