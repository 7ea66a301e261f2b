//! Source Pack Builder
//!
//! Assigns curated assets to scenes deterministically and enforces that no
//! asset appears in more than one scene.
//!
//! # Assignment
//! Roles are filled one at a time across the whole episode: every scene's
//! primary, then every scene's secondary, then every texture. Within a role
//! scenes are visited in ascending `start_sec` (ties by `scene_id`), and the
//! ranked asset list is walked skipping assets already claimed:
//! - **Primary / secondary**: the first asset in the best non-empty tier
//!   1. type matches a scene hint and the asset recommends this scene
//!   2. type matches a scene hint
//!   3. the asset recommends this scene
//!   4. any non-texture asset
//! - **Texture**: a low-motion asset (`texture`, `landscape`,
//!   `architecture`), else any remaining asset
//!
//! A scene that ends up empty is flagged `has_deficit` and warned about. It
//! is never backfilled with placeholder content.

pub mod used_assets;

pub use used_assets::UsedAssets;

use crate::error::{SourcingError, SourcingResult};
use evs_common::documents::scene::{scenes_in_time_order, validate_scenes};
use evs_common::documents::{
    AssetSlot, CuratedAsset, Deficit, FallbackPools, Scene, SceneAssignment, SourcePack,
};
use evs_common::VisualType;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Assets per scene below which a `[below_recommended]` warning is raised
pub const RECOMMENDED_MIN_ASSETS: usize = 2;

type Tier = fn(&CuratedAsset, &Scene) -> bool;

fn hinted_and_recommended(asset: &CuratedAsset, scene: &Scene) -> bool {
    scene.hints(asset.visual_type) && asset.recommends(&scene.scene_id)
}

fn hinted(asset: &CuratedAsset, scene: &Scene) -> bool {
    scene.hints(asset.visual_type)
}

fn recommended(asset: &CuratedAsset, scene: &Scene) -> bool {
    asset.recommends(&scene.scene_id)
}

fn not_texture(asset: &CuratedAsset, _scene: &Scene) -> bool {
    asset.visual_type != VisualType::Texture
}

fn low_motion(asset: &CuratedAsset, _scene: &Scene) -> bool {
    asset.visual_type.is_low_motion()
}

fn any(_asset: &CuratedAsset, _scene: &Scene) -> bool {
    true
}

/// Primary and secondary role tiers, best first
const CONTENT_TIERS: [Tier; 4] = [hinted_and_recommended, hinted, recommended, not_texture];

/// Texture role tiers, best first
const TEXTURE_TIERS: [Tier; 2] = [low_motion, any];

#[derive(Debug, Clone, Copy)]
enum Role {
    Primary,
    Secondary,
    Texture,
}

impl Role {
    const ALL: [Role; 3] = [Role::Primary, Role::Secondary, Role::Texture];

    fn tiers(self) -> &'static [Tier] {
        match self {
            Role::Primary | Role::Secondary => &CONTENT_TIERS,
            Role::Texture => &TEXTURE_TIERS,
        }
    }

    fn slots(self, assignment: &mut SceneAssignment) -> &mut Vec<AssetSlot> {
        match self {
            Role::Primary => &mut assignment.primary_assets,
            Role::Secondary => &mut assignment.secondary_assets,
            Role::Texture => &mut assignment.texture_assets,
        }
    }
}

/// Source pack builder
#[derive(Debug, Clone, Default)]
pub struct SourcePackBuilder {
    curator_deficits: Vec<Deficit>,
}

impl SourcePackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Echo the curator's coverage deficits as `[coverage]` warnings
    pub fn with_curator_deficits(mut self, deficits: &[Deficit]) -> Self {
        self.curator_deficits = deficits.to_vec();
        self
    }

    /// Build the source pack
    ///
    /// # Errors
    /// - [`SourcingError::InvalidDocument`] for malformed scenes or repeated
    ///   `source_id`s in `curated`
    /// - [`SourcingError::DuplicateAssignment`] if an asset would be used twice
    pub fn build(&self, curated: &[CuratedAsset], scenes: &[Scene]) -> SourcingResult<SourcePack> {
        validate_scenes(scenes).map_err(|e| SourcingError::InvalidDocument(e.to_string()))?;

        let mut seen = HashSet::new();
        for asset in curated {
            if !seen.insert(asset.source_id()) {
                return Err(SourcingError::InvalidDocument(format!(
                    "curated assets repeat source_id {}",
                    asset.source_id()
                )));
            }
        }

        let mut ranked: Vec<&CuratedAsset> = curated.iter().collect();
        ranked.sort_by(|a, b| {
            a.global_rank
                .cmp(&b.global_rank)
                .then_with(|| a.source_id().cmp(b.source_id()))
        });

        let ordered = scenes_in_time_order(scenes);
        let mut used = UsedAssets::new();
        let mut scene_assignments: Vec<SceneAssignment> = ordered
            .iter()
            .map(|scene| SceneAssignment {
                scene_id: scene.scene_id.clone(),
                primary_assets: Vec::new(),
                secondary_assets: Vec::new(),
                texture_assets: Vec::new(),
                has_deficit: false,
            })
            .collect();

        // Later scenes get their primary before earlier ones get a secondary
        for role in Role::ALL {
            for (scene, assignment) in ordered.iter().zip(scene_assignments.iter_mut()) {
                if let Some(asset) = pick(&ranked, &used, scene, role.tiers()) {
                    used.claim(asset.source_id(), &scene.scene_id)?;
                    role.slots(assignment).push(AssetSlot::from(asset));
                }
            }
        }

        let mut warnings = Vec::new();
        for assignment in &mut scene_assignments {
            let count = assignment.asset_count();
            if count == 0 {
                assignment.has_deficit = true;
                warn!(scene_id = %assignment.scene_id, "Scene has no assets");
                warnings.push(format!(
                    "[deficit] scene {}: no license-safe asset available",
                    assignment.scene_id
                ));
            } else if count < RECOMMENDED_MIN_ASSETS {
                warnings.push(format!(
                    "[below_recommended] scene {}: {} asset (recommended minimum {})",
                    assignment.scene_id, count, RECOMMENDED_MIN_ASSETS
                ));
            }
            debug!(scene_id = %assignment.scene_id, assets = count, "Scene assigned");
        }

        for deficit in &self.curator_deficits {
            warnings.push(format!(
                "[coverage] {} short by {} asset(s)",
                deficit.visual_type, deficit.shortfall
            ));
        }

        let mut episode_asset_pool = Vec::new();
        let mut fallback_pools = FallbackPools::default();
        for asset in ranked {
            if used.is_used(asset.source_id()) {
                episode_asset_pool.push(asset.clone());
            } else if asset.visual_type.is_low_motion() {
                fallback_pools.texture_pool.push(asset.clone());
            } else {
                fallback_pools.emergency_pool.push(asset.clone());
            }
        }

        let pack = SourcePack {
            episode_asset_pool,
            scene_assignments,
            fallback_pools,
            warnings,
        };

        if let Some(dup) = pack.find_duplicate_use() {
            return Err(SourcingError::DuplicateAssignment {
                source_id: dup.source_id,
                first_scene: dup.first_scene,
                second_scene: dup.second_scene,
            });
        }

        info!(
            scenes = pack.scene_assignments.len(),
            covered = pack.scenes_covered(),
            assigned = pack.episode_asset_pool.len(),
            texture_pool = pack.fallback_pools.texture_pool.len(),
            emergency_pool = pack.fallback_pools.emergency_pool.len(),
            warnings = pack.warnings.len(),
            "Source pack built"
        );

        Ok(pack)
    }
}

/// First unclaimed asset in the best non-empty tier
fn pick<'a>(
    ranked: &[&'a CuratedAsset],
    used: &UsedAssets,
    scene: &Scene,
    tiers: &[Tier],
) -> Option<&'a CuratedAsset> {
    tiers.iter().find_map(|tier| {
        ranked
            .iter()
            .copied()
            .find(|asset| !used.is_used(asset.source_id()) && tier(asset, scene))
    })
}
