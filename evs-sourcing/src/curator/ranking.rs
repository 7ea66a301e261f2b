//! Deterministic global ranking and coverage accounting

use evs_common::documents::{CoverageRequirements, CuratedAsset, Deficit};
use evs_common::VisualType;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Score desc, recommended scene count desc, `source_id` asc
pub fn compare(a: &CuratedAsset, b: &CuratedAsset) -> Ordering {
    b.global_score
        .total_cmp(&a.global_score)
        .then_with(|| {
            b.recommended_scene_ids
                .len()
                .cmp(&a.recommended_scene_ids.len())
        })
        .then_with(|| a.source_id().cmp(b.source_id()))
}

/// Sort and assign 1-based `global_rank`
pub fn rank(mut assets: Vec<CuratedAsset>) -> Vec<CuratedAsset> {
    assets.sort_by(compare);
    for (i, asset) in assets.iter_mut().enumerate() {
        asset.global_rank = i + 1;
    }
    assets
}

/// Asset count per visual type
pub fn coverage_balance(assets: &[CuratedAsset]) -> BTreeMap<VisualType, u32> {
    let mut balance = BTreeMap::new();
    for asset in assets {
        *balance.entry(asset.visual_type).or_insert(0) += 1;
    }
    balance
}

/// Unmet requirements, in visual type order
pub fn deficits(
    balance: &BTreeMap<VisualType, u32>,
    requirements: &CoverageRequirements,
) -> Vec<Deficit> {
    requirements
        .iter()
        .filter_map(|(visual_type, requirement)| {
            let have = balance.get(visual_type).copied().unwrap_or(0);
            let shortfall = requirement.min_assets.saturating_sub(have);
            (shortfall > 0).then_some(Deficit {
                visual_type: *visual_type,
                shortfall,
            })
        })
        .collect()
}
