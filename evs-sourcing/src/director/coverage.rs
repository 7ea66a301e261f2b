//! Episode coverage requirements derived from scene hints

use evs_common::documents::{CoverageRequirement, CoverageRequirements, Scene};
use evs_common::VisualType;
use std::collections::{BTreeMap, BTreeSet};

/// Per-type requirements from the scenes' visual hints
///
/// For every hinted type: `min_assets = max(floor, ceil(hint_count * ratio))`.
/// A scene hinting the same type twice counts once.
pub fn coverage_requirements(scenes: &[Scene]) -> CoverageRequirements {
    let mut counts: BTreeMap<VisualType, u32> = BTreeMap::new();
    for scene in scenes {
        let distinct: BTreeSet<VisualType> = scene.visual_type_hints.iter().copied().collect();
        for visual_type in distinct {
            *counts.entry(visual_type).or_insert(0) += 1;
        }
    }

    let total = scenes.len();
    counts
        .into_iter()
        .map(|(visual_type, count)| {
            let scaled = (count as f64 * visual_type.coverage_ratio()).ceil() as u32;
            let requirement = CoverageRequirement {
                min_assets: scaled.max(visual_type.coverage_floor()),
                reason: format!("{} of {} scenes hint {}", count, total, visual_type),
            };
            (visual_type, requirement)
        })
        .collect()
}
