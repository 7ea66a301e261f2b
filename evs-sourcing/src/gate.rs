//! Coverage Gate
//!
//! The check a compilation consumer applies before rendering: refuse when too
//! few scenes have at least one real asset. This is the only place an episode
//! fails for lack of visuals.

use crate::error::{SourcingError, SourcingResult};
use evs_common::config::GateSettings;
use evs_common::documents::{Deficit, SourcePack};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Coverage figures of an accepted pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub scenes_total: usize,
    pub scenes_covered: usize,
    pub coverage_pct: f64,
    pub deficits: Vec<Deficit>,
}

/// Minimum-coverage gate
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageGate {
    min_coverage_ratio: f64,
}

impl Default for CoverageGate {
    fn default() -> Self {
        Self::from_settings(&GateSettings::default())
    }
}

impl CoverageGate {
    pub fn new(min_coverage_ratio: f64) -> Self {
        Self {
            min_coverage_ratio: min_coverage_ratio.clamp(0.0, 1.0),
        }
    }

    pub fn from_settings(settings: &GateSettings) -> Self {
        Self::new(settings.min_coverage_ratio)
    }

    pub fn min_coverage_ratio(&self) -> f64 {
        self.min_coverage_ratio
    }

    /// Accept or refuse a source pack
    ///
    /// Refused when the covered-scene ratio is below the minimum or when no
    /// scene is covered at all (including a pack with no scenes).
    pub fn check(
        &self,
        pack: &SourcePack,
        deficits: &[Deficit],
    ) -> SourcingResult<CoverageSummary> {
        let scenes_total = pack.scene_assignments.len();
        let scenes_covered = pack.scenes_covered();
        let ratio = pack.coverage_ratio();
        let coverage_pct = ratio * 100.0;

        if scenes_covered == 0 || ratio < self.min_coverage_ratio {
            error!(
                coverage_pct,
                min_coverage_pct = self.min_coverage_ratio * 100.0,
                scenes_covered,
                scenes_total,
                deficits = deficits.len(),
                "Coverage gate refused source pack"
            );
            return Err(SourcingError::InsufficientCoverage {
                coverage_pct,
                min_coverage_pct: self.min_coverage_ratio * 100.0,
                scenes_covered,
                scenes_total,
                deficits: deficits.to_vec(),
            });
        }

        info!(coverage_pct, scenes_covered, scenes_total, "Coverage gate passed");
        Ok(CoverageSummary {
            scenes_total,
            scenes_covered,
            coverage_pct,
            deficits: deficits.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evs_common::documents::{AssetSlot, SceneAssignment};
    use evs_common::VisualType;

    fn pack(covered: usize, total: usize) -> SourcePack {
        let scene_assignments = (0..total)
            .map(|i| {
                let primary_assets = if i < covered {
                    vec![AssetSlot {
                        source_id: format!("wikimedia:{}", i),
                        global_rank: i + 1,
                        visual_type: VisualType::Map,
                    }]
                } else {
                    vec![]
                };
                SceneAssignment {
                    scene_id: format!("s{}", i),
                    has_deficit: primary_assets.is_empty(),
                    primary_assets,
                    secondary_assets: vec![],
                    texture_assets: vec![],
                }
            })
            .collect();
        SourcePack {
            scene_assignments,
            ..Default::default()
        }
    }

    #[test]
    fn test_passes_at_threshold() {
        let summary = CoverageGate::default().check(&pack(3, 6), &[]).unwrap();
        assert_eq!(summary.scenes_covered, 3);
        assert!((summary.coverage_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_refuses_below_threshold_with_deficits() {
        let deficits = vec![Deficit {
            visual_type: VisualType::Portrait,
            shortfall: 2,
        }];
        let err = CoverageGate::default().check(&pack(2, 6), &deficits).unwrap_err();
        match err {
            SourcingError::InsufficientCoverage {
                scenes_covered,
                scenes_total,
                deficits,
                ..
            } => {
                assert_eq!(scenes_covered, 2);
                assert_eq!(scenes_total, 6);
                assert_eq!(deficits.len(), 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_zero_coverage_always_refused() {
        let gate = CoverageGate::new(0.0);
        assert!(gate.check(&pack(0, 4), &[]).is_err());
        assert!(gate.check(&SourcePack::default(), &[]).is_err());
    }
}
