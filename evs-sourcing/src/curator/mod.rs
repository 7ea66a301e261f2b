//! Visual Curator
//!
//! Turns the search adapter's candidates into a deduplicated, classified,
//! globally ranked asset list with a coverage analysis.
//!
//! # Stages
//! 1. License re-check (a non-whitelisted candidate here is fatal)
//! 2. Pre-filter on relevance, quality and generic titles
//! 3. Fingerprint dedup, then a `source_id` pass; the best composite score
//!    survives and inherits the group's recommended scenes
//! 4. Classification with the visual type rule table
//! 5. Scene recommendations
//! 6. Global ranking and coverage deficits
//!
//! Output depends only on the candidate set, not its order.

pub mod fingerprint;
pub mod prefilter;
pub mod ranking;

use crate::error::{SourcingError, SourcingResult};
use evs_common::config::CuratorSettings;
use evs_common::documents::{
    Candidate, CoverageRequirements, CuratedAsset, CurationDedupeReport, CurationOutput, Scene,
    StrategicQuery,
};
use evs_common::text::content_words;
use evs_common::{License, VisualType};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, error, info, warn};

/// Candidates sharing one identity, reduced to the best member
#[derive(Debug, Clone)]
struct DedupGroup {
    best: Candidate,
    query_ids: BTreeSet<String>,
}

impl DedupGroup {
    fn new(candidate: Candidate) -> Self {
        let mut query_ids = BTreeSet::new();
        query_ids.insert(candidate.query_source_id.clone());
        Self {
            best: candidate,
            query_ids,
        }
    }

    fn absorb(&mut self, other: DedupGroup) {
        self.query_ids.extend(other.query_ids);
        if prefer(&other.best, &self.best) == Ordering::Less {
            self.best = other.best;
        }
    }
}

/// `Less` when `a` should survive over `b`
fn prefer(a: &Candidate, b: &Candidate) -> Ordering {
    b.composite_score()
        .total_cmp(&a.composite_score())
        .then_with(|| a.query_source_id.cmp(&b.query_source_id))
        .then_with(|| a.url.cmp(&b.url))
}

/// Merge groups sharing `key`, order-independently
fn merge_by<F>(groups: Vec<DedupGroup>, key: F) -> Vec<DedupGroup>
where
    F: Fn(&Candidate) -> String,
{
    let mut merged: HashMap<String, DedupGroup> = HashMap::with_capacity(groups.len());
    for group in groups {
        let k = key(&group.best);
        match merged.get_mut(&k) {
            Some(existing) => existing.absorb(group),
            None => {
                merged.insert(k, group);
            }
        }
    }
    merged.into_values().collect()
}

/// Visual curator
#[derive(Debug, Clone, Default)]
pub struct Curator {
    settings: CuratorSettings,
    allow_unknown_licenses: bool,
    /// query_id → scenes the query was planned for
    query_scenes: HashMap<String, Vec<String>>,
}

impl Curator {
    pub fn new(settings: CuratorSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Accept `unknown` licenses (the search adapter's explicit override)
    pub fn with_unknown_licenses(mut self, allow: bool) -> Self {
        self.allow_unknown_licenses = allow;
        self
    }

    /// Recommend each asset for the scenes its producing queries were planned for
    pub fn with_query_plan(mut self, queries: &[StrategicQuery]) -> Self {
        self.query_scenes = queries
            .iter()
            .map(|q| (q.query_id.clone(), q.intended_scene_ids.clone()))
            .collect();
        self
    }

    fn license_allowed(&self, license: License) -> bool {
        license.is_whitelisted() || (self.allow_unknown_licenses && license == License::Unknown)
    }

    /// Curate candidates against the scenes and coverage requirements
    ///
    /// # Errors
    /// [`SourcingError::LicenseGateBypass`] when a candidate with a
    /// non-whitelisted license arrives. Everything else is reported in the
    /// output, never raised.
    pub fn curate(
        &self,
        candidates: &[Candidate],
        scenes: &[Scene],
        coverage: &CoverageRequirements,
    ) -> SourcingResult<CurationOutput> {
        if let Some(bad) = candidates.iter().find(|c| !self.license_allowed(c.license)) {
            error!(
                source_id = %bad.source_id,
                license = %bad.license,
                "Non-whitelisted license reached the curator"
            );
            return Err(SourcingError::LicenseGateBypass {
                source_id: bad.source_id.clone(),
                license: bad.license,
            });
        }

        let mut prefilter_rejected = 0;
        let mut groups = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match prefilter::check(candidate, &self.settings) {
                Ok(()) => groups.push(DedupGroup::new(candidate.clone())),
                Err(reason) => {
                    debug!(
                        source_id = %candidate.source_id,
                        %reason,
                        "Pre-filter rejected candidate"
                    );
                    prefilter_rejected += 1;
                }
            }
        }
        let passed = groups.len();

        let groups = merge_by(groups, fingerprint::fingerprint);
        let groups = merge_by(groups, |c| c.source_id.clone());
        let duplicates_removed = passed - groups.len();

        let ordered_scenes = evs_common::documents::scene::scenes_in_time_order(scenes);
        let assets: Vec<CuratedAsset> = groups
            .into_iter()
            .map(|group| self.to_curated(group, &ordered_scenes))
            .collect();
        let curated_assets = ranking::rank(assets);

        let coverage_balance = ranking::coverage_balance(&curated_assets);
        let deficits = ranking::deficits(&coverage_balance, coverage);

        for deficit in &deficits {
            warn!(
                visual_type = %deficit.visual_type,
                shortfall = deficit.shortfall,
                "Coverage deficit"
            );
        }

        let dedupe_report = CurationDedupeReport {
            total_candidates: candidates.len(),
            prefilter_rejected,
            unique_assets: curated_assets.len(),
            duplicates_removed,
        };

        info!(
            candidates = dedupe_report.total_candidates,
            rejected = dedupe_report.prefilter_rejected,
            duplicates = dedupe_report.duplicates_removed,
            unique = dedupe_report.unique_assets,
            deficits = deficits.len(),
            "Curation complete"
        );

        Ok(CurationOutput {
            curated_assets,
            coverage_balance,
            deficits,
            dedupe_report,
        })
    }

    fn to_curated(&self, group: DedupGroup, scenes: &[&Scene]) -> CuratedAsset {
        let candidate = group.best;
        let text = format!("{} {}", candidate.title, candidate.description);
        let visual_type = VisualType::classify_or_other(&text);
        let asset_words = content_words(&text);

        let planned: BTreeSet<&str> = group
            .query_ids
            .iter()
            .filter_map(|id| self.query_scenes.get(id))
            .flat_map(|ids| ids.iter().map(String::as_str))
            .collect();

        let recommended_scene_ids = scenes
            .iter()
            .filter(|scene| {
                planned.contains(scene.scene_id.as_str())
                    || shares_word(&asset_words, &scene.keywords.join(" "))
                    || (scene.hints(visual_type)
                        && shares_word(&asset_words, &scene.narration_text))
            })
            .map(|scene| scene.scene_id.clone())
            .collect();

        CuratedAsset {
            global_rank: 0,
            global_score: candidate.composite_score(),
            fingerprint: fingerprint::fingerprint(&candidate),
            visual_type,
            recommended_scene_ids,
            candidate,
        }
    }
}

fn shares_word(asset_words: &BTreeSet<String>, text: &str) -> bool {
    let other = content_words(text);
    asset_words.intersection(&other).next().is_some()
}
