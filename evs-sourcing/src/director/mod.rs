//! Query Director
//!
//! Collapses the per-scene search queries of a shot plan into a small set of
//! deduplicated, prioritized strategic queries and derives the episode's
//! coverage requirements.
//!
//! # Algorithm
//! 1. Normalize every raw query and group identical texts across scenes,
//!    merging the scenes each group serves (first-appearance order)
//! 2. Visual type: rule table on the query text, else the highest-weighted
//!    hint among the served scenes, else `other`
//! 3. Rank by priority weight, then scenes served, then first appearance
//! 4. Keep the `max_queries` highest-ranked queries
//! 5. Number the survivors `sq_01`, `sq_02`, … in rank order
//!
//! The director never fails: a plan without any usable query yields one
//! fallback query covering every scene.

pub mod coverage;
pub mod diagnostics;

pub use coverage::coverage_requirements;

use evs_common::config::DirectorSettings;
use evs_common::documents::{DirectorOutput, QueryDedupeReport, Scene, ShotPlan, StrategicQuery};
use evs_common::text::normalize_query;
use evs_common::VisualType;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Query used when neither the topic nor any scene keywords are available
pub const LAST_RESORT_QUERY: &str = "historical archive footage";

/// Identical normalized queries merged across scenes
#[derive(Debug, Clone)]
struct QueryGroup {
    text: String,
    first_seen: usize,
    scene_ids: Vec<String>,
    visual_type: VisualType,
    from_text: bool,
}

/// Query director with its tuning knobs
#[derive(Debug, Clone, Default)]
pub struct QueryDirector {
    settings: DirectorSettings,
}

impl QueryDirector {
    pub fn new(settings: DirectorSettings) -> Self {
        Self { settings }
    }

    /// Effective query cap (at least one)
    pub fn max_queries(&self) -> usize {
        self.settings.max_queries.max(1)
    }

    /// Build strategic queries, coverage requirements and diagnostics
    pub fn build_strategic_queries(&self, plan: &ShotPlan) -> DirectorOutput {
        let raw_count = plan
            .scenes
            .iter()
            .flat_map(|s| s.search_queries.iter())
            .filter(|q| !normalize_query(q).is_empty())
            .count();

        let mut groups = group_queries(&plan.scenes);
        let unique_count = groups.len();

        let texts: Vec<&str> = groups.iter().map(|g| g.text.as_str()).collect();
        let types: Vec<VisualType> = groups.iter().map(|g| g.visual_type).collect();
        let mut report = QueryDedupeReport {
            raw_count,
            unique_count,
            duplicate_rate: diagnostics::duplicate_rate(raw_count, unique_count),
            near_duplicate_pairs: diagnostics::near_duplicate_pairs(&texts),
            dominant_visual_type_share: diagnostics::dominant_type_share(&types),
            capped_count: 0,
        };

        if groups.is_empty() {
            let text = fallback_query_text(plan);
            warn!(query = %text, "Shot plan has no search queries, using fallback query");
            groups.push(QueryGroup {
                text,
                first_seen: 0,
                scene_ids: plan.scenes.iter().map(|s| s.scene_id.clone()).collect(),
                visual_type: VisualType::Other,
                from_text: false,
            });
        }

        rank_groups(&mut groups);
        groups.truncate(self.max_queries());
        report.capped_count = unique_count.saturating_sub(groups.len());
        if report.capped_count > 0 {
            debug!(
                capped = report.capped_count,
                max_queries = self.max_queries(),
                "Lowest-ranked queries dropped by the cap"
            );
        }

        let strategic_queries: Vec<StrategicQuery> = groups
            .into_iter()
            .enumerate()
            .map(|(i, group)| to_strategic_query(i + 1, group))
            .collect();

        self.log_diagnostics(&report);

        let coverage_requirements = coverage_requirements(&plan.scenes);

        info!(
            scenes = plan.scenes.len(),
            raw_queries = report.raw_count,
            unique_queries = report.unique_count,
            strategic_queries = strategic_queries.len(),
            requirements = coverage_requirements.len(),
            "Strategic queries built"
        );

        DirectorOutput {
            strategic_queries,
            coverage_requirements,
            dedupe_report: report,
        }
    }

    fn log_diagnostics(&self, report: &QueryDedupeReport) {
        if report.duplicate_rate > self.settings.duplicate_rate_warning {
            warn!(
                duplicate_rate = report.duplicate_rate,
                threshold = self.settings.duplicate_rate_warning,
                raw = report.raw_count,
                unique = report.unique_count,
                "High query duplication in shot plan"
            );
        }
        if report.unique_count > 1
            && report.dominant_visual_type_share > self.settings.dominant_type_warning
        {
            warn!(
                share = report.dominant_visual_type_share,
                threshold = self.settings.dominant_type_warning,
                "Template explosion: one visual type dominates the queries"
            );
        }
        if report.near_duplicate_pairs > 0 {
            debug!(pairs = report.near_duplicate_pairs, "Near-duplicate queries kept separate");
        }
        if report.capped_count > 0 {
            info!(
                dropped = report.capped_count,
                max_queries = self.max_queries(),
                "Query cap applied"
            );
        }
    }
}

/// Group identical normalized queries in first-appearance order
fn group_queries(scenes: &[Scene]) -> Vec<QueryGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<QueryGroup> = Vec::new();

    for scene in scenes {
        for raw in &scene.search_queries {
            let text = normalize_query(raw);
            if text.is_empty() {
                continue;
            }
            match index.get(&text) {
                Some(&i) => {
                    let group = &mut groups[i];
                    if !group.scene_ids.contains(&scene.scene_id) {
                        group.scene_ids.push(scene.scene_id.clone());
                    }
                }
                None => {
                    index.insert(text.clone(), groups.len());
                    groups.push(QueryGroup {
                        first_seen: groups.len(),
                        text,
                        scene_ids: vec![scene.scene_id.clone()],
                        visual_type: VisualType::Other,
                        from_text: false,
                    });
                }
            }
        }
    }

    let hints_by_scene: HashMap<&str, &[VisualType]> = scenes
        .iter()
        .map(|s| (s.scene_id.as_str(), s.visual_type_hints.as_slice()))
        .collect();

    for group in &mut groups {
        if let Some(visual_type) = VisualType::classify(&group.text) {
            group.visual_type = visual_type;
            group.from_text = true;
        } else {
            let hinted: BTreeSet<VisualType> = group
                .scene_ids
                .iter()
                .filter_map(|id| hints_by_scene.get(id.as_str()))
                .flat_map(|hints| hints.iter().copied())
                .collect();
            // Highest weight wins; BTreeSet order breaks ties
            group.visual_type = hinted
                .into_iter()
                .rev()
                .max_by_key(|t| t.priority_weight())
                .unwrap_or(VisualType::Other);
        }
    }

    groups
}

/// Priority desc, scenes served desc, first appearance asc
fn rank_groups(groups: &mut [QueryGroup]) {
    groups.sort_by(|a, b| {
        b.visual_type
            .priority_weight()
            .cmp(&a.visual_type.priority_weight())
            .then_with(|| b.scene_ids.len().cmp(&a.scene_ids.len()))
            .then_with(|| a.first_seen.cmp(&b.first_seen))
    });
}

fn to_strategic_query(position: usize, group: QueryGroup) -> StrategicQuery {
    let source = if group.from_text {
        "query text"
    } else {
        "scene hints"
    };
    let reasoning = format!(
        "serves {} scene(s) ({}); {} from {}; priority {}",
        group.scene_ids.len(),
        group.scene_ids.join(", "),
        group.visual_type,
        source,
        group.visual_type.priority_weight()
    );

    StrategicQuery {
        query_id: format!("sq_{:02}", position),
        priority: group.visual_type.priority_weight(),
        query_text: group.text,
        visual_type: group.visual_type,
        intended_scene_ids: group.scene_ids,
        reasoning,
    }
}

/// Topic, else the first scene keywords, else [`LAST_RESORT_QUERY`]
fn fallback_query_text(plan: &ShotPlan) -> String {
    if let Some(topic) = plan.episode_topic.as_deref() {
        let topic = normalize_query(topic);
        if !topic.is_empty() {
            return topic;
        }
    }
    plan.scenes
        .iter()
        .map(|s| normalize_query(&s.keywords.join(" ")))
        .find(|k| !k.is_empty())
        .unwrap_or_else(|| LAST_RESORT_QUERY.to_string())
}
