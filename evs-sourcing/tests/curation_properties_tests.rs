//! Order independence, monotonic coverage, query capping and assignment uniqueness

mod helpers;

use evs_common::config::{CuratorSettings, DirectorSettings};
use evs_common::documents::{Candidate, CurationOutput, DirectorOutput, ShotPlan};
use evs_common::VisualType;
use evs_sourcing::director::LAST_RESORT_QUERY;
use evs_sourcing::search::Provider;
use evs_sourcing::{Curator, EpisodePipeline, QueryDirector, SourcePackBuilder};
use helpers::*;
use std::collections::HashSet;
use std::sync::Arc;

async fn napoleon_candidates() -> (ShotPlan, DirectorOutput, Vec<Candidate>) {
    let (alpha, beta, gamma) = napoleon_providers();
    let providers: Vec<Arc<dyn Provider>> = vec![alpha, beta, gamma];
    let plan = napoleon_plan();
    let run = EpisodePipeline::new(test_config(None), providers)
        .run(&plan)
        .await
        .unwrap();
    let candidates = run.search.candidates();
    (plan, run.director, candidates)
}

fn curate(plan: &ShotPlan, director: &DirectorOutput, candidates: &[Candidate]) -> CurationOutput {
    Curator::new(CuratorSettings::default())
        .with_query_plan(&director.strategic_queries)
        .curate(candidates, &plan.scenes, &director.coverage_requirements)
        .unwrap()
}

#[tokio::test]
async fn test_curation_ignores_candidate_order() {
    let (plan, director, candidates) = napoleon_candidates().await;
    let baseline = serde_json::to_string(&curate(&plan, &director, &candidates)).unwrap();

    let mut reversed = candidates.clone();
    reversed.reverse();
    assert_eq!(
        serde_json::to_string(&curate(&plan, &director, &reversed)).unwrap(),
        baseline
    );

    for shift in [1, 7, 13] {
        let mut rotated = candidates.clone();
        rotated.rotate_left(shift);
        assert_eq!(
            serde_json::to_string(&curate(&plan, &director, &rotated)).unwrap(),
            baseline,
            "rotation by {} changed the output",
            shift
        );
    }

    // Interleave from both ends
    let mut interleaved = Vec::with_capacity(candidates.len());
    let (mut lo, mut hi) = (0, candidates.len());
    while lo < hi {
        interleaved.push(candidates[lo].clone());
        lo += 1;
        if lo < hi {
            hi -= 1;
            interleaved.push(candidates[hi].clone());
        }
    }
    assert_eq!(
        serde_json::to_string(&curate(&plan, &director, &interleaved)).unwrap(),
        baseline
    );
}

#[tokio::test]
async fn test_shortfall_never_shrinks_with_fewer_candidates() {
    let (plan, director, candidates) = napoleon_candidates().await;

    let mut previous: Option<CurationOutput> = None;
    for keep in (0..=candidates.len()).rev().step_by(3) {
        let output = curate(&plan, &director, &candidates[..keep]);
        if let Some(larger) = &previous {
            for visual_type in VisualType::ALL {
                assert!(
                    output.shortfall(visual_type) >= larger.shortfall(visual_type),
                    "{} shortfall dropped from {} to {} when keeping {} candidates",
                    visual_type,
                    larger.shortfall(visual_type),
                    output.shortfall(visual_type),
                    keep
                );
            }
        }
        previous = Some(output);
    }

    let empty = curate(&plan, &director, &[]);
    for (visual_type, requirement) in &director.coverage_requirements {
        assert_eq!(empty.shortfall(*visual_type), requirement.min_assets);
    }
}

#[tokio::test]
async fn test_raising_min_assets_never_lowers_shortfall() {
    let (plan, director, candidates) = napoleon_candidates().await;
    let subset = &candidates[..10];

    let mut raised = director.clone();
    let mut previous = curate(&plan, &raised, subset);
    for _ in 0..4 {
        for requirement in raised.coverage_requirements.values_mut() {
            requirement.min_assets += 2;
        }
        let output = curate(&plan, &raised, subset);
        for visual_type in raised.coverage_requirements.keys() {
            assert!(output.shortfall(*visual_type) >= previous.shortfall(*visual_type));
        }
        previous = output;
    }
    assert!(!previous.deficits.is_empty());
}

#[tokio::test]
async fn test_no_asset_assigned_twice_for_any_subset() {
    let (plan, director, candidates) = napoleon_candidates().await;

    for keep in [0, 1, 2, 5, 11, 17, 23, 30] {
        let keep = keep.min(candidates.len());
        let curation = curate(&plan, &director, &candidates[..keep]);
        let pack = SourcePackBuilder::new()
            .with_curator_deficits(&curation.deficits)
            .build(&curation.curated_assets, &plan.scenes)
            .unwrap();

        let mut seen = HashSet::new();
        for scene in &pack.scene_assignments {
            for slot in scene.all_slots() {
                assert!(
                    seen.insert(slot.source_id.clone()),
                    "{} reused with {} candidates",
                    slot.source_id,
                    keep
                );
            }
            assert_eq!(scene.has_deficit, scene.asset_count() == 0);
        }
        assert_eq!(seen.len(), pack.episode_asset_pool.len());
    }
}

#[test]
fn test_query_cap_keeps_highest_ranked_prefix() {
    let queries = [
        ("s1", "portrait of napoleon"),
        ("s2", "portrait of wellington"),
        ("s3", "portrait of nelson"),
        ("s4", "treaty of amiens"),
        ("s5", "battle of austerlitz"),
        ("s6", "map of the continental system"),
        ("s7", "old coin of the empire"),
        ("s8", "mountain pass in the alps"),
        ("s9", "smoke and fog background"),
        ("s10", "portrait of talleyrand"),
        ("s11", "letter from the emperor"),
        ("s12", "battle of borodino"),
    ];
    let plan = ShotPlan {
        episode_topic: None,
        scenes: queries
            .iter()
            .enumerate()
            .map(|(i, (id, q))| scene(id, i as f64 * 5.0, &[], &[*q]))
            .collect(),
    };

    let build = |cap: usize| {
        QueryDirector::new(DirectorSettings {
            max_queries: cap,
            ..Default::default()
        })
        .build_strategic_queries(&plan)
    };
    let full: Vec<String> = build(queries.len())
        .strategic_queries
        .iter()
        .map(|q| q.query_text.clone())
        .collect();
    assert_eq!(full.len(), queries.len());

    for cap in [1, 4, 8, 12, 20] {
        let output = build(cap);

        let expected = cap.min(queries.len());
        assert_eq!(output.strategic_queries.len(), expected);
        assert_eq!(output.dedupe_report.capped_count, queries.len() - expected);

        let texts: Vec<String> = output
            .strategic_queries
            .iter()
            .map(|q| q.query_text.clone())
            .collect();
        assert_eq!(texts, full[..expected].to_vec(), "cap {} is not a ranking prefix", cap);

        let priorities: Vec<u32> = output.strategic_queries.iter().map(|q| q.priority).collect();
        assert!(priorities.windows(2).all(|w| w[0] >= w[1]));

        let ids: Vec<String> = output
            .strategic_queries
            .iter()
            .map(|q| q.query_id.clone())
            .collect();
        let numbered: Vec<String> = (1..=expected).map(|i| format!("sq_{:02}", i)).collect();
        assert_eq!(ids, numbered);
    }

    // Four portraits outrank everything else
    let top_four = build(4);
    assert!(top_four
        .strategic_queries
        .iter()
        .all(|q| q.visual_type == VisualType::Portrait));
    assert_eq!(top_four.strategic_queries[0].query_text, "portrait of napoleon");
}

#[test]
fn test_director_falls_back_without_queries() {
    let mut plan = ShotPlan {
        episode_topic: Some("  The Hundred Days ".to_string()),
        scenes: vec![scene("s1", 0.0, &[VisualType::Map], &[]), scene("s2", 5.0, &[], &["   "])],
    };

    let output = QueryDirector::default().build_strategic_queries(&plan);
    assert_eq!(output.strategic_queries.len(), 1);
    assert_eq!(output.strategic_queries[0].query_text, "the hundred days");
    assert_eq!(
        output.strategic_queries[0].intended_scene_ids,
        vec!["s1".to_string(), "s2".to_string()]
    );
    assert_eq!(output.dedupe_report.raw_count, 0);

    plan.episode_topic = None;
    let output = QueryDirector::default().build_strategic_queries(&plan);
    assert_eq!(output.strategic_queries[0].query_text, LAST_RESORT_QUERY);
}
