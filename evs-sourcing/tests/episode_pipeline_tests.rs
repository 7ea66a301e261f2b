//! End-to-end pipeline tests over in-process providers

mod helpers;

use evs_common::documents::{SourcePack, StrategicQuery};
use evs_common::VisualType;
use evs_sourcing::search::{Provider, ProviderError};
use evs_sourcing::workflow::pipeline::{
    CURATED_ASSETS_FILE, SEARCH_RESULTS_FILE, SOURCE_PACK_FILE, STRATEGIC_QUERIES_FILE,
};
use evs_sourcing::workflow::Stage;
use evs_sourcing::{CoverageGate, EpisodePipeline, PipelineEvent, PipelineRun, SourcingError};
use helpers::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;

fn registry() -> Vec<Arc<dyn Provider>> {
    let (alpha, beta, gamma) = napoleon_providers();
    vec![alpha, beta, gamma]
}

async fn napoleon_run() -> PipelineRun {
    EpisodePipeline::new(test_config(None), registry())
        .run(&napoleon_plan())
        .await
        .expect("pipeline run")
}

fn assert_no_asset_reuse(pack: &SourcePack) {
    let mut owner: HashMap<&str, &str> = HashMap::new();
    for scene in &pack.scene_assignments {
        for slot in scene.all_slots() {
            if let Some(previous) = owner.insert(slot.source_id.as_str(), scene.scene_id.as_str()) {
                panic!(
                    "{} used by {} and {}",
                    slot.source_id, previous, scene.scene_id
                );
            }
        }
    }
    assert!(pack.find_duplicate_use().is_none());
}

#[tokio::test]
async fn test_napoleon_episode_end_to_end() {
    let (alpha, beta, gamma) = napoleon_providers();
    assert_eq!(
        alpha.result_count() + beta.result_count() + gamma.result_count(),
        33
    );

    let run = napoleon_run().await;

    // Director: six distinct queries, portraits first
    let queries: Vec<&StrategicQuery> = run.director.strategic_queries.iter().collect();
    assert_eq!(queries.len(), 6);
    assert_eq!(queries[0].query_id, "sq_01");
    assert_eq!(queries[0].query_text, "portrait of napoleon");
    assert_eq!(queries[1].query_text, "portrait of josephine");
    assert_eq!(queries[0].visual_type, VisualType::Portrait);
    assert_eq!(queries[5].visual_type, VisualType::Map);
    assert_eq!(run.director.dedupe_report.capped_count, 0);

    // Search: 30 license-safe, 3 rejected by the gate
    let summary = &run.search.summary;
    assert_eq!(summary.queries_total, 6);
    assert_eq!(summary.queries_successful, 6);
    assert_eq!(summary.candidates_total, 30);
    assert_eq!(summary.license_rejected, 3);
    assert!(!summary.budget_exhausted);
    assert!(run
        .search
        .candidates()
        .iter()
        .all(|c| c.license.is_whitelisted()));

    // Curation: five duplicates collapse onto the shared engraving
    let report = &run.curation.dedupe_report;
    assert_eq!(report.total_candidates, 30);
    assert_eq!(report.prefilter_rejected, 0);
    assert_eq!(report.duplicates_removed, 5);
    assert_eq!(report.unique_assets, 25);
    assert_eq!(run.curation.curated_assets.len(), 25);
    let shared = format!("gamma:{}", SHARED_NATIVE_ID);
    assert_eq!(
        run.curation
            .curated_assets
            .iter()
            .filter(|a| a.source_id() == shared)
            .count(),
        1
    );
    let ranks: Vec<usize> = run.curation.curated_assets.iter().map(|a| a.global_rank).collect();
    assert_eq!(ranks, (1..=25).collect::<Vec<_>>());
    assert!(run.curation.deficits.is_empty());
    assert!(run
        .curation
        .curated_assets
        .iter()
        .all(|a| a.candidate.license.is_whitelisted()));

    // Source pack: every scene covered by its hinted type, nothing reused
    let pack = &run.source_pack;
    assert_eq!(pack.scene_assignments.len(), 6);
    let plan = napoleon_plan();
    for (assignment, scene) in pack.scene_assignments.iter().zip(&plan.scenes) {
        assert_eq!(assignment.scene_id, scene.scene_id);
        assert!(!assignment.has_deficit);
        assert_eq!(assignment.primary_assets.len(), 1);
        assert!(scene.hints(assignment.primary_assets[0].visual_type));
        assert!(scene.hints(assignment.secondary_assets[0].visual_type));
    }
    assert_no_asset_reuse(pack);
    assert_eq!(pack.episode_asset_pool.len(), 18);
    assert_eq!(
        pack.episode_asset_pool.len()
            + pack.fallback_pools.texture_pool.len()
            + pack.fallback_pools.emergency_pool.len(),
        25
    );
    assert!(pack.warnings.is_empty(), "warnings: {:?}", pack.warnings);

    let gate = run.check_coverage(&CoverageGate::default()).unwrap();
    assert_eq!(gate.scenes_covered, 6);
    assert!((gate.coverage_pct - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_all_providers_failing_yields_deficits_and_gate_refusal() {
    let providers: Vec<Arc<dyn Provider>> = vec![
        Arc::new(FailingProvider::new(
            "alpha",
            ProviderError::Api(503, "unavailable".to_string()),
        )),
        Arc::new(FailingProvider::new(
            "beta",
            ProviderError::Network("dns failure".to_string()),
        )),
    ];

    let run = EpisodePipeline::new(test_config(None), providers)
        .run(&napoleon_plan())
        .await
        .expect("provider failures are not fatal");

    assert_eq!(run.search.summary.queries_successful, 0);
    assert_eq!(run.search.summary.candidates_total, 0);
    assert!(run.curation.curated_assets.is_empty());
    assert_eq!(
        run.curation.shortfall(VisualType::Portrait),
        2,
        "two portrait scenes need two portraits"
    );

    let pack = &run.source_pack;
    assert!(pack.scene_assignments.iter().all(|s| s.has_deficit));
    assert!(pack.scene_assignments.iter().all(|s| s.asset_count() == 0));
    assert!(pack.episode_asset_pool.is_empty());
    assert_eq!(
        pack.warnings
            .iter()
            .filter(|w| w.starts_with("[deficit]"))
            .count(),
        6
    );
    assert!(pack.warnings.iter().any(|w| w.starts_with("[coverage]")));

    match run.check_coverage(&CoverageGate::default()) {
        Err(SourcingError::InsufficientCoverage {
            scenes_covered,
            scenes_total,
            deficits,
            ..
        }) => {
            assert_eq!(scenes_covered, 0);
            assert_eq!(scenes_total, 6);
            assert!(!deficits.is_empty());
        }
        other => panic!("expected coverage refusal, got {:?}", other),
    }
}

#[tokio::test]
async fn test_one_failing_provider_only_loses_its_own_results() {
    let (alpha, _, _) = napoleon_providers();
    let providers: Vec<Arc<dyn Provider>> = vec![
        Arc::new(FailingProvider::new(
            "broken",
            ProviderError::Parse("unexpected html".to_string()),
        )),
        alpha,
    ];

    let run = EpisodePipeline::new(test_config(None), providers)
        .run(&napoleon_plan())
        .await
        .unwrap();

    assert_eq!(run.search.summary.queries_successful, 6);
    assert_eq!(run.search.summary.candidates_total, 12);
    assert!(run
        .search
        .candidates()
        .iter()
        .all(|c| c.provider == "alpha"));
    assert!(run.source_pack.scene_assignments.iter().all(|s| !s.has_deficit));
}

#[tokio::test]
async fn test_identical_inputs_produce_identical_documents() {
    let first = napoleon_run().await;
    let second = napoleon_run().await;

    assert_eq!(
        serde_json::to_string(&first.director).unwrap(),
        serde_json::to_string(&second.director).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first.search).unwrap(),
        serde_json::to_string(&second.search).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first.curation).unwrap(),
        serde_json::to_string(&second.curation).unwrap()
    );
    assert_eq!(
        first.source_pack.to_json_pretty().unwrap(),
        second.source_pack.to_json_pretty().unwrap()
    );
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn test_write_documents_round_trip() {
    let run = napoleon_run().await;
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("episode_01");

    let written = run.write_documents(&out_dir).await.unwrap();
    assert_eq!(written.len(), 4);

    for name in [
        STRATEGIC_QUERIES_FILE,
        SEARCH_RESULTS_FILE,
        CURATED_ASSETS_FILE,
        SOURCE_PACK_FILE,
    ] {
        assert!(out_dir.join(name).exists(), "{} missing", name);
    }

    let json = std::fs::read_to_string(out_dir.join(SOURCE_PACK_FILE)).unwrap();
    let pack: SourcePack = serde_json::from_str(&json).unwrap();
    assert_eq!(pack, run.source_pack);
}

#[tokio::test]
async fn test_progress_events_follow_stage_order() {
    let (tx, mut rx) = mpsc::channel(256);
    let pipeline = EpisodePipeline::new(test_config(None), registry()).with_events(tx);
    pipeline.run(&napoleon_plan()).await.unwrap();
    drop(pipeline);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    let stages: Vec<Stage> = events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::StageStarted { stage } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![Stage::Plan, Stage::Search, Stage::Curate, Stage::Assign]
    );

    let searched: HashSet<String> = events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::QuerySearched { query_id, .. } => Some(query_id.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(searched.len(), 6);

    assert!(events.contains(&PipelineEvent::CurationCompleted {
        unique_assets: 25,
        deficits: 0,
    }));
    assert_eq!(
        events.last(),
        Some(&PipelineEvent::PackBuilt {
            scenes_covered: 6,
            scenes_total: 6,
            warnings: 0,
        })
    );
}

#[tokio::test]
async fn test_invalid_shot_plan_is_fatal() {
    let mut plan = napoleon_plan();
    plan.scenes[1].scene_id = "s1".to_string();

    let result = EpisodePipeline::new(test_config(None), registry())
        .run(&plan)
        .await;
    assert!(matches!(result, Err(SourcingError::InvalidDocument(_))));
}
