//! evs-sourcing - Episode visual sourcing
//!
//! Reads a narrated shot plan and writes the four stage documents
//! (strategic queries, search results, curated assets, source pack) to an
//! output directory, then applies the coverage gate.
//!
//! Exit status is non-zero when the gate refuses the pack, so the compile step
//! downstream never renders an episode with too few real visuals.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evs_common::config::{load_config, resolve_config_path};
use evs_common::documents::{CurationOutput, ShotPlan, SourcePack};
use evs_sourcing::search::providers::build_providers;
use evs_sourcing::workflow::pipeline::{CURATED_ASSETS_FILE, SOURCE_PACK_FILE};
use evs_sourcing::{ConfigOverrides, CoverageGate, EpisodePipeline, PipelineEvent, SourcingConfig};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "evs-sourcing", version, about = "Episode visual sourcing")]
struct Args {
    /// Config file (defaults to $EVS_CONFIG, then the platform config dir)
    #[arg(short, long, global = true, env = "EVS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every stage and the coverage gate
    Run {
        /// Shot plan JSON
        #[arg(long)]
        shot_plan: PathBuf,

        /// Directory for the stage documents
        #[arg(long, default_value = "evs_out")]
        out_dir: PathBuf,

        /// Override the strategic query cap
        #[arg(long)]
        max_queries: Option<usize>,

        /// Let unknown-license candidates through to curation
        #[arg(long)]
        allow_unknown_licenses: bool,

        /// Always call providers, never read or write the search cache
        #[arg(long)]
        no_cache: bool,

        /// Override the search cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Override the gate's minimum covered-scene ratio (0.0 - 1.0)
        #[arg(long)]
        min_coverage: Option<f64>,
    },

    /// Print the strategic queries for a shot plan without searching
    Plan {
        #[arg(long)]
        shot_plan: PathBuf,

        /// Override the strategic query cap
        #[arg(long)]
        max_queries: Option<usize>,
    },

    /// Apply the coverage gate to an existing source pack
    Gate {
        /// Source pack JSON
        #[arg(long)]
        source_pack: PathBuf,

        /// Curated assets JSON (deficits are read from it when given)
        #[arg(long)]
        curated_assets: Option<PathBuf>,

        #[arg(long)]
        min_coverage: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let toml = load_config(config_path.as_deref()).context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&toml.logging.level)),
        )
        .init();

    info!(
        "Starting evs-sourcing v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Some(path) = &config_path {
        debug!(path = %path.display(), "Config file location");
    }

    match args.command {
        Command::Run {
            shot_plan,
            out_dir,
            max_queries,
            allow_unknown_licenses,
            no_cache,
            cache_dir,
            min_coverage,
        } => {
            let config = SourcingConfig::new(toml).with_overrides(&ConfigOverrides {
                max_queries,
                allow_unknown_licenses,
                no_cache,
                cache_dir,
                min_coverage_ratio: min_coverage,
            });
            run(config, &shot_plan, &out_dir).await
        }
        Command::Plan {
            shot_plan,
            max_queries,
        } => {
            let config = SourcingConfig::new(toml).with_overrides(&ConfigOverrides {
                max_queries,
                ..Default::default()
            });
            let plan = read_shot_plan(&shot_plan).await?;
            let output = EpisodePipeline::new(config, Vec::new()).plan(&plan)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Command::Gate {
            source_pack,
            curated_assets,
            min_coverage,
        } => {
            let config = SourcingConfig::new(toml).with_overrides(&ConfigOverrides {
                min_coverage_ratio: min_coverage,
                ..Default::default()
            });
            gate(&config.coverage_gate(), &source_pack, curated_assets.as_deref()).await
        }
    }
}

async fn read_shot_plan(path: &Path) -> Result<ShotPlan> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read shot plan {}", path.display()))?;
    let plan = ShotPlan::from_json(&json)
        .with_context(|| format!("Invalid shot plan {}", path.display()))?;
    info!(path = %path.display(), scenes = plan.scenes.len(), "Shot plan loaded");
    Ok(plan)
}

async fn run(config: SourcingConfig, shot_plan: &Path, out_dir: &Path) -> Result<()> {
    let plan = read_shot_plan(shot_plan).await?;
    let providers = build_providers(&config.toml).context("Failed to build provider registry")?;

    // Ctrl-C stops outstanding searches; the run still completes with what it has
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling outstanding searches");
            signal_token.cancel();
        }
    });

    let (event_tx, mut event_rx) = mpsc::channel::<PipelineEvent>(100);
    let progress = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match &event {
                PipelineEvent::ProviderSkipped { provider } => {
                    warn!(provider = %provider, "Provider skipped for this run");
                }
                PipelineEvent::BudgetExhausted {
                    queries_successful,
                    queries_total,
                } => {
                    warn!(queries_successful, queries_total, "Search stopped early");
                }
                other => debug!(event = ?other, "Pipeline progress"),
            }
        }
    });

    let gate = config.coverage_gate();
    let pipeline = EpisodePipeline::new(config, providers)
        .with_events(event_tx)
        .with_cancellation(cancel);

    let result = pipeline.run(&plan).await;
    drop(pipeline);
    let _ = progress.await;
    let run = result?;

    run.write_documents(out_dir).await?;

    match run.check_coverage(&gate) {
        Ok(summary) => {
            info!(
                coverage_pct = summary.coverage_pct,
                scenes_covered = summary.scenes_covered,
                scenes_total = summary.scenes_total,
                "Source pack ready"
            );
            for warning in &run.source_pack.warnings {
                warn!("{}", warning);
            }
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            for warning in &run.source_pack.warnings {
                warn!("{}", warning);
            }
            Err(e.into())
        }
    }
}

async fn gate(
    gate: &CoverageGate,
    source_pack: &Path,
    curated_assets: Option<&Path>,
) -> Result<()> {
    let json = tokio::fs::read_to_string(source_pack)
        .await
        .with_context(|| format!("Failed to read {}", source_pack.display()))?;
    let pack: SourcePack = serde_json::from_str(&json)
        .with_context(|| format!("Invalid source pack {}", source_pack.display()))?;

    // Deficits live in the curated assets document, normally alongside the pack
    let curated_path = curated_assets.map(Path::to_path_buf).or_else(|| {
        let sibling = source_pack.with_file_name(CURATED_ASSETS_FILE);
        (source_pack.file_name().and_then(|n| n.to_str()) == Some(SOURCE_PACK_FILE)
            && sibling.exists())
        .then_some(sibling)
    });
    let deficits = match curated_path {
        Some(path) => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let curation: CurationOutput = serde_json::from_str(&json)
                .with_context(|| format!("Invalid curated assets {}", path.display()))?;
            curation.deficits
        }
        None => Vec::new(),
    };

    let summary = gate.check(&pack, &deficits)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
