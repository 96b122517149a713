//! Main entry point for the pipeline binary
//!
//! Runs one simulation for a campaign against the configured provider pool
//! and writes the resulting metrics as JSON. With `--reactions` it only runs
//! the emotional analysis over previously generated reactions.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tokio::signal;

use dispatcher::{Dispatcher, ProviderRegistry, Rotator};
use pipeline::{
    Campaign, FileWorkUnitSource, InMemoryRunStore, ItemResult, Metrics, PipelineConfig, RealEmotionClassifier,
    RunController, RunStore, StaticWorkUnitSource, WorkUnitSource,
};
use shared::{logging, run_info, CampaignId, ClusterId, ItemId, RunId};

/// Persona ad-reaction simulation pipeline
#[derive(Parser)]
#[command(name = "pipeline")]
#[command(about = "Simulates persona reactions to an advertisement across rate-limited providers")]
pub struct Args {
    /// Clustering output (JSON) holding the personas to simulate
    #[arg(long, required_unless_present = "reactions")]
    pub clusters: Option<PathBuf>,

    /// Analyze-only mode: previously generated reactions (JSON) to classify and aggregate
    #[arg(long, conflicts_with = "clusters")]
    pub reactions: Option<PathBuf>,

    /// Campaign identifier
    #[arg(long)]
    pub campaign_id: String,

    /// Campaign name (defaults to the identifier)
    #[arg(long)]
    pub campaign_name: Option<String>,

    /// Campaign description, used as the ad description without an image
    #[arg(long, default_value = "")]
    pub description: String,

    /// Creative image as an http(s) or data: URL
    #[arg(long)]
    pub image: Option<String>,

    /// Where to write the metrics JSON (stdout when omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Seconds before a paused run resumes
    #[arg(long, default_value = "60")]
    pub resume_delay_secs: u64,

    /// Give up after this many automatic resumes (unbounded by default)
    #[arg(long)]
    pub max_resume_attempts: Option<u32>,

    /// Seconds between status polls
    #[arg(long, default_value = "5")]
    pub poll_secs: u64,
}

/// One previously generated reaction
#[derive(Deserialize)]
struct ReactionRecord {
    cluster_id: ClusterId,
    persona_id: ItemId,
    #[serde(default)]
    persona_name: String,
    reaction: String,
}

type Controller<W> = RunController<InMemoryRunStore, W, RealEmotionClassifier>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));

    let campaign = Campaign {
        id: CampaignId::new(args.campaign_id.clone()),
        name: args.campaign_name.clone().unwrap_or_else(|| args.campaign_id.clone()),
        description: args.description.clone(),
        image: args.image.clone(),
    };

    let config = PipelineConfig {
        resume_delay: Duration::from_secs(args.resume_delay_secs),
        max_resume_attempts: args.max_resume_attempts,
        ..PipelineConfig::default()
    };

    let store = Arc::new(InMemoryRunStore::new());
    let classifier = Arc::new(RealEmotionClassifier::from_env()?);

    let metrics = match (&args.clusters, &args.reactions) {
        (_, Some(reactions)) => {
            logging::log_startup("emotional analysis (analyze-only mode)");
            // Nothing is generated in this mode, so the provider pool stays empty
            let dispatcher: Arc<dyn Dispatcher> = Arc::new(Rotator::with_defaults(ProviderRegistry::new()));
            let work_units = Arc::new(StaticWorkUnitSource::default());
            let controller = RunController::new(store, work_units, dispatcher, classifier, config);
            analyze_only(&controller, campaign, reactions).await?
        }
        (Some(clusters), None) => {
            logging::log_startup(&format!("simulation for campaign {}", campaign.id));
            let rotator = Rotator::with_defaults(ProviderRegistry::from_env()?);
            logging::log_progress("Provider pool ready", &format!("{} providers", rotator.provider_count()));
            let dispatcher: Arc<dyn Dispatcher> = Arc::new(rotator);
            let work_units = Arc::new(FileWorkUnitSource::new(clusters));
            let controller = RunController::new(store, work_units, dispatcher, classifier, config);
            simulate(&controller, campaign, Duration::from_secs(args.poll_secs.max(1))).await?
        }
        (None, None) => anyhow::bail!("either --clusters or --reactions is required"),
    };

    let json = serde_json::to_string_pretty(&metrics)?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("writing metrics to {}", path.display()))?;
            logging::log_success(&format!("Metrics written to {}", path.display()));
        }
        None => println!("{json}"),
    }

    Ok(())
}

/// Start a run and poll it until it reaches a terminal status
async fn simulate<W: WorkUnitSource + 'static>(
    controller: &Arc<Controller<W>>,
    campaign: Campaign,
    poll: Duration,
) -> anyhow::Result<Metrics> {
    let run_id = controller.start(campaign).await?;

    let outcome = tokio::select! {
        result = wait_for_terminal(controller, run_id, poll) => result,
        _ = signal::ctrl_c() => {
            logging::log_shutdown("Received Ctrl+C signal");
            anyhow::bail!("interrupted while {} was still running", run_id);
        }
    };
    outcome?;

    controller
        .store()
        .load_metrics(run_id)
        .await?
        .with_context(|| format!("{run_id} finished without metrics"))
}

async fn wait_for_terminal<W: WorkUnitSource + 'static>(
    controller: &Arc<Controller<W>>,
    run_id: RunId,
    poll: Duration,
) -> anyhow::Result<()> {
    loop {
        tokio::time::sleep(poll).await;
        let view = controller.status(run_id).await?;

        let eta = view
            .eta_minutes
            .map(|minutes| format!(", ETA {minutes} min"))
            .unwrap_or_default();
        run_info!(
            run_id,
            "📊 {} - {} ({}%{})",
            view.run.status,
            view.run.current_step,
            view.progress_percent,
            eta
        );

        if view.run.status.is_terminal() {
            if let Some(error) = view.run.error_message {
                anyhow::bail!("{run_id} ended as {}: {error}", view.run.status);
            }
            return Ok(());
        }
    }
}

/// Seed a run with stored reactions and run the standalone analysis on it
async fn analyze_only<W: WorkUnitSource + 'static>(
    controller: &Arc<Controller<W>>,
    campaign: Campaign,
    reactions: &Path,
) -> anyhow::Result<Metrics> {
    let json = tokio::fs::read_to_string(reactions)
        .await
        .with_context(|| format!("reading {}", reactions.display()))?;
    let records: Vec<ReactionRecord> = serde_json::from_str(&json)?;

    let store = controller.store();
    let campaign_id = campaign.id.clone();
    store.create_campaign(campaign).await?;
    let run_id = store.create_run(&campaign_id, records.len()).await?;

    for record in records {
        store
            .save_item_result(ItemResult {
                run_id,
                campaign_id: campaign_id.clone(),
                cluster_id: record.cluster_id,
                persona_name: record.persona_name,
                item_id: record.persona_id,
                text: record.reaction,
                label: None,
            })
            .await?;
    }

    run_info!(run_id, "🔬 Analyzing stored reactions");
    Ok(controller.analyze_run(run_id).await?)
}
