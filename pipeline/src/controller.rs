//! Run controller: lifecycle of one pipeline execution
//!
//! `start` registers the campaign and run, then drives the stages on a
//! detached task. A stage error pauses the run and arms a timer that starts a
//! fresh attempt; stored results let that attempt skip finished work.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use dispatcher::{DispatchRequest, Dispatcher};
use shared::{logging, run_debug, run_error, run_info, run_warn, CampaignId, RunId, RunStatus, RunStep};
use crate::core::{aggregate, prompts::creative_prompt, status_view};
use crate::error::{PipelineError, PipelineResult};
use crate::stages::{ClassificationStage, WorkGenerator};
use crate::traits::{Classifier, RunStore, WorkUnitSource};
use crate::types::{total_items, Campaign, Metrics, PipelineConfig, RunContext, RunStatusView, RunUpdate};

/// Drives runs through bootstrap, generation, classification and aggregation
pub struct RunController<S, W, C>
where
    S: RunStore + 'static,
    W: WorkUnitSource + 'static,
    C: Classifier + 'static,
{
    store: Arc<S>,
    work_units: Arc<W>,
    dispatcher: Arc<dyn Dispatcher>,
    classifier: Arc<C>,
    config: PipelineConfig,
}

impl<S, W, C> RunController<S, W, C>
where
    S: RunStore + 'static,
    W: WorkUnitSource + 'static,
    C: Classifier + 'static,
{
    /// Create a controller; the dispatcher is the process-wide provider pool
    pub fn new(
        store: Arc<S>,
        work_units: Arc<W>,
        dispatcher: Arc<dyn Dispatcher>,
        classifier: Arc<C>,
        config: PipelineConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            work_units,
            dispatcher,
            classifier,
            config,
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Register the campaign, create its run and start processing in the background
    pub async fn start(self: &Arc<Self>, campaign: Campaign) -> PipelineResult<RunId> {
        let campaign_id = campaign.id.clone();
        self.store.create_campaign(campaign).await?;
        let run_id = self.store.create_run(&campaign_id, 0).await?;

        run_info!(run_id, "🚀 Starting simulation for campaign {}", campaign_id);
        self.spawn_attempt(run_id, 0, Duration::ZERO);
        Ok(run_id)
    }

    /// Current run state with progress and ETA
    pub async fn status(&self, run_id: RunId) -> PipelineResult<RunStatusView> {
        let run = self.store.get_run(run_id).await?;
        Ok(status_view(run, Utc::now()))
    }

    fn spawn_attempt(self: &Arc<Self>, run_id: RunId, attempt: u32, delay: Duration) {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            controller.run_attempt(run_id, attempt).await;
        });
    }

    async fn run_attempt(self: Arc<Self>, run_id: RunId, attempt: u32) {
        if attempt > 0 {
            run_info!(run_id, "🔄 Resuming pipeline (attempt {})", attempt + 1);
        }

        let outcome = self.execute(run_id).await;
        match outcome {
            Ok(metrics) => {
                run_info!(
                    run_id,
                    "✅ Simulation complete: {} personas analyzed",
                    metrics.total_personas
                );
            }
            Err(error) => self.handle_failure(run_id, attempt, error).await,
        }
    }

    /// Pause the run and arm the resume timer, or fail it once the resume budget is spent
    async fn handle_failure(self: Arc<Self>, run_id: RunId, attempt: u32, error: PipelineError) {
        run_error!(run_id, "❌ Pipeline attempt failed: {}", error);

        let paused = self
            .store
            .update_run(run_id, RunUpdate::new().status(RunStatus::Paused).error(error.to_string()))
            .await;
        if let Err(update_error) = paused {
            logging::log_error("Pausing run", &update_error);
            return;
        }

        let exhausted = self
            .config
            .max_resume_attempts
            .is_some_and(|max| attempt >= max);
        if exhausted {
            run_warn!(run_id, "🛑 Resume limit reached after {} attempts", attempt + 1);
            if let Err(update_error) = self
                .store
                .update_run(run_id, RunUpdate::new().status(RunStatus::Failed))
                .await
            {
                logging::log_error("Failing run", &update_error);
            }
            return;
        }

        run_info!(run_id, "⏸️ Run paused, resuming in {:?}", self.config.resume_delay);
        self.spawn_attempt(run_id, attempt + 1, self.config.resume_delay);
    }

    /// One full pass over the stages
    async fn execute(&self, run_id: RunId) -> PipelineResult<Metrics> {
        let run = self.store.get_run(run_id).await?;
        self.store
            .update_run(
                run_id,
                RunUpdate::new().status(RunStatus::Processing).step(RunStep::Bootstrap),
            )
            .await?;

        let mut ctx = self.bootstrap(run_id, &run.campaign_id).await?;
        self.analyze_creative(&mut ctx).await?;

        let generator = WorkGenerator::new(self.store.as_ref(), self.dispatcher.as_ref(), &self.config);
        generator.run_cluster_stage(&mut ctx).await?;
        generator.run_item_stage(&ctx).await?;

        let metrics = self.classify_and_aggregate(run_id).await?;

        self.store
            .update_run(
                run_id,
                RunUpdate::new()
                    .status(RunStatus::Completed)
                    .processed(ctx.total_items())
                    .step(RunStep::Complete),
            )
            .await?;
        Ok(metrics)
    }

    /// Load the campaign and its clusters into a fresh run context
    async fn bootstrap(&self, run_id: RunId, campaign_id: &CampaignId) -> PipelineResult<RunContext> {
        let campaign = self.store.load_campaign(campaign_id).await?;
        let clusters = self.work_units.load_work_units(campaign_id).await?;

        let total = total_items(&clusters);
        if clusters.is_empty() || total == 0 {
            return Err(PipelineError::NoWorkUnits {
                campaign_id: campaign_id.clone(),
            });
        }

        self.store.update_run(run_id, RunUpdate::new().total(total)).await?;
        run_info!(
            run_id,
            "📋 Simulation state ready: {} clusters, {} personas",
            clusters.len(),
            total
        );
        Ok(RunContext::new(run_id, campaign, clusters))
    }

    /// Describe the creative through the vision provider when the campaign has an image
    async fn analyze_creative(&self, ctx: &mut RunContext) -> PipelineResult<()> {
        let Some(image) = ctx.campaign.image.clone() else {
            run_debug!(ctx.run_id, "No creative image, using the campaign description");
            return Ok(());
        };

        self.store
            .update_run(ctx.run_id, RunUpdate::new().step(RunStep::AnalyzingCreative))
            .await?;

        let request = DispatchRequest::with_image(creative_prompt(&ctx.campaign), image);
        let response = self.dispatcher.dispatch_vision(request).await?;
        ctx.creative_description = response.content.trim().to_string();

        run_info!(ctx.run_id, "🖼️ Advertisement analyzed");
        Ok(())
    }

    async fn classify_and_aggregate(&self, run_id: RunId) -> PipelineResult<Metrics> {
        self.store
            .update_run(run_id, RunUpdate::new().step(RunStep::Classification))
            .await?;
        let results = ClassificationStage::new(self.store.as_ref(), self.classifier.as_ref(), &self.config)
            .run(run_id)
            .await?;

        self.store
            .update_run(run_id, RunUpdate::new().step(RunStep::Aggregation))
            .await?;
        let metrics = aggregate(&results)?;
        self.store.save_metrics(run_id, metrics.clone()).await?;
        Ok(metrics)
    }

    /// Classification and aggregation alone, on already stored reactions.
    ///
    /// Success completes the run; failure marks it `failed` with no resume.
    pub async fn analyze_run(&self, run_id: RunId) -> PipelineResult<Metrics> {
        let run = self.store.get_run(run_id).await?;
        if run.status.is_terminal() {
            return Err(PipelineError::InvalidTransition {
                from: run.status,
                to: RunStatus::Processing,
            });
        }

        self.store
            .update_run(run_id, RunUpdate::new().status(RunStatus::Processing))
            .await?;

        match self.classify_and_aggregate(run_id).await {
            Ok(metrics) => {
                self.store
                    .update_run(
                        run_id,
                        RunUpdate::new()
                            .status(RunStatus::Completed)
                            .processed(run.total_items)
                            .step(RunStep::Complete),
                    )
                    .await?;
                run_info!(run_id, "✅ Emotional analysis complete");
                Ok(metrics)
            }
            Err(error) => {
                run_error!(run_id, "❌ Emotional analysis failed: {}", error);
                self.store
                    .update_run(
                        run_id,
                        RunUpdate::new().status(RunStatus::Failed).error(error.to_string()),
                    )
                    .await?;
                Err(error)
            }
        }
    }
}
