//! Work generator: cluster-level then persona-level reactions
//!
//! Both stages dispatch strictly one request at a time. A failed generation is
//! replaced by the placeholder text and the loop moves on; only storage errors
//! escape a stage. Stored non-placeholder results are reused, so a resumed run
//! only generates what is still missing.

use std::collections::{HashMap, HashSet};

use dispatcher::{DispatchRequest, Dispatcher};
use shared::{run_info, run_warn, ClusterId, ItemId, RunStep};
use crate::core::prompts::{cluster_prompt, persona_prompt};
use crate::error::PipelineResult;
use crate::traits::RunStore;
use crate::types::{ClusterResult, ItemResult, Persona, PipelineConfig, RunContext, RunUpdate};

/// One queued persona-level request
struct ItemWork<'a> {
    cluster_id: ClusterId,
    persona: &'a Persona,
    cluster_text: &'a str,
}

pub struct WorkGenerator<'a> {
    store: &'a dyn RunStore,
    dispatcher: &'a dyn Dispatcher,
    config: &'a PipelineConfig,
}

impl<'a> WorkGenerator<'a> {
    pub fn new(store: &'a dyn RunStore, dispatcher: &'a dyn Dispatcher, config: &'a PipelineConfig) -> Self {
        Self {
            store,
            dispatcher,
            config,
        }
    }

    /// Dispatch and return trimmed text, or the placeholder on failure
    async fn generate_or_placeholder(&self, ctx: &RunContext, prompt: String, what: &str) -> String {
        match self.dispatcher.dispatch(DispatchRequest::text(prompt)).await {
            Ok(response) => response.content.trim().to_string(),
            Err(e) => {
                run_warn!(ctx.run_id, "⚠️ Generation failed for {}: {}", what, e);
                self.config.placeholder.clone()
            }
        }
    }

    /// Generate one reaction per cluster from its representative persona and
    /// record it in `ctx.cluster_texts`
    pub async fn run_cluster_stage(&self, ctx: &mut RunContext) -> PipelineResult<()> {
        let stored: HashMap<ClusterId, String> = self
            .store
            .load_cluster_results(ctx.run_id)
            .await?
            .into_iter()
            .filter(|result| self.config.is_completed_text(&result.text))
            .map(|result| (result.cluster_id, result.text))
            .collect();

        let total = ctx.clusters.len();
        let mut generated = 0;

        for index in 0..total {
            let cluster_id = ctx.clusters[index].cluster_id;

            if let Some(text) = stored.get(&cluster_id) {
                ctx.cluster_texts.insert(cluster_id, text.clone());
                continue;
            }

            let Some(representative) = ctx.clusters[index].representative() else {
                // Nothing to generate for an empty cluster
                continue;
            };
            let prompt = cluster_prompt(&ctx.creative_description, &representative.description);

            self.store
                .update_run(
                    ctx.run_id,
                    RunUpdate::new().step(RunStep::ClusterStage {
                        current: index + 1,
                        total,
                    }),
                )
                .await?;

            let text = self
                .generate_or_placeholder(ctx, prompt, &format!("cluster {cluster_id}"))
                .await;

            self.store
                .save_cluster_result(ClusterResult {
                    run_id: ctx.run_id,
                    campaign_id: ctx.campaign.id.clone(),
                    cluster_id,
                    text: text.clone(),
                })
                .await?;
            ctx.cluster_texts.insert(cluster_id, text);
            generated += 1;
        }

        run_info!(
            ctx.run_id,
            "🧩 Cluster reactions ready: {} generated, {} reused",
            generated,
            stored.len()
        );
        Ok(())
    }

    /// Generate one reaction per persona, updating progress after every item.
    ///
    /// Returns the number of processed personas.
    pub async fn run_item_stage(&self, ctx: &RunContext) -> PipelineResult<usize> {
        let completed: HashSet<ItemId> = self
            .store
            .load_item_results(ctx.run_id)
            .await?
            .into_iter()
            .filter(|result| self.config.is_completed_text(&result.text))
            .map(|result| result.item_id)
            .collect();

        let queue: Vec<ItemWork<'_>> = ctx
            .clusters
            .iter()
            .flat_map(|cluster| {
                let cluster_text = ctx
                    .cluster_texts
                    .get(&cluster.cluster_id)
                    .map(String::as_str)
                    .unwrap_or(self.config.placeholder.as_str());
                cluster.personas.iter().map(move |persona| ItemWork {
                    cluster_id: cluster.cluster_id,
                    persona,
                    cluster_text,
                })
            })
            .collect();

        let total = queue.len();
        let mut processed = queue
            .iter()
            .filter(|work| completed.contains(&work.persona.persona_id))
            .count();

        run_info!(
            ctx.run_id,
            "👥 Processing {} personas ({} already done)",
            total,
            processed
        );
        self.store
            .update_run(ctx.run_id, RunUpdate::new().total(total).processed(processed))
            .await?;

        for (index, work) in queue.iter().enumerate() {
            if completed.contains(&work.persona.persona_id) {
                continue;
            }

            let prompt = persona_prompt(work.cluster_text, work.persona);
            let what = format!("persona {} ({})", work.persona.persona_id, work.persona.name);
            let text = self.generate_or_placeholder(ctx, prompt, &what).await;

            self.store
                .save_item_result(ItemResult {
                    run_id: ctx.run_id,
                    campaign_id: ctx.campaign.id.clone(),
                    cluster_id: work.cluster_id,
                    item_id: work.persona.persona_id.clone(),
                    persona_name: work.persona.name.clone(),
                    text,
                    label: None,
                })
                .await?;

            processed += 1;
            self.store
                .update_run(
                    ctx.run_id,
                    RunUpdate::new().processed(processed).step(RunStep::ItemStage {
                        current: index + 1,
                        total,
                    }),
                )
                .await?;

            if processed % self.config.progress_log_interval.max(1) == 0 && processed < total {
                self.log_progress(ctx, processed, total).await;
            }
        }

        // Final table, even when every remaining item was already done
        self.log_progress(ctx, processed, total).await;
        Ok(processed)
    }

    async fn log_progress(&self, ctx: &RunContext, processed: usize, total: usize) {
        run_info!(
            ctx.run_id,
            "📈 Progress: {}/{} ({}%)",
            processed,
            total,
            crate::core::progress_percent(processed, total)
        );
        for snapshot in self.dispatcher.provider_status().await {
            run_info!(ctx.run_id, "   {}", snapshot);
        }
    }
}
