//! Classification stage: label every distinct stored reaction once
//!
//! Rows sharing identical text share one classifier call; the label is
//! written back to every such row. Empty and placeholder texts are skipped.
//! A failed classification leaves its rows unlabeled and out of the result.

use std::collections::HashMap;

use shared::{run_info, run_warn, RunId};
use crate::core::labels::derive_label;
use crate::error::{PipelineError, PipelineResult};
use crate::traits::{Classifier, RunStore};
use crate::types::{ClassifiedResult, EmotionLabel, PipelineConfig};

pub struct ClassificationStage<'a> {
    store: &'a dyn RunStore,
    classifier: &'a dyn Classifier,
    config: &'a PipelineConfig,
}

impl<'a> ClassificationStage<'a> {
    pub fn new(store: &'a dyn RunStore, classifier: &'a dyn Classifier, config: &'a PipelineConfig) -> Self {
        Self {
            store,
            classifier,
            config,
        }
    }

    async fn classify_text(&self, run_id: RunId, text: &str) -> Option<EmotionLabel> {
        let label = match self.classifier.classify(text).await {
            Ok(scores) => {
                let label = derive_label(&scores);
                if label.is_none() {
                    run_warn!(run_id, "⚠️ Classifier returned no scores");
                }
                label
            }
            Err(failure) => {
                run_warn!(run_id, "⚠️ Classification failed: {}", failure);
                None
            }
        };

        tokio::time::sleep(self.config.classification_delay).await;
        label
    }

    /// Label the run's stored reactions, in stored order
    pub async fn run(&self, run_id: RunId) -> PipelineResult<Vec<ClassifiedResult>> {
        let rows = self.store.load_item_results(run_id).await?;
        if rows.is_empty() {
            return Err(PipelineError::NoItemResults { run_id });
        }

        // Labels from an earlier attempt are reused as-is
        let mut labels: HashMap<String, Option<EmotionLabel>> = rows
            .iter()
            .filter_map(|row| row.label.clone().map(|label| (row.text.clone(), Some(label))))
            .collect();

        let mut results = Vec::new();
        let mut classified = 0;
        let mut skipped = 0;

        for row in rows {
            if !self.config.is_completed_text(&row.text) {
                skipped += 1;
                continue;
            }

            let label = match labels.get(&row.text) {
                Some(cached) => cached.clone(),
                None => {
                    classified += 1;
                    let label = self.classify_text(run_id, &row.text).await;
                    labels.insert(row.text.clone(), label.clone());
                    label
                }
            };

            let Some(label) = label else {
                continue;
            };

            if row.label.as_ref() != Some(&label) {
                self.store.save_item_label(run_id, &row.item_id, label.clone()).await?;
            }

            results.push(ClassifiedResult {
                item_id: row.item_id,
                persona_name: row.persona_name,
                cluster_id: row.cluster_id,
                text: row.text,
                label,
            });
        }

        run_info!(
            run_id,
            "🎭 Emotional analysis done: {} classifier calls, {} labeled, {} skipped",
            classified,
            results.len(),
            skipped
        );
        Ok(results)
    }
}
