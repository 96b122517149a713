//! Reduction of labeled reactions into run metrics

use std::collections::BTreeMap;

use shared::ClusterId;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{ClassifiedResult, ClusterSummary, EmotionCount, Metrics, Sentiment, SentimentBreakdown};

/// Number of emotions listed in `top_emotions`
pub const TOP_EMOTIONS: usize = 5;

/// Tally that keeps first-seen order, so ties rank by appearance
#[derive(Default)]
struct OrderedCounts {
    entries: Vec<(String, usize)>,
}

impl OrderedCounts {
    fn add(&mut self, key: &str) {
        match self.entries.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((key.to_string(), 1)),
        }
    }

    /// Entries by descending count; stable, so ties keep first-seen order
    fn ranked(mut self) -> Vec<(String, usize)> {
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self.entries
    }
}

/// One decimal place, exact ties rounded away from zero (8.25 -> "8.3")
fn one_decimal(value: f64) -> String {
    format!("{:.1}", (value * 10.0).round() / 10.0)
}

fn percent(count: usize, total: usize) -> String {
    format!("{}%", one_decimal(count as f64 / total as f64 * 100.0))
}

/// Aggregate labeled reactions. Empty input is an error.
pub fn aggregate(results: &[ClassifiedResult]) -> PipelineResult<Metrics> {
    let total = results.len();
    if total == 0 {
        return Err(PipelineError::NoLabeledResults);
    }

    let mut positive = 0;
    let mut neutral = 0;
    let mut negative = 0;
    let mut emotions = OrderedCounts::default();
    let mut clusters: BTreeMap<ClusterId, Vec<&ClassifiedResult>> = BTreeMap::new();
    let mut cumulative_intensity: u64 = 0;

    for result in results {
        match result.label.sentiment {
            Sentiment::Positive => positive += 1,
            Sentiment::Neutral => neutral += 1,
            Sentiment::Negative => negative += 1,
        }
        emotions.add(&result.label.dominant_emotion);
        clusters.entry(result.cluster_id).or_default().push(result);
        cumulative_intensity += u64::from(result.label.intensity);
    }

    let top_emotions: Vec<EmotionCount> = emotions
        .ranked()
        .into_iter()
        .take(TOP_EMOTIONS)
        .map(|(emotion, count)| EmotionCount {
            percent: percent(count, total),
            emotion,
            count,
        })
        .collect();

    let average_intensity = one_decimal(cumulative_intensity as f64 / total as f64);

    let cluster_summaries = clusters
        .into_iter()
        .map(|(cluster_id, members)| {
            let mut counts = OrderedCounts::default();
            for member in &members {
                counts.add(&member.label.dominant_emotion);
            }
            let dominant_emotion = counts
                .ranked()
                .into_iter()
                .next()
                .map(|(emotion, _)| emotion)
                .unwrap_or_else(|| "unknown".to_string());

            ClusterSummary {
                cluster_id,
                persona_count: members.len(),
                tag: format!("{dominant_emotion}-leaning cluster"),
                dominant_emotion,
            }
        })
        .collect();

    let mut high_level_tags: Vec<String> = top_emotions.iter().map(|e| e.emotion.clone()).collect();
    for (sentiment, count) in [
        (Sentiment::Positive, positive),
        (Sentiment::Neutral, neutral),
        (Sentiment::Negative, negative),
    ] {
        if count > 0 {
            high_level_tags.push(format!("{} sentiment", sentiment.as_str()));
        }
    }
    high_level_tags.push(format!("Avg intensity: {average_intensity}"));

    Ok(Metrics {
        total_personas: total,
        sentiment_breakdown: SentimentBreakdown {
            positive: percent(positive, total),
            neutral: percent(neutral, total),
            negative: percent(negative, total),
        },
        top_emotions,
        average_intensity,
        cluster_summaries,
        high_level_tags,
    })
}
