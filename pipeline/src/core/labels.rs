//! Emotion label derivation from raw classifier scores

use crate::types::{EmotionLabel, LabelScore, Sentiment};

const POSITIVE_EMOTIONS: &[&str] = &["joy", "love", "surprise"];
const NEGATIVE_EMOTIONS: &[&str] = &["anger", "sadness", "fear", "disgust"];

/// Polarity of an emotion label; unknown labels are neutral
pub fn sentiment_for(emotion: &str) -> Sentiment {
    if POSITIVE_EMOTIONS.contains(&emotion) {
        Sentiment::Positive
    } else if NEGATIVE_EMOTIONS.contains(&emotion) {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Turn classifier scores into a label.
///
/// The highest score wins and sets the intensity (`round(score * 10)`); the
/// remaining labels follow in descending score order. `None` for empty input.
pub fn derive_label(scores: &[LabelScore]) -> Option<EmotionLabel> {
    let mut sorted: Vec<&LabelScore> = scores.iter().collect();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

    let (top, rest) = sorted.split_first()?;
    let intensity = (top.score.clamp(0.0, 1.0) * 10.0).round() as u32;

    Some(EmotionLabel {
        dominant_emotion: top.label.clone(),
        sentiment: sentiment_for(&top.label),
        intensity,
        secondary_emotions: rest.iter().map(|score| score.label.clone()).collect(),
    })
}
