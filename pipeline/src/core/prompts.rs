//! Prompt text for the creative, cluster and persona requests

use crate::types::{Campaign, Persona, ToneProfile};

const UNSET: &str = "neutral";

/// Vision request describing the campaign creative
pub fn creative_prompt(campaign: &Campaign) -> String {
    format!(
        "Analyze this advertisement image and describe the ad in detail. \
         Use the campaign details to make the description.\n\
         Campaign name: {}\nCampaign description: {}\n\
         Return only the description.",
        campaign.name, campaign.description
    )
}

/// Cluster-level reaction from the cluster's representative persona
pub fn cluster_prompt(ad_description: &str, persona_description: &str) -> String {
    format!(
        "Given the ad description \"{ad_description}\", simulate a reaction from this persona: \
         {persona_description}. Give a reaction based on their demographic data. \
         Only return the raw reaction as a string."
    )
}

/// Personalized reaction derived from the cluster-level reaction
pub fn persona_prompt(cluster_reaction: &str, persona: &Persona) -> String {
    let default_tone = ToneProfile::default();
    let tone = persona.tone.as_ref().unwrap_or(&default_tone);
    let or_unset = |value: &Option<String>| value.clone().unwrap_or_else(|| UNSET.to_string());
    let triggers = tone.key_reaction_triggers.as_ref();

    format!(
        "Given the cluster reaction: \"{cluster_reaction}\"\n\n\
         Generate a personalized reaction for this persona:\n\n\
         Name: {}\n\
         Description: {}\n\
         Tone Characteristics:\n\
         - Emotional responsiveness: {}\n\
         - Temperament: {}\n\
         - Communication style: {}\n\
         - Language mix: {}\n\
         - Attitude towards ads: {}\n\
         - Positive triggers: {}\n\
         - Negative triggers: {}\n\n\
         Return ONLY the raw reaction text, nothing else.",
        persona.name,
        persona.description,
        or_unset(&tone.emotional_responsiveness),
        or_unset(&tone.temperament),
        or_unset(&tone.communication_style),
        or_unset(&tone.language_mix),
        or_unset(&tone.attitude_towards_ads),
        join_or_na(triggers.map(|t| &t.positive)),
        join_or_na(triggers.map(|t| &t.negative)),
    )
}

fn join_or_na(values: Option<&Vec<String>>) -> String {
    values.map(|v| v.join(", ")).unwrap_or_else(|| "N/A".to_string())
}
