//! Test data for pipeline integration tests

use std::time::Duration;

use pipeline::{Campaign, Cluster, LabelScore, Persona, PipelineConfig, ToneProfile};
use shared::{CampaignId, ClusterId, ItemId};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const CAMPAIGN_ID: &'static str = "spring-sneakers";
    pub const IMAGE_URL: &'static str = "https://cdn.example.com/ads/sneaker.png";
    pub const CREATIVE: &'static str = "A red sneaker jumping over a city skyline";

    pub fn campaign() -> Campaign {
        Campaign {
            id: CampaignId::new(Self::CAMPAIGN_ID),
            name: "Spring Sneakers".to_string(),
            description: "Lightweight running shoes for city commuters".to_string(),
            image: None,
        }
    }

    pub fn campaign_with_image() -> Campaign {
        Campaign {
            image: Some(Self::IMAGE_URL.to_string()),
            ..Self::campaign()
        }
    }

    fn persona(id: &str, name: &str) -> Persona {
        Persona {
            persona_id: ItemId::new(id),
            name: name.to_string(),
            description: format!("{name}, 29, urban commuter"),
            tone: Some(ToneProfile {
                temperament: Some("calm".to_string()),
                ..ToneProfile::default()
            }),
        }
    }

    /// Two clusters, five personas
    pub fn clusters() -> Vec<Cluster> {
        vec![
            Cluster {
                cluster_id: ClusterId::new(0),
                personas: vec![
                    Self::persona("p1", "Ana"),
                    Self::persona("p2", "Ben"),
                    Self::persona("p3", "Chloe"),
                ],
            },
            Cluster {
                cluster_id: ClusterId::new(1),
                personas: vec![Self::persona("p4", "Dev"), Self::persona("p5", "Eli")],
            },
        ]
    }

    pub fn scores(label: &str) -> Vec<LabelScore> {
        vec![
            LabelScore {
                label: label.to_string(),
                score: 0.9,
            },
            LabelScore {
                label: "neutral".to_string(),
                score: 0.1,
            },
        ]
    }

    pub fn config() -> PipelineConfig {
        PipelineConfig {
            classification_delay: Duration::ZERO,
            progress_log_interval: 2,
            ..PipelineConfig::default()
        }
    }
}
