//! Service-specific tests
//!
//! Each service has its own test file with dedicated fixtures.

mod work_units;

/// Common test utilities for services
pub mod common {
    use shared::CampaignId;

    use crate::types::Campaign;

    pub fn campaign(id: &str) -> Campaign {
        Campaign {
            id: CampaignId::new(id),
            name: format!("Campaign {id}"),
            description: "Running shoes for city commuters".to_string(),
            image: None,
        }
    }
}
