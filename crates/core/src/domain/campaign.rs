use serde::{Deserialize, Serialize};

use super::customer::CustomerId;

/// Segment-specific campaign metadata. Birthday offers carry the tiered
/// discount; inactivity offers carry the fixed win-back discount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CampaignOffer {
    Birthday { days_until: i64, discount_pct: u8 },
    Inactivity { days_since_last: i64, discount_pct: u8 },
}

impl CampaignOffer {
    pub fn discount_pct(&self) -> u8 {
        match self {
            Self::Birthday { discount_pct, .. } | Self::Inactivity { discount_pct, .. } => {
                *discount_pct
            }
        }
    }
}

/// One composed, not-yet-sent promotional message for a single customer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub customer_id: CustomerId,
    pub name: String,
    pub email: Option<String>,
    pub offer: CampaignOffer,
    pub subject: String,
    pub message: String,
}
