use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::customer::CustomerId;

/// Fully merged per-customer view for display: identity plus every derived
/// metric, with zero/empty defaults for customers without history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: CustomerId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub visits_count: u64,
    pub last_visit: Option<DateTime<Utc>>,
    pub average_ticket: Decimal,
    pub preferences: Vec<String>,
    pub allergies: Vec<String>,
}
