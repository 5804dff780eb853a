use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::customer::CustomerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub i64);

/// One visit event. `ts` is the coalesced visit timestamp (start time when
/// recorded, creation time otherwise); `total` is the pre-computed ticket
/// total when the booking flow captured one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub customer_id: CustomerId,
    pub ts: DateTime<Utc>,
    pub total: Option<Decimal>,
}

/// One line of a reservation. Quantity and the captured unit price are both
/// nullable in source data; a missing value contributes zero to the line,
/// never an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReservationItem {
    pub reservation_id: ReservationId,
    pub sku: String,
    pub quantity: Option<i64>,
    pub price_at_visit: Option<Decimal>,
}
