use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current menu price for a sku, used only as a fallback when a reservation
/// line did not capture its own price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub sku: String,
    pub price: Option<Decimal>,
}
