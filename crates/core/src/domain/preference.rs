use serde::{Deserialize, Serialize};

use super::customer::CustomerId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub id: i64,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerPreference {
    pub customer_id: CustomerId,
    pub preference_id: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Allergy {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerAllergy {
    pub customer_id: CustomerId,
    pub allergy_id: i64,
}
