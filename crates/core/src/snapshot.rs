use async_trait::async_trait;

use crate::domain::customer::Customer;
use crate::domain::menu::MenuItem;
use crate::domain::preference::{Allergy, CustomerAllergy, CustomerPreference, Preference};
use crate::domain::reservation::{Reservation, ReservationItem};
use crate::errors::SnapshotError;

/// Point-in-time copy of every relation the engine reads, loaded fresh for
/// each invocation and discarded afterwards. Any relation may be empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshots {
    pub customers: Vec<Customer>,
    pub reservations: Vec<Reservation>,
    pub reservation_items: Vec<ReservationItem>,
    pub menu_items: Vec<MenuItem>,
    pub preferences: Vec<Preference>,
    pub customer_preferences: Vec<CustomerPreference>,
    pub allergies: Vec<Allergy>,
    pub customer_allergies: Vec<CustomerAllergy>,
}

/// Read-only access to the relational source. A `load` either yields all
/// eight relations or fails as a whole; there is no partial snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self) -> Result<Snapshots, SnapshotError>;

    /// Cheap reachability probe. Returns a human-readable detail string.
    async fn health_check(&self) -> Result<String, SnapshotError>;
}

/// Test double serving a fixed snapshot set, optionally scripted to fail.
pub struct InMemorySnapshotStore {
    snapshots: Snapshots,
    failure: Option<SnapshotError>,
}

impl InMemorySnapshotStore {
    pub fn new(snapshots: Snapshots) -> Self {
        Self { snapshots, failure: None }
    }

    pub fn failing(failure: SnapshotError) -> Self {
        Self { snapshots: Snapshots::default(), failure: Some(failure) }
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn load(&self) -> Result<Snapshots, SnapshotError> {
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(self.snapshots.clone()),
        }
    }

    async fn health_check(&self) -> Result<String, SnapshotError> {
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok("in-memory snapshot store".to_string()),
        }
    }
}
