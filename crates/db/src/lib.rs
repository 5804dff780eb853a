pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod snapshots;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{CrmSeedDataset, SeedVerification};
pub use snapshots::SqlSnapshotStore;
