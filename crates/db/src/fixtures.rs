use sqlx::Executor;
use tavolo_core::errors::SnapshotError;

use crate::DbPool;

/// Expected row counts for the seeded relations, used by the verification
/// contract below.
const SEED_COUNTS: &[(&str, i64)] = &[
    ("customers", 3),
    ("reservations", 3),
    ("reservation_items", 3),
    ("menu_items", 3),
    ("preferences", 3),
    ("customer_preferences", 4),
    ("allergies", 2),
    ("customer_allergies", 2),
];

/// Deterministic CRM seed dataset covering a regular customer, a customer
/// whose reservation carries no stored total, and a customer with no
/// transactional history at all.
pub struct CrmSeedDataset;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedVerification {
    pub checks: Vec<(&'static str, bool)>,
}

impl SeedVerification {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|(_, passed)| *passed)
    }
}

impl CrmSeedDataset {
    /// SQL fixture content for the CRM seed data.
    pub const SQL: &str = include_str!("../../../config/fixtures/crm_seed_data.sql");

    /// Loads the seed dataset in one transaction.
    pub async fn load(pool: &DbPool) -> Result<(), SnapshotError> {
        let mut tx = pool.begin().await.map_err(seed_error)?;
        tx.execute(sqlx::query(Self::SQL)).await.map_err(seed_error)?;
        tx.commit().await.map_err(seed_error)
    }

    /// Verifies that every seeded relation holds the expected number of rows.
    pub async fn verify(pool: &DbPool) -> Result<SeedVerification, SnapshotError> {
        let mut checks = Vec::with_capacity(SEED_COUNTS.len());
        for (relation, expected) in SEED_COUNTS {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(1) FROM {relation}"))
                .fetch_one(pool)
                .await
                .map_err(seed_error)?;
            checks.push((*relation, count == *expected));
        }
        Ok(SeedVerification { checks })
    }
}

fn seed_error(error: sqlx::Error) -> SnapshotError {
    SnapshotError::Unavailable(format!("seed dataset failure: {error}"))
}
