//! Read-only snapshot loader over the CRM relations.
//!
//! Monetary columns are selected as text and parsed into `Decimal` on the
//! way out; non-numeric stored values degrade to `None` so a single dirty
//! row cannot fail a load. Connectivity problems and missing relations fail
//! the whole load, with no partial snapshot.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use tavolo_core::domain::customer::{Customer, CustomerId};
use tavolo_core::domain::menu::MenuItem;
use tavolo_core::domain::preference::{Allergy, CustomerAllergy, CustomerPreference, Preference};
use tavolo_core::domain::reservation::{Reservation, ReservationId, ReservationItem};
use tavolo_core::errors::SnapshotError;
use tavolo_core::snapshot::{SnapshotStore, Snapshots};

use crate::DbPool;

pub struct SqlSnapshotStore {
    pool: DbPool,
}

impl SqlSnapshotStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_customers(&self) -> Result<Vec<Customer>, SnapshotError> {
        let rows = sqlx::query(
            "SELECT customer_id, first_name, last_name, email, phone, birth_date, \
                    CAST(average_ticket_hint AS TEXT) AS average_ticket_hint_text \
             FROM customers \
             ORDER BY customer_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| classify("customers", error))?;

        rows.iter().map(customer_from_row).collect()
    }

    async fn load_reservations(&self) -> Result<Vec<Reservation>, SnapshotError> {
        let rows = sqlx::query(
            "SELECT reservation_id, customer_id, \
                    COALESCE(start_iso, created_at) AS reservation_ts, \
                    CAST(total_ticket AS TEXT) AS total_ticket_text \
             FROM reservations \
             ORDER BY reservation_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| classify("reservations", error))?;

        rows.iter().map(reservation_from_row).collect()
    }

    async fn load_reservation_items(&self) -> Result<Vec<ReservationItem>, SnapshotError> {
        let rows = sqlx::query(
            "SELECT reservation_id, sku, quantity, \
                    CAST(price_at_visit AS TEXT) AS price_at_visit_text \
             FROM reservation_items \
             ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| classify("reservation_items", error))?;

        rows.iter().map(reservation_item_from_row).collect()
    }

    async fn load_menu_items(&self) -> Result<Vec<MenuItem>, SnapshotError> {
        let rows = sqlx::query(
            "SELECT sku, CAST(price AS TEXT) AS price_text FROM menu_items ORDER BY sku ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| classify("menu_items", error))?;

        rows.iter().map(menu_item_from_row).collect()
    }

    async fn load_preferences(&self) -> Result<Vec<Preference>, SnapshotError> {
        let rows = sqlx::query(
            "SELECT preference_id, description FROM preferences ORDER BY preference_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| classify("preferences", error))?;

        rows.iter()
            .map(|row| {
                Ok(Preference {
                    id: get(row, "preferences", "preference_id")?,
                    description: get(row, "preferences", "description")?,
                })
            })
            .collect()
    }

    async fn load_customer_preferences(&self) -> Result<Vec<CustomerPreference>, SnapshotError> {
        let rows = sqlx::query(
            "SELECT customer_id, preference_id FROM customer_preferences ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| classify("customer_preferences", error))?;

        rows.iter()
            .map(|row| {
                Ok(CustomerPreference {
                    customer_id: CustomerId(get(row, "customer_preferences", "customer_id")?),
                    preference_id: get(row, "customer_preferences", "preference_id")?,
                })
            })
            .collect()
    }

    async fn load_allergies(&self) -> Result<Vec<Allergy>, SnapshotError> {
        let rows =
            sqlx::query("SELECT allergy_id, name FROM allergies ORDER BY allergy_id ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(|error| classify("allergies", error))?;

        rows.iter()
            .map(|row| {
                Ok(Allergy {
                    id: get(row, "allergies", "allergy_id")?,
                    name: get(row, "allergies", "name")?,
                })
            })
            .collect()
    }

    async fn load_customer_allergies(&self) -> Result<Vec<CustomerAllergy>, SnapshotError> {
        let rows = sqlx::query(
            "SELECT customer_id, allergy_id FROM customer_allergies ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| classify("customer_allergies", error))?;

        rows.iter()
            .map(|row| {
                Ok(CustomerAllergy {
                    customer_id: CustomerId(get(row, "customer_allergies", "customer_id")?),
                    allergy_id: get(row, "customer_allergies", "allergy_id")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SnapshotStore for SqlSnapshotStore {
    async fn load(&self) -> Result<Snapshots, SnapshotError> {
        let snapshots = Snapshots {
            customers: self.load_customers().await?,
            reservations: self.load_reservations().await?,
            reservation_items: self.load_reservation_items().await?,
            menu_items: self.load_menu_items().await?,
            preferences: self.load_preferences().await?,
            customer_preferences: self.load_customer_preferences().await?,
            allergies: self.load_allergies().await?,
            customer_allergies: self.load_customer_allergies().await?,
        };

        debug!(
            event_name = "crm.snapshot.loaded",
            customers = snapshots.customers.len(),
            reservations = snapshots.reservations.len(),
            "relational snapshots loaded"
        );
        Ok(snapshots)
    }

    async fn health_check(&self) -> Result<String, SnapshotError> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| SnapshotError::Unavailable(format!("health query failed: {error}")))?;
        Ok("data source reachable".to_string())
    }
}

fn customer_from_row(row: &SqliteRow) -> Result<Customer, SnapshotError> {
    Ok(Customer {
        id: CustomerId(get(row, "customers", "customer_id")?),
        first_name: get(row, "customers", "first_name")?,
        last_name: get(row, "customers", "last_name")?,
        email: get(row, "customers", "email")?,
        phone: get(row, "customers", "phone")?,
        birth_date: get(row, "customers", "birth_date")?,
        average_ticket_hint: decimal_from_text(get(row, "customers", "average_ticket_hint_text")?),
    })
}

fn reservation_from_row(row: &SqliteRow) -> Result<Reservation, SnapshotError> {
    let ts: DateTime<Utc> = get(row, "reservations", "reservation_ts")?;
    Ok(Reservation {
        id: ReservationId(get(row, "reservations", "reservation_id")?),
        customer_id: CustomerId(get(row, "reservations", "customer_id")?),
        ts,
        total: decimal_from_text(get(row, "reservations", "total_ticket_text")?),
    })
}

fn reservation_item_from_row(row: &SqliteRow) -> Result<ReservationItem, SnapshotError> {
    Ok(ReservationItem {
        reservation_id: ReservationId(get(row, "reservation_items", "reservation_id")?),
        sku: get(row, "reservation_items", "sku")?,
        quantity: get(row, "reservation_items", "quantity")?,
        price_at_visit: decimal_from_text(get(row, "reservation_items", "price_at_visit_text")?),
    })
}

fn menu_item_from_row(row: &SqliteRow) -> Result<MenuItem, SnapshotError> {
    Ok(MenuItem {
        sku: get(row, "menu_items", "sku")?,
        price: decimal_from_text(get(row, "menu_items", "price_text")?),
    })
}

fn get<'r, T>(row: &'r SqliteRow, relation: &str, column: &str) -> Result<T, SnapshotError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(|error| {
        SnapshotError::Unavailable(format!("failed to decode `{relation}.{column}`: {error}"))
    })
}

/// Text-to-decimal coercion for amounts stored in loosely typed columns.
/// Blank or non-numeric text is treated as absent, not as an error.
fn decimal_from_text(raw: Option<String>) -> Option<Decimal> {
    raw.as_deref().map(str::trim).filter(|value| !value.is_empty()).and_then(|value| {
        Decimal::from_str(value).ok()
    })
}

fn classify(relation: &str, error: sqlx::Error) -> SnapshotError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.message().contains("no such table") {
            return SnapshotError::MissingRelation(relation.to_string());
        }
    }
    SnapshotError::Unavailable(format!("failed to read `{relation}`: {error}"))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::decimal_from_text;

    #[test]
    fn decimal_coercion_accepts_numeric_text_and_drops_garbage() {
        assert_eq!(decimal_from_text(Some("123.45".to_string())), Decimal::from_str_exact("123.45").ok());
        assert_eq!(decimal_from_text(Some(" 12 ".to_string())), Some(Decimal::from(12)));
        assert_eq!(decimal_from_text(Some("not-a-number".to_string())), None);
        assert_eq!(decimal_from_text(Some("".to_string())), None);
        assert_eq!(decimal_from_text(None), None);
    }
}
