//! Time-based eligibility rules: the upcoming-birthday window and the
//! inactivity threshold.
//!
//! Both evaluators take the reference date/time as an argument, so segment
//! membership is a pure function of (snapshot data, date) and re-running
//! with the same inputs yields the same members.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::domain::customer::{Customer, CustomerId};
use crate::metrics::VisitMetrics;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BirthdayMatch {
    pub customer_id: CustomerId,
    pub name: String,
    pub email: Option<String>,
    pub days_until: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InactivityMatch {
    pub customer_id: CustomerId,
    pub name: String,
    pub email: Option<String>,
    pub days_since_last: i64,
}

/// Customers whose next birthday falls within `[0, days_ahead]` days of
/// `today`, in source customer order. Customers without a parseable birth
/// date are silently excluded.
pub fn upcoming_birthdays(
    customers: &[Customer],
    today: NaiveDate,
    days_ahead: i64,
) -> Vec<BirthdayMatch> {
    customers
        .iter()
        .filter_map(|customer| {
            let birth = customer.parsed_birth_date()?;
            let next = next_anniversary(birth, today)?;
            let days_until = (next - today).num_days();
            (0..=days_ahead).contains(&days_until).then(|| BirthdayMatch {
                customer_id: customer.id,
                name: customer.display_name(),
                email: customer.email.clone(),
                days_until,
            })
        })
        .collect()
}

/// Next occurrence of the birth month/day on or after `today`.
fn next_anniversary(birth: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    let this_year = observed_anniversary(birth, today.year())?;
    if this_year < today {
        observed_anniversary(birth, today.year() + 1)
    } else {
        Some(this_year)
    }
}

/// The birth month/day applied to `year`. A February 29 birthday is
/// observed on March 1 in non-leap years.
fn observed_anniversary(birth: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, birth.month(), birth.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}

/// Customers whose last visit is strictly more than `days_since` whole days
/// before `now`, in source customer order. A customer with no reservations
/// is always included, carrying the sentinel `days_since + 1`.
pub fn lapsed_customers(
    customers: &[Customer],
    visits: &HashMap<CustomerId, VisitMetrics>,
    now: DateTime<Utc>,
    days_since: i64,
) -> Vec<InactivityMatch> {
    customers
        .iter()
        .filter_map(|customer| {
            let days_since_last = match visits.get(&customer.id) {
                Some(metrics) => (now - metrics.last_visit).num_days(),
                None => days_since + 1,
            };
            (days_since_last > days_since).then(|| InactivityMatch {
                customer_id: customer.id,
                name: customer.display_name(),
                email: customer.email.clone(),
                days_since_last,
            })
        })
        .collect()
}
