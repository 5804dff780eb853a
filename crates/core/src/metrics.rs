//! Per-customer derived metrics: average ticket, visit recency/frequency,
//! and preference/allergy name rollups.
//!
//! Every function aggregates one-to-many data down to exactly one entry per
//! customer before anything downstream joins on it. Customers with no
//! underlying rows are absent from the output maps; callers default to
//! zero/empty on a lookup miss.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::customer::CustomerId;
use crate::domain::menu::MenuItem;
use crate::domain::preference::{Allergy, CustomerAllergy, CustomerPreference, Preference};
use crate::domain::reservation::{Reservation, ReservationId, ReservationItem};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisitMetrics {
    pub visits_count: u64,
    pub last_visit: DateTime<Utc>,
}

/// Mean per-reservation spend per customer.
///
/// Two computation paths, selected by data availability rather than by
/// error handling: when any reservation carries a stored total, stored
/// totals are authoritative (missing ones count as zero); otherwise each
/// reservation's spend is recomputed from its line items, preferring the
/// price captured at visit time and falling back to the current menu price.
pub fn average_ticket_by_customer(
    reservations: &[Reservation],
    items: &[ReservationItem],
    menu: &[MenuItem],
) -> HashMap<CustomerId, Decimal> {
    let use_stored_totals = reservations.iter().any(|reservation| reservation.total.is_some());

    let recomputed = if use_stored_totals { HashMap::new() } else { spend_from_items(items, menu) };

    let mut sums: HashMap<CustomerId, (Decimal, u64)> = HashMap::new();
    for reservation in reservations {
        let spend = if use_stored_totals {
            reservation.total.unwrap_or(Decimal::ZERO)
        } else {
            recomputed.get(&reservation.id).copied().unwrap_or(Decimal::ZERO)
        };
        // A reservation can never contribute negative spend, whichever
        // branch produced the amount.
        let spend = spend.max(Decimal::ZERO);
        let entry = sums.entry(reservation.customer_id).or_insert((Decimal::ZERO, 0));
        entry.0 += spend;
        entry.1 += 1;
    }

    sums.into_iter().map(|(customer_id, (sum, count))| (customer_id, sum / Decimal::from(count))).collect()
}

/// Per-reservation spend recomputed from line items. A missing quantity or
/// price contributes zero to the line; a line can never go negative.
fn spend_from_items(items: &[ReservationItem], menu: &[MenuItem]) -> HashMap<ReservationId, Decimal> {
    let menu_prices: HashMap<&str, Decimal> = menu
        .iter()
        .filter_map(|item| item.price.map(|price| (item.sku.as_str(), price)))
        .collect();

    let mut totals: HashMap<ReservationId, Decimal> = HashMap::new();
    for item in items {
        let price = item
            .price_at_visit
            .or_else(|| menu_prices.get(item.sku.as_str()).copied())
            .unwrap_or(Decimal::ZERO);
        let quantity = Decimal::from(item.quantity.unwrap_or(0));
        let line_total = (quantity * price).max(Decimal::ZERO);
        *totals.entry(item.reservation_id).or_insert(Decimal::ZERO) += line_total;
    }
    totals
}

/// Reservation count and most recent visit timestamp per customer.
pub fn visit_metrics_by_customer(reservations: &[Reservation]) -> HashMap<CustomerId, VisitMetrics> {
    let mut metrics: HashMap<CustomerId, VisitMetrics> = HashMap::new();
    for reservation in reservations {
        let entry = metrics
            .entry(reservation.customer_id)
            .or_insert(VisitMetrics { visits_count: 0, last_visit: reservation.ts });
        entry.visits_count += 1;
        if reservation.ts > entry.last_visit {
            entry.last_visit = reservation.ts;
        }
    }
    metrics
}

/// Preference descriptions per customer, in source edge order.
pub fn preference_names_by_customer(
    edges: &[CustomerPreference],
    lookup: &[Preference],
) -> HashMap<CustomerId, Vec<String>> {
    let names: HashMap<i64, &str> = lookup
        .iter()
        .filter_map(|preference| preference.description.as_deref().map(|name| (preference.id, name)))
        .collect();
    collect_names(edges.iter().map(|edge| (edge.customer_id, edge.preference_id)), &names)
}

/// Allergy names per customer, in source edge order.
pub fn allergy_names_by_customer(
    edges: &[CustomerAllergy],
    lookup: &[Allergy],
) -> HashMap<CustomerId, Vec<String>> {
    let names: HashMap<i64, &str> = lookup
        .iter()
        .filter_map(|allergy| allergy.name.as_deref().map(|name| (allergy.id, name)))
        .collect();
    collect_names(edges.iter().map(|edge| (edge.customer_id, edge.allergy_id)), &names)
}

/// Inner-join of edge pairs to the name lookup. Edges whose target has no
/// (non-null) name are dropped; list order follows edge order.
fn collect_names(
    edges: impl Iterator<Item = (CustomerId, i64)>,
    names: &HashMap<i64, &str>,
) -> HashMap<CustomerId, Vec<String>> {
    let mut rollup: HashMap<CustomerId, Vec<String>> = HashMap::new();
    for (customer_id, target_id) in edges {
        if let Some(name) = names.get(&target_id) {
            rollup.entry(customer_id).or_default().push((*name).to_string());
        }
    }
    rollup
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;

    fn reservation(id: i64, customer_id: i64, day: u32, total: Option<i64>) -> Reservation {
        Reservation {
            id: ReservationId(id),
            customer_id: CustomerId(customer_id),
            ts: Utc.with_ymd_and_hms(2025, 6, day, 20, 0, 0).unwrap(),
            total: total.map(Decimal::from),
        }
    }

    fn item(reservation_id: i64, sku: &str, quantity: Option<i64>, price: Option<i64>) -> ReservationItem {
        ReservationItem {
            reservation_id: ReservationId(reservation_id),
            sku: sku.to_string(),
            quantity,
            price_at_visit: price.map(Decimal::from),
        }
    }

    #[test]
    fn stored_totals_branch_averages_totals_and_zeroes_missing_ones() {
        let reservations = vec![
            reservation(1, 7, 1, Some(100)),
            reservation(2, 7, 2, Some(200)),
            reservation(3, 7, 3, None),
        ];

        let averages = average_ticket_by_customer(&reservations, &[], &[]);

        assert_eq!(averages[&CustomerId(7)], Decimal::from(100));
    }

    #[test]
    fn line_item_branch_sums_quantity_times_price_per_reservation() {
        let reservations = vec![reservation(1, 7, 1, None), reservation(2, 7, 2, None)];
        let items = vec![
            item(1, "tapas", Some(2), Some(10)),
            item(1, "wine", Some(1), Some(20)),
            item(2, "tapas", Some(1), Some(10)),
        ];

        let averages = average_ticket_by_customer(&reservations, &items, &[]);

        // (40 + 10) / 2
        assert_eq!(averages[&CustomerId(7)], Decimal::from(25));
    }

    #[test]
    fn line_item_branch_prefers_captured_price_and_falls_back_to_menu() {
        let reservations = vec![reservation(1, 7, 1, None)];
        let items = vec![
            item(1, "captured", Some(1), Some(30)),
            item(1, "menu-only", Some(2), None),
            item(1, "unknown-sku", Some(5), None),
        ];
        let menu = vec![
            MenuItem { sku: "captured".to_string(), price: Some(Decimal::from(99)) },
            MenuItem { sku: "menu-only".to_string(), price: Some(Decimal::from(5)) },
        ];

        let averages = average_ticket_by_customer(&reservations, &items, &menu);

        // 30 + 2*5 + 0
        assert_eq!(averages[&CustomerId(7)], Decimal::from(40));
    }

    #[test]
    fn missing_quantity_or_price_contributes_zero_and_lines_never_go_negative() {
        let reservations = vec![reservation(1, 7, 1, None)];
        let items = vec![
            item(1, "no-quantity", None, Some(50)),
            item(1, "no-price", Some(3), None),
            item(1, "refund", Some(-2), Some(10)),
            item(1, "paid", Some(1), Some(12)),
        ];

        let averages = average_ticket_by_customer(&reservations, &items, &[]);

        assert_eq!(averages[&CustomerId(7)], Decimal::from(12));
    }

    #[test]
    fn negative_stored_totals_are_floored_at_zero() {
        let reservations = vec![reservation(1, 7, 1, Some(-50)), reservation(2, 7, 2, Some(100))];

        let averages = average_ticket_by_customer(&reservations, &[], &[]);

        assert_eq!(averages[&CustomerId(7)], Decimal::from(50));
    }

    #[test]
    fn customers_without_reservations_are_absent_from_spend_output() {
        let averages = average_ticket_by_customer(&[], &[], &[]);
        assert!(averages.is_empty());

        let averages =
            average_ticket_by_customer(&[reservation(1, 7, 1, Some(80))], &[], &[]);
        assert!(!averages.contains_key(&CustomerId(8)));
    }

    #[test]
    fn visit_metrics_count_reservations_and_keep_the_latest_timestamp() {
        let reservations = vec![
            reservation(1, 7, 3, None),
            reservation(2, 7, 9, None),
            reservation(3, 7, 5, None),
            reservation(4, 8, 1, None),
        ];

        let metrics = visit_metrics_by_customer(&reservations);

        assert_eq!(metrics[&CustomerId(7)].visits_count, 3);
        assert_eq!(metrics[&CustomerId(7)].last_visit, Utc.with_ymd_and_hms(2025, 6, 9, 20, 0, 0).unwrap());
        assert_eq!(metrics[&CustomerId(8)].visits_count, 1);
        assert!(!metrics.contains_key(&CustomerId(9)));
    }

    #[test]
    fn rollups_keep_edge_order_and_drop_null_or_dangling_names() {
        let lookup = vec![
            Preference { id: 1, description: Some("window seat".to_string()) },
            Preference { id: 2, description: None },
            Preference { id: 3, description: Some("tasting menu".to_string()) },
        ];
        let edges = vec![
            CustomerPreference { customer_id: CustomerId(7), preference_id: 3 },
            CustomerPreference { customer_id: CustomerId(7), preference_id: 2 },
            CustomerPreference { customer_id: CustomerId(7), preference_id: 1 },
            CustomerPreference { customer_id: CustomerId(8), preference_id: 99 },
        ];

        let rollup = preference_names_by_customer(&edges, &lookup);

        assert_eq!(rollup[&CustomerId(7)], vec!["tasting menu", "window seat"]);
        assert!(!rollup.contains_key(&CustomerId(8)));
    }

    #[test]
    fn allergy_rollup_mirrors_preference_rollup() {
        let lookup = vec![Allergy { id: 1, name: Some("peanuts".to_string()) }];
        let edges = vec![
            CustomerAllergy { customer_id: CustomerId(7), allergy_id: 1 },
            CustomerAllergy { customer_id: CustomerId(7), allergy_id: 1 },
        ];

        let rollup = allergy_names_by_customer(&edges, &lookup);

        // Source data is not deduplicated; neither is the rollup.
        assert_eq!(rollup[&CustomerId(7)], vec!["peanuts", "peanuts"]);
    }
}
