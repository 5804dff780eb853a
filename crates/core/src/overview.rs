//! Ranked, paginated customer profile list for display.

use rust_decimal::Decimal;

use crate::domain::profile::CustomerProfile;
use crate::metrics;
use crate::snapshot::Snapshots;

/// Merges identity, visit metrics, spend, and preference/allergy rollups
/// into one profile per customer, anchored on the full customer set so
/// customers with no transactional history still appear with zero/empty
/// defaults.
///
/// Profiles are ranked by visit count descending, then last visit
/// descending with never-visited customers last. `limit > 0` truncates the
/// ranked list; any other value disables truncation. The rendered birth
/// date is an independent reparse of the stored text and uses no reference
/// date.
pub fn build_overview(snapshots: &Snapshots, limit: i64) -> Vec<CustomerProfile> {
    let average_tickets = metrics::average_ticket_by_customer(
        &snapshots.reservations,
        &snapshots.reservation_items,
        &snapshots.menu_items,
    );
    let visits = metrics::visit_metrics_by_customer(&snapshots.reservations);
    let preferences =
        metrics::preference_names_by_customer(&snapshots.customer_preferences, &snapshots.preferences);
    let allergies =
        metrics::allergy_names_by_customer(&snapshots.customer_allergies, &snapshots.allergies);

    let mut profiles: Vec<CustomerProfile> = snapshots
        .customers
        .iter()
        .map(|customer| {
            let visit = visits.get(&customer.id);
            CustomerProfile {
                customer_id: customer.id,
                name: customer.display_name(),
                email: customer.email.clone(),
                phone: customer.phone.clone(),
                birth_date: customer.parsed_birth_date(),
                visits_count: visit.map(|v| v.visits_count).unwrap_or(0),
                last_visit: visit.map(|v| v.last_visit),
                average_ticket: average_tickets.get(&customer.id).copied().unwrap_or(Decimal::ZERO),
                preferences: preferences.get(&customer.id).cloned().unwrap_or_default(),
                allergies: allergies.get(&customer.id).cloned().unwrap_or_default(),
            }
        })
        .collect();

    // None sorts below Some under Option's ordering, which in a descending
    // comparison puts never-visited customers last.
    profiles.sort_by(|a, b| {
        b.visits_count.cmp(&a.visits_count).then(b.last_visit.cmp(&a.last_visit))
    });

    if limit > 0 {
        profiles.truncate(limit as usize);
    }
    profiles
}
