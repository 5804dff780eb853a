//! Campaign composition: discount tier selection and message rendering for
//! each segment.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::campaign::{Campaign, CampaignOffer};
use crate::domain::customer::CustomerId;
use crate::segment::{BirthdayMatch, InactivityMatch};

pub const BIRTHDAY_SUBJECT: &str = "An early happy birthday!";
pub const INACTIVITY_SUBJECT: &str = "We miss you!";

/// Win-back campaigns carry this flat discount regardless of spend tier.
pub const INACTIVITY_DISCOUNT_PCT: u8 = 15;

/// Spend-tiered birthday discount. Band lower bounds are inclusive, so an
/// average ticket of exactly 300 lands in the top band.
pub fn birthday_discount_pct(average_ticket: Decimal) -> u8 {
    if average_ticket >= Decimal::from(300) {
        20
    } else if average_ticket >= Decimal::from(150) {
        15
    } else {
        10
    }
}

/// One campaign per birthday match, tiered by that customer's average
/// ticket (zero when the customer has no spend history). An empty segment
/// composes to an empty list.
pub fn compose_birthday_campaigns(
    matches: &[BirthdayMatch],
    average_tickets: &HashMap<CustomerId, Decimal>,
) -> Vec<Campaign> {
    matches
        .iter()
        .map(|entry| {
            let average_ticket =
                average_tickets.get(&entry.customer_id).copied().unwrap_or(Decimal::ZERO);
            let discount_pct = birthday_discount_pct(average_ticket);
            Campaign {
                customer_id: entry.customer_id,
                name: entry.name.clone(),
                email: entry.email.clone(),
                offer: CampaignOffer::Birthday { days_until: entry.days_until, discount_pct },
                subject: BIRTHDAY_SUBJECT.to_string(),
                message: format!(
                    "Hi {}, your birthday is {} days away. Enjoy a {}% discount on your next visit!",
                    entry.name, entry.days_until, discount_pct
                ),
            }
        })
        .collect()
}

/// One win-back campaign per lapsed customer, referencing the exact day
/// count since their last visit.
pub fn compose_inactivity_campaigns(matches: &[InactivityMatch]) -> Vec<Campaign> {
    matches
        .iter()
        .map(|entry| Campaign {
            customer_id: entry.customer_id,
            name: entry.name.clone(),
            email: entry.email.clone(),
            offer: CampaignOffer::Inactivity {
                days_since_last: entry.days_since_last,
                discount_pct: INACTIVITY_DISCOUNT_PCT,
            },
            subject: INACTIVITY_SUBJECT.to_string(),
            message: format!(
                "Hi {}, it has been {} days since your last visit. Book a table this week and enjoy a {}% discount!",
                entry.name, entry.days_since_last, INACTIVITY_DISCOUNT_PCT
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn discount_tiers_are_monotonic_and_boundary_inclusive() {
        assert_eq!(birthday_discount_pct(Decimal::from(300)), 20);
        assert_eq!(birthday_discount_pct(Decimal::new(29_999, 2)), 15);
        assert_eq!(birthday_discount_pct(Decimal::from(150)), 15);
        assert_eq!(birthday_discount_pct(Decimal::new(14_999, 2)), 10);
        assert_eq!(birthday_discount_pct(Decimal::ZERO), 10);
        assert_eq!(birthday_discount_pct(Decimal::from(1_000)), 20);
    }

    #[test]
    fn birthday_campaigns_render_name_days_and_discount() {
        let matches = vec![BirthdayMatch {
            customer_id: CustomerId(1),
            name: "Ada Moreno".to_string(),
            email: Some("ada@example.com".to_string()),
            days_until: 3,
        }];
        let tickets = HashMap::from([(CustomerId(1), Decimal::from(320))]);

        let campaigns = compose_birthday_campaigns(&matches, &tickets);

        assert_eq!(campaigns.len(), 1);
        assert_eq!(
            campaigns[0].offer,
            CampaignOffer::Birthday { days_until: 3, discount_pct: 20 }
        );
        assert_eq!(campaigns[0].subject, BIRTHDAY_SUBJECT);
        assert!(campaigns[0].message.contains("Ada Moreno"));
        assert!(campaigns[0].message.contains("3 days"));
        assert!(campaigns[0].message.contains("20%"));
    }

    #[test]
    fn customers_without_spend_history_fall_into_the_base_tier() {
        let matches = vec![BirthdayMatch {
            customer_id: CustomerId(2),
            name: "Bruno".to_string(),
            email: None,
            days_until: 5,
        }];

        let campaigns = compose_birthday_campaigns(&matches, &HashMap::new());

        assert_eq!(campaigns[0].offer.discount_pct(), 10);
    }

    #[test]
    fn inactivity_campaigns_carry_the_flat_discount_and_day_count() {
        let matches = vec![InactivityMatch {
            customer_id: CustomerId(3),
            name: "Carla".to_string(),
            email: Some("carla@example.com".to_string()),
            days_since_last: 42,
        }];

        let campaigns = compose_inactivity_campaigns(&matches);

        assert_eq!(
            campaigns[0].offer,
            CampaignOffer::Inactivity { days_since_last: 42, discount_pct: 15 }
        );
        assert!(campaigns[0].message.contains("42 days"));
        assert!(campaigns[0].message.contains("15%"));
    }

    #[test]
    fn empty_segments_compose_to_empty_campaign_lists() {
        assert!(compose_birthday_campaigns(&[], &HashMap::new()).is_empty());
        assert!(compose_inactivity_campaigns(&[]).is_empty());
    }
}
