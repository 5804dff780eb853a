pub mod compose;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod overview;
pub mod segment;
pub mod snapshot;

pub use compose::{
    birthday_discount_pct, compose_birthday_campaigns, compose_inactivity_campaigns,
    BIRTHDAY_SUBJECT, INACTIVITY_DISCOUNT_PCT, INACTIVITY_SUBJECT,
};
pub use dispatch::{
    dispatch_campaigns, DispatchReport, FailedDelivery, InMemoryMailTransport, MailTransport,
    RecordedMail, SkippedCampaign,
};
pub use domain::campaign::{Campaign, CampaignOffer};
pub use domain::customer::{Customer, CustomerId};
pub use domain::menu::MenuItem;
pub use domain::preference::{Allergy, CustomerAllergy, CustomerPreference, Preference};
pub use domain::profile::CustomerProfile;
pub use domain::reservation::{Reservation, ReservationId, ReservationItem};
pub use engine::{CrmEngine, HealthStatus};
pub use errors::{EngineError, MailError, SnapshotError};
pub use metrics::{
    allergy_names_by_customer, average_ticket_by_customer, preference_names_by_customer,
    visit_metrics_by_customer, VisitMetrics,
};
pub use overview::build_overview;
pub use segment::{lapsed_customers, upcoming_birthdays, BirthdayMatch, InactivityMatch};
pub use snapshot::{InMemorySnapshotStore, SnapshotStore, Snapshots};
