//! Facade over the full campaign pipeline: load snapshots, derive metrics,
//! segment, compose, and optionally dispatch.
//!
//! The engine holds no state between calls. Every operation re-loads the
//! snapshots and recomputes segment membership from scratch, so a rerun
//! against unchanged data on the same day produces identical results.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::compose;
use crate::dispatch::{self, DispatchReport, MailTransport};
use crate::domain::campaign::Campaign;
use crate::domain::profile::CustomerProfile;
use crate::errors::EngineError;
use crate::metrics;
use crate::overview;
use crate::segment;
use crate::snapshot::SnapshotStore;

pub const TEST_EMAIL_SUBJECT: &str = "Tavolo CRM delivery check";
pub const TEST_EMAIL_BODY: &str =
    "If you are reading this, the mail transport is configured correctly.";

/// Outcome of an infrastructure probe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub detail: String,
}

impl HealthStatus {
    fn ok(detail: impl Into<String>) -> Self {
        Self { ok: true, detail: detail.into() }
    }

    fn failed(detail: impl Into<String>) -> Self {
        Self { ok: false, detail: detail.into() }
    }
}

pub struct CrmEngine<S, M> {
    store: S,
    mailer: M,
}

impl<S, M> CrmEngine<S, M>
where
    S: SnapshotStore,
    M: MailTransport,
{
    pub fn new(store: S, mailer: M) -> Self {
        Self { store, mailer }
    }

    /// Composes birthday campaigns for customers whose next birthday falls
    /// within `days_ahead` days, without sending anything.
    pub async fn prepare_birthday_campaigns(
        &self,
        days_ahead: i64,
    ) -> Result<Vec<Campaign>, EngineError> {
        let snapshots = self.store.load().await?;
        let today = Utc::now().date_naive();

        let matches = segment::upcoming_birthdays(&snapshots.customers, today, days_ahead);
        let average_tickets = metrics::average_ticket_by_customer(
            &snapshots.reservations,
            &snapshots.reservation_items,
            &snapshots.menu_items,
        );
        let campaigns = compose::compose_birthday_campaigns(&matches, &average_tickets);

        info!(
            event_name = "crm.campaigns.birthday_prepared",
            days_ahead,
            customers = snapshots.customers.len(),
            campaigns = campaigns.len(),
            "birthday campaigns composed"
        );
        Ok(campaigns)
    }

    /// Composes win-back campaigns for customers lapsed for strictly more
    /// than `days_since` days, without sending anything.
    pub async fn prepare_inactive_campaigns(
        &self,
        days_since: i64,
    ) -> Result<Vec<Campaign>, EngineError> {
        let snapshots = self.store.load().await?;
        let now = Utc::now();

        let visits = metrics::visit_metrics_by_customer(&snapshots.reservations);
        let matches = segment::lapsed_customers(&snapshots.customers, &visits, now, days_since);
        let campaigns = compose::compose_inactivity_campaigns(&matches);

        info!(
            event_name = "crm.campaigns.inactive_prepared",
            days_since,
            customers = snapshots.customers.len(),
            campaigns = campaigns.len(),
            "inactivity campaigns composed"
        );
        Ok(campaigns)
    }

    /// Composes and dispatches birthday campaigns in one run.
    pub async fn send_birthday_campaigns(
        &self,
        days_ahead: i64,
    ) -> Result<DispatchReport, EngineError> {
        let campaigns = self.prepare_birthday_campaigns(days_ahead).await?;
        Ok(self.dispatch("birthday", &campaigns).await)
    }

    /// Composes and dispatches win-back campaigns in one run.
    pub async fn send_inactive_campaigns(
        &self,
        days_since: i64,
    ) -> Result<DispatchReport, EngineError> {
        let campaigns = self.prepare_inactive_campaigns(days_since).await?;
        Ok(self.dispatch("inactive", &campaigns).await)
    }

    /// Ranked, paginated per-customer profile list. `limit <= 0` returns
    /// the full set.
    pub async fn customers_overview(&self, limit: i64) -> Result<Vec<CustomerProfile>, EngineError> {
        let snapshots = self.store.load().await?;
        let profiles = overview::build_overview(&snapshots, limit);

        info!(
            event_name = "crm.overview.built",
            limit,
            profiles = profiles.len(),
            "customer overview built"
        );
        Ok(profiles)
    }

    pub async fn data_source_health_check(&self) -> HealthStatus {
        match self.store.health_check().await {
            Ok(detail) => HealthStatus::ok(detail),
            Err(error) => HealthStatus::failed(error.to_string()),
        }
    }

    pub async fn mail_transport_health_check(&self) -> HealthStatus {
        match self.mailer.health_check().await {
            Ok(()) => HealthStatus::ok("mail transport reachable"),
            Err(error) => HealthStatus::failed(error.to_string()),
        }
    }

    /// Sends a fixed probe message through the regular delivery path.
    pub async fn send_test_email(&self, address: &str) -> HealthStatus {
        match self.mailer.send(address, TEST_EMAIL_SUBJECT, TEST_EMAIL_BODY).await {
            Ok(()) => HealthStatus::ok(format!("test email sent to {address}")),
            Err(error) => HealthStatus::failed(error.to_string()),
        }
    }

    async fn dispatch(&self, segment: &str, campaigns: &[Campaign]) -> DispatchReport {
        let report = dispatch::dispatch_campaigns(&self.mailer, campaigns).await;
        info!(
            event_name = "crm.dispatch.completed",
            segment,
            planned = report.planned,
            sent = report.sent,
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "campaign dispatch finished"
        );
        report
    }
}
