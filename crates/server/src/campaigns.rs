//! HTTP surface for the campaign engine: one route per public operation.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tavolo_core::config::CampaignConfig;
use tavolo_core::dispatch::{DispatchReport, MailTransport};
use tavolo_core::domain::campaign::Campaign;
use tavolo_core::domain::profile::CustomerProfile;
use tavolo_core::engine::{CrmEngine, HealthStatus};
use tavolo_core::errors::EngineError;
use tavolo_core::snapshot::SnapshotStore;
use tracing::info;
use uuid::Uuid;

pub struct CrmState<S, M> {
    pub engine: Arc<CrmEngine<S, M>>,
    pub defaults: CampaignConfig,
}

impl<S, M> Clone for CrmState<S, M> {
    fn clone(&self) -> Self {
        Self { engine: Arc::clone(&self.engine), defaults: self.defaults.clone() }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct BirthdayQuery {
    #[serde(default)]
    pub days_ahead: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct InactiveQuery {
    #[serde(default)]
    pub days_since: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OverviewQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TestEmailRequest {
    pub address: String,
}

pub fn router<S, M>(state: CrmState<S, M>) -> Router
where
    S: SnapshotStore + 'static,
    M: MailTransport + 'static,
{
    Router::new()
        .route("/api/v1/campaigns/birthday", get(prepare_birthday::<S, M>))
        .route("/api/v1/campaigns/birthday/send", post(send_birthday::<S, M>))
        .route("/api/v1/campaigns/inactive", get(prepare_inactive::<S, M>))
        .route("/api/v1/campaigns/inactive/send", post(send_inactive::<S, M>))
        .route("/api/v1/customers/overview", get(customers_overview::<S, M>))
        .route("/api/v1/mail/test", post(send_test_email::<S, M>))
        .with_state(state)
}

fn engine_error(error: EngineError) -> (StatusCode, Json<ApiError>) {
    (StatusCode::SERVICE_UNAVAILABLE, Json(ApiError { error: error.to_string() }))
}

pub async fn prepare_birthday<S, M>(
    State(state): State<CrmState<S, M>>,
    Query(query): Query<BirthdayQuery>,
) -> Result<Json<Vec<Campaign>>, (StatusCode, Json<ApiError>)>
where
    S: SnapshotStore,
    M: MailTransport,
{
    let days_ahead = query.days_ahead.unwrap_or(state.defaults.birthday_days_ahead);
    let campaigns =
        state.engine.prepare_birthday_campaigns(days_ahead).await.map_err(engine_error)?;
    Ok(Json(campaigns))
}

pub async fn send_birthday<S, M>(
    State(state): State<CrmState<S, M>>,
    Query(query): Query<BirthdayQuery>,
) -> Result<Json<DispatchReport>, (StatusCode, Json<ApiError>)>
where
    S: SnapshotStore,
    M: MailTransport,
{
    let days_ahead = query.days_ahead.unwrap_or(state.defaults.birthday_days_ahead);
    let correlation_id = Uuid::new_v4().simple().to_string();
    let report = state.engine.send_birthday_campaigns(days_ahead).await.map_err(engine_error)?;
    info!(
        event_name = "crm.api.birthday_dispatched",
        correlation_id = %correlation_id,
        days_ahead,
        planned = report.planned,
        sent = report.sent,
        "birthday campaign batch dispatched"
    );
    Ok(Json(report))
}

pub async fn prepare_inactive<S, M>(
    State(state): State<CrmState<S, M>>,
    Query(query): Query<InactiveQuery>,
) -> Result<Json<Vec<Campaign>>, (StatusCode, Json<ApiError>)>
where
    S: SnapshotStore,
    M: MailTransport,
{
    let days_since = query.days_since.unwrap_or(state.defaults.inactive_days_since);
    let campaigns =
        state.engine.prepare_inactive_campaigns(days_since).await.map_err(engine_error)?;
    Ok(Json(campaigns))
}

pub async fn send_inactive<S, M>(
    State(state): State<CrmState<S, M>>,
    Query(query): Query<InactiveQuery>,
) -> Result<Json<DispatchReport>, (StatusCode, Json<ApiError>)>
where
    S: SnapshotStore,
    M: MailTransport,
{
    let days_since = query.days_since.unwrap_or(state.defaults.inactive_days_since);
    let correlation_id = Uuid::new_v4().simple().to_string();
    let report = state.engine.send_inactive_campaigns(days_since).await.map_err(engine_error)?;
    info!(
        event_name = "crm.api.inactive_dispatched",
        correlation_id = %correlation_id,
        days_since,
        planned = report.planned,
        sent = report.sent,
        "inactivity campaign batch dispatched"
    );
    Ok(Json(report))
}

pub async fn customers_overview<S, M>(
    State(state): State<CrmState<S, M>>,
    Query(query): Query<OverviewQuery>,
) -> Result<Json<Vec<CustomerProfile>>, (StatusCode, Json<ApiError>)>
where
    S: SnapshotStore,
    M: MailTransport,
{
    let limit = query.limit.unwrap_or(state.defaults.overview_limit);
    let profiles = state.engine.customers_overview(limit).await.map_err(engine_error)?;
    Ok(Json(profiles))
}

pub async fn send_test_email<S, M>(
    State(state): State<CrmState<S, M>>,
    Json(request): Json<TestEmailRequest>,
) -> Json<HealthStatus>
where
    S: SnapshotStore,
    M: MailTransport,
{
    Json(state.engine.send_test_email(&request.address).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Query, State};
    use axum::Json;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use tavolo_core::config::CampaignConfig;
    use tavolo_core::dispatch::InMemoryMailTransport;
    use tavolo_core::domain::campaign::CampaignOffer;
    use tavolo_core::domain::customer::{Customer, CustomerId};
    use tavolo_core::domain::reservation::{Reservation, ReservationId};
    use tavolo_core::engine::CrmEngine;
    use tavolo_core::snapshot::{InMemorySnapshotStore, Snapshots};

    use super::*;

    fn defaults() -> CampaignConfig {
        CampaignConfig { birthday_days_ahead: 7, inactive_days_since: 30, overview_limit: 200 }
    }

    fn state(snapshots: Snapshots) -> CrmState<InMemorySnapshotStore, InMemoryMailTransport> {
        CrmState {
            engine: Arc::new(CrmEngine::new(
                InMemorySnapshotStore::new(snapshots),
                InMemoryMailTransport::new(),
            )),
            defaults: defaults(),
        }
    }

    fn customer(id: i64, email: Option<&str>) -> Customer {
        Customer {
            id: CustomerId(id),
            first_name: Some(format!("Customer{id}")),
            last_name: None,
            email: email.map(str::to_string),
            phone: None,
            birth_date: None,
            average_ticket_hint: None,
        }
    }

    #[tokio::test]
    async fn inactive_campaigns_use_the_configured_default_threshold() {
        let snapshots = Snapshots {
            customers: vec![customer(1, Some("lapsed@example.com"))],
            reservations: vec![Reservation {
                id: ReservationId(1),
                customer_id: CustomerId(1),
                ts: Utc::now() - Duration::days(45),
                total: Some(Decimal::from(100)),
            }],
            ..Snapshots::default()
        };

        let Json(campaigns) =
            prepare_inactive(State(state(snapshots)), Query(InactiveQuery { days_since: None }))
                .await
                .expect("prepare should succeed");

        assert_eq!(campaigns.len(), 1);
        assert_eq!(
            campaigns[0].offer,
            CampaignOffer::Inactivity { days_since_last: 45, discount_pct: 15 }
        );
    }

    #[tokio::test]
    async fn explicit_query_parameters_override_the_defaults() {
        let snapshots = Snapshots {
            customers: vec![customer(1, Some("lapsed@example.com"))],
            reservations: vec![Reservation {
                id: ReservationId(1),
                customer_id: CustomerId(1),
                ts: Utc::now() - Duration::days(45),
                total: Some(Decimal::from(100)),
            }],
            ..Snapshots::default()
        };

        let Json(campaigns) = prepare_inactive(
            State(state(snapshots)),
            Query(InactiveQuery { days_since: Some(60) }),
        )
        .await
        .expect("prepare should succeed");

        assert!(campaigns.is_empty());
    }

    #[tokio::test]
    async fn overview_route_returns_ranked_profiles() {
        let snapshots = Snapshots {
            customers: vec![customer(1, None), customer(2, None)],
            reservations: vec![Reservation {
                id: ReservationId(1),
                customer_id: CustomerId(2),
                ts: Utc::now() - Duration::days(2),
                total: Some(Decimal::from(80)),
            }],
            ..Snapshots::default()
        };

        let Json(profiles) =
            customers_overview(State(state(snapshots)), Query(OverviewQuery { limit: None }))
                .await
                .expect("overview should succeed");

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].customer_id, CustomerId(2));
        assert_eq!(profiles[1].average_ticket, Decimal::ZERO);
    }

    #[tokio::test]
    async fn engine_failures_map_to_service_unavailable() {
        let state = CrmState {
            engine: Arc::new(CrmEngine::new(
                InMemorySnapshotStore::failing(tavolo_core::errors::SnapshotError::Unavailable(
                    "store offline".to_string(),
                )),
                InMemoryMailTransport::new(),
            )),
            defaults: defaults(),
        };

        let (status, Json(body)) = customers_overview(State(state), Query(OverviewQuery { limit: None }))
            .await
            .expect_err("overview should fail");

        assert_eq!(status, axum::http::StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.error.contains("store offline"));
    }

    #[tokio::test]
    async fn test_email_route_reports_delivery_status() {
        let state = state(Snapshots::default());

        let Json(status) = send_test_email(
            State(state),
            Json(TestEmailRequest { address: "ops@example.com".to_string() }),
        )
        .await;

        assert!(status.ok);
        assert!(status.detail.contains("ops@example.com"));
    }
}
