use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tavolo_core::dispatch::MailTransport;
use tavolo_core::engine::{CrmEngine, HealthStatus};
use tavolo_core::snapshot::SnapshotStore;

pub struct HealthState<S, M> {
    pub engine: Arc<CrmEngine<S, M>>,
}

impl<S, M> Clone for HealthState<S, M> {
    fn clone(&self) -> Self {
        Self { engine: Arc::clone(&self.engine) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthStatus,
    pub database: HealthStatus,
    pub smtp: HealthStatus,
    pub checked_at: String,
}

pub fn router<S, M>(engine: Arc<CrmEngine<S, M>>) -> Router
where
    S: SnapshotStore + 'static,
    M: MailTransport + 'static,
{
    Router::new().route("/health", get(health::<S, M>)).with_state(HealthState { engine })
}

/// Aggregate readiness: the data source is load-bearing for every engine
/// operation, so an unreachable store degrades the whole service. The smtp
/// probe is reported alongside but individual sends already tolerate
/// transport failure.
pub async fn health<S, M>(
    State(state): State<HealthState<S, M>>,
) -> (StatusCode, Json<HealthResponse>)
where
    S: SnapshotStore,
    M: MailTransport,
{
    let database = state.engine.data_source_health_check().await;
    let smtp = state.engine.mail_transport_health_check().await;
    let ready = database.ok;

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthStatus { ok: true, detail: "tavolo-server runtime initialized".to_string() },
        database,
        smtp,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use tavolo_core::dispatch::InMemoryMailTransport;
    use tavolo_core::engine::CrmEngine;
    use tavolo_core::errors::SnapshotError;
    use tavolo_core::snapshot::{InMemorySnapshotStore, Snapshots};

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_is_ready_when_the_data_source_is_reachable() {
        let engine = Arc::new(CrmEngine::new(
            InMemorySnapshotStore::new(Snapshots::default()),
            InMemoryMailTransport::new(),
        ));

        let (status, Json(payload)) = health(State(HealthState { engine })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert!(payload.database.ok);
        assert!(payload.smtp.ok);
        assert!(payload.service.ok);
    }

    #[tokio::test]
    async fn health_degrades_when_the_data_source_is_unreachable() {
        let engine = Arc::new(CrmEngine::new(
            InMemorySnapshotStore::failing(SnapshotError::Unavailable("store offline".to_string())),
            InMemoryMailTransport::new(),
        ));

        let (status, Json(payload)) = health(State(HealthState { engine })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert!(!payload.database.ok);
        assert!(payload.database.detail.contains("store offline"));
    }
}
