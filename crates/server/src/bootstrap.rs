use std::sync::Arc;

use tavolo_core::config::{AppConfig, ConfigError, LoadOptions};
use tavolo_core::engine::CrmEngine;
use tavolo_core::errors::MailError;
use tavolo_db::{connect, migrations, DbPool, SqlSnapshotStore};
use tavolo_mail::SmtpMailer;
use thiserror::Error;
use tracing::info;

pub type AppEngine = CrmEngine<SqlSnapshotStore, SmtpMailer>;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub engine: Arc<AppEngine>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("mail transport setup failed: {0}")]
    Mail(#[from] MailError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let mailer = SmtpMailer::from_config(&config.smtp)?;
    let engine = Arc::new(CrmEngine::new(SqlSnapshotStore::new(db_pool.clone()), mailer));
    info!(
        event_name = "system.bootstrap.engine_ready",
        correlation_id = "bootstrap",
        "campaign engine initialized"
    );

    Ok(Application { config, db_pool, engine })
}

#[cfg(test)]
mod tests {
    use tavolo_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    fn overrides(database_url: &str, with_smtp: bool) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                smtp_host: with_smtp.then(|| "smtp.example.com".to_string()),
                smtp_username: with_smtp.then(|| "campaigns@example.com".to_string()),
                smtp_password: with_smtp.then(|| "hunter2".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_smtp_configuration() {
        let result = bootstrap(overrides("sqlite::memory:", false)).await;

        let message = result.err().expect("bootstrap should fail").to_string();
        assert!(message.contains("smtp.host"));
    }

    #[tokio::test]
    async fn bootstrap_connects_migrates_and_builds_the_engine() {
        // Shared cache keeps every pooled connection on the same in-memory
        // database.
        let app = bootstrap(overrides("sqlite::memory:?cache=shared", true))
            .await
            .expect("bootstrap should succeed");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('customers', 'reservations', 'menu_items')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("baseline relations should exist after bootstrap");
        assert_eq!(table_count, 3);

        let health = app.engine.data_source_health_check().await;
        assert!(health.ok, "engine should reach the bootstrapped database");

        app.db_pool.close().await;
    }
}
