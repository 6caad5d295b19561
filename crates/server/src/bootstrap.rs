use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tracing::{info, warn};

use devisio_core::config::{AppConfig, ConfigError, LoadOptions};
use devisio_core::notify::NotificationSink;
use devisio_db::repositories::{
    NotificationRepository, ProductRepository, QuoteRepository, SqlNotificationRepository,
    SqlProductRepository, SqlQuoteRepository,
};
use devisio_db::{connect_with_settings, migrations, DbPool};
use devisio_extrabat::{ErpSync, ExtrabatClient, NoopErpSync};

use crate::acceptance::AcceptanceService;
use crate::email::{BrevoMailer, Mailer, NoopMailer};
use crate::intro::TemplateIntroGenerator;
use crate::pdf::PdfGenerator;
use crate::portal::PortalState;
use crate::quotes::StaffState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub staff_state: StaffState,
    pub portal_state: PortalState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let quotes: Arc<dyn QuoteRepository> = Arc::new(SqlQuoteRepository::new(db_pool.clone()));
    let products: Arc<dyn ProductRepository> = Arc::new(SqlProductRepository::new(db_pool.clone()));
    let notification_repo = Arc::new(SqlNotificationRepository::new(db_pool.clone()));
    let notifications: Arc<dyn NotificationRepository> = notification_repo.clone();
    let notification_sink: Arc<dyn NotificationSink> = notification_repo;

    let mailer: Arc<dyn Mailer> = if config.email.enabled {
        Arc::new(BrevoMailer::new(&config.email))
    } else {
        info!(event_name = "system.bootstrap.email_disabled", "email dispatch disabled");
        Arc::new(NoopMailer)
    };

    let erp: Arc<dyn ErpSync> = if config.extrabat.enabled {
        Arc::new(ExtrabatClient::new(
            config.extrabat.base_url.clone(),
            config.extrabat.api_key.clone(),
        ))
    } else {
        Arc::new(NoopErpSync)
    };

    let pdf = match PdfGenerator::new("templates/quotes") {
        Ok(generator) => {
            info!(event_name = "system.bootstrap.pdf_ready", "PDF templates loaded");
            Some(Arc::new(generator))
        }
        Err(e) => {
            warn!(error = %e, "filesystem PDF templates unavailable, using embedded fallback");
            Some(Arc::new(PdfGenerator::with_embedded_templates()))
        }
    };

    let acceptance = Arc::new(AcceptanceService::new(
        quotes.clone(),
        products.clone(),
        notification_sink,
        mailer,
        pdf.clone(),
        config.company.clone(),
    ));

    let staff_state = StaffState {
        quotes: quotes.clone(),
        products: products.clone(),
        notifications,
        intro: Arc::new(TemplateIntroGenerator),
        erp,
        payment: config.payment.clone(),
    };

    let portal_state =
        PortalState { quotes, products, acceptance, pdf, payment: config.payment.clone() };

    Ok(Application { config, db_pool, staff_state, portal_state })
}

impl Application {
    pub fn router(&self) -> Router {
        Router::new()
            .merge(crate::quotes::router(self.staff_state.clone()))
            .merge(crate::portal::router(self.portal_state.clone()))
    }
}

#[cfg(test)]
mod tests {
    use devisio_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn memory_options() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_prepares_schema_and_states() {
        let app = bootstrap(memory_options()).await.expect("bootstrap");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('quote', 'product', 'notification')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("baseline tables present after bootstrap");
        assert_eq!(table_count, 3);

        // Router builds without panicking.
        let _router = app.router();

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_database_url() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://localhost/devisio".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("database.url"));
    }
}
