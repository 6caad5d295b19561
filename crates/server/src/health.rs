//! Readiness endpoint served on a dedicated port.
//!
//! Reports per-component checks: the database must answer a query and the
//! baseline schema (product, quote, notification) must be present, so a
//! server pointed at an unmigrated file reports degraded instead of failing
//! on the first quote save.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use devisio_db::DbPool;
use serde::Serialize;
use tracing::{error, info};

const BASELINE_TABLES: &[&str] = &["product", "quote", "notification"];

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentCheck {
    pub component: &'static str,
    pub ready: bool,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub checks: Vec<ComponentCheck>,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

pub async fn spawn(bind_address: &str, port: u16, db_pool: DbPool) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(event_name = "system.health.start", bind_address = %address, "health endpoint started");

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(db_pool)).await {
            error!(
                event_name = "system.health.error",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let checks = vec![connectivity_check(&state.db_pool).await, schema_check(&state.db_pool).await];
    let ready = checks.iter().all(|check| check.ready);

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        checks,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn connectivity_check(pool: &DbPool) -> ComponentCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => ComponentCheck {
            component: "database",
            ready: true,
            detail: "database query succeeded".to_string(),
        },
        Err(error) => ComponentCheck {
            component: "database",
            ready: false,
            detail: format!("database query failed: {error}"),
        },
    }
}

async fn schema_check(pool: &DbPool) -> ComponentCheck {
    let placeholders = vec!["?"; BASELINE_TABLES.len()].join(", ");
    let query = format!(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ({placeholders})"
    );
    let mut statement = sqlx::query_scalar::<_, i64>(&query);
    for table in BASELINE_TABLES {
        statement = statement.bind(*table);
    }

    match statement.fetch_one(pool).await {
        Ok(count) if count == BASELINE_TABLES.len() as i64 => ComponentCheck {
            component: "schema",
            ready: true,
            detail: "baseline schema present".to_string(),
        },
        Ok(count) => ComponentCheck {
            component: "schema",
            ready: false,
            detail: format!(
                "{count}/{} baseline tables found, run migrations",
                BASELINE_TABLES.len()
            ),
        },
        Err(error) => ComponentCheck {
            component: "schema",
            ready: false,
            detail: format!("schema inspection failed: {error}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use devisio_db::{connect_with_settings, migrations};

    use crate::health::{health, HealthState};

    fn check<'a>(
        payload: &'a super::HealthResponse,
        component: &str,
    ) -> &'a super::ComponentCheck {
        payload
            .checks
            .iter()
            .find(|check| check.component == component)
            .unwrap_or_else(|| panic!("missing `{component}` check"))
    }

    #[tokio::test]
    async fn health_is_ready_once_migrated() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5)
            .await
            .expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let (status, Json(payload)) = health(State(HealthState { db_pool: pool.clone() })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert!(check(&payload, "database").ready);
        assert!(check(&payload, "schema").ready);

        pool.close().await;
    }

    #[tokio::test]
    async fn unmigrated_database_degrades_the_schema_check_only() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5)
            .await
            .expect("pool should connect");

        let (status, Json(payload)) = health(State(HealthState { db_pool: pool.clone() })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert!(check(&payload, "database").ready, "connectivity itself is fine");
        assert!(!check(&payload, "schema").ready);
        assert!(check(&payload, "schema").detail.contains("run migrations"));

        pool.close().await;
    }

    #[tokio::test]
    async fn unreachable_database_degrades_every_check() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5)
            .await
            .expect("pool should connect");
        pool.close().await;

        let (status, Json(payload)) = health(State(HealthState { db_pool: pool })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert!(payload.checks.iter().all(|check| !check.ready));
    }
}
