use serde::Serialize;

use devisio_core::config::{AppConfig, LoadOptions};
use devisio_db::connect_with_settings;

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: &'static str,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    status: &'static str,
    checks: Vec<DoctorCheck>,
}

pub fn run(json: bool) -> String {
    let mut checks = Vec::new();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config",
                status: "ok",
                detail: format!(
                    "database={} email={} payment={} extrabat={}",
                    config.database.url,
                    if config.email.enabled { "enabled" } else { "disabled" },
                    if config.payment.enabled { "enabled" } else { "disabled" },
                    if config.extrabat.enabled { "enabled" } else { "disabled" },
                ),
            });
            Some(config)
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config",
                status: "error",
                detail: error.to_string(),
            });
            None
        }
    };

    if let Some(config) = &config {
        let detail = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime.block_on(async {
                match connect_with_settings(
                    &config.database.url,
                    config.database.max_connections,
                    config.database.timeout_secs,
                )
                .await
                {
                    Ok(pool) => {
                        let outcome =
                            sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&pool).await;
                        pool.close().await;
                        match outcome {
                            Ok(_) => Ok("database reachable".to_string()),
                            Err(error) => Err(format!("database query failed: {error}")),
                        }
                    }
                    Err(error) => Err(format!("database connection failed: {error}")),
                }
            }),
            Err(error) => Err(format!("failed to initialize async runtime: {error}")),
        };

        match detail {
            Ok(detail) => {
                checks.push(DoctorCheck { name: "database", status: "ok", detail });
            }
            Err(detail) => {
                checks.push(DoctorCheck { name: "database", status: "error", detail });
            }
        }
    }

    let overall =
        if checks.iter().all(|check| check.status == "ok") { "ok" } else { "error" };
    let report = DoctorReport { status: overall, checks };

    if json {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!("{{\"status\":\"error\",\"detail\":\"serialization failed: {error}\"}}")
        })
    } else {
        let mut lines = vec![format!("doctor: {}", report.status)];
        for check in &report.checks {
            lines.push(format!("  [{}] {}: {}", check.status, check.name, check.detail));
        }
        lines.join("\n")
    }
}
