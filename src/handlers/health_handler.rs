use std::sync::Arc;

use actix_web::{get, web, HttpResponse};
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mongodb: Option<&'static str>,
}

impl HealthStatus {
    fn new(status: &'static str) -> Self {
        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
            mongodb: None,
        }
    }
}

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthStatus::new("healthy"))
}

/// Ready only while the database answers a ping.
#[get("/health/ready")]
pub async fn health_check_ready(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let db_ok = match &state.db {
        Some(db) => db.health_check().await.is_ok(),
        None => false,
    };

    if db_ok {
        HttpResponse::Ok().json(HealthStatus {
            mongodb: Some("ok"),
            ..HealthStatus::new("ready")
        })
    } else {
        log::warn!("Readiness probe failed: database unreachable");
        HttpResponse::ServiceUnavailable().json(HealthStatus {
            mongodb: Some("error"),
            ..HealthStatus::new("not_ready")
        })
    }
}

#[get("/health/live")]
pub async fn health_check_live() -> HttpResponse {
    HttpResponse::Ok().json(HealthStatus::new("alive"))
}
