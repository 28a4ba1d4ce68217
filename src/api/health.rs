use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use crate::state::AppState;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let (healthy, database) = match &state.database {
        Some(db) => match db.ping().await {
            Ok(()) => (true, "connected"),
            Err(e) => {
                log::warn!("⚠️  Health check: database ping failed: {}", e);
                (false, "unreachable")
            }
        },
        None => (true, "in-memory"),
    };

    let body = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        service: "library-catalog".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    };

    if healthy {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
