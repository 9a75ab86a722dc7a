use axum::Json;
use common::types::Health;

pub const SERVICE_NAME: &str = "Seattle Home Picks API";
pub const API_VERSION: &str = "1.0.0";

#[utoipa::path(get, path = "/", tag = "health", responses((status = 200, description = "Service identity", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health::healthy(SERVICE_NAME, API_VERSION))
}
