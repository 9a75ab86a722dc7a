use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use common::types::StatusMessage;
use service::open_house::OpenHouseService;
use service::storage::TabularStore;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::metrics;
use crate::openapi::ApiDoc;

pub mod health;
pub mod leads;
pub mod open_houses;

pub use health::health;

/// Shared handler state; the store behind the service is chosen at startup.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OpenHouseService<dyn TabularStore>>,
}

impl AppState {
    pub fn new(service: Arc<OpenHouseService<dyn TabularStore>>) -> Self {
        Self { service }
    }
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(StatusMessage::failure("Endpoint not found")))
}

async fn metrics_handler() -> (StatusCode, String) {
    metrics::encode_metrics()
}

/// Build the full application router: public API, metrics, docs and the 404 fallback.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/", get(health))
        .route("/open-houses", get(open_houses::list))
        .route("/leads", post(leads::create))
        .with_state(state);

    api.route("/metrics", get(metrics_handler))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法、路径与版本，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
