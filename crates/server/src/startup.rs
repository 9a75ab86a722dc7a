use std::future::Future;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use configs::AppConfig;
use service::open_house::{OpenHouseService, SheetRanges};
use service::sheets::SheetsStore;
use service::storage::TabularStore;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::metrics;
use crate::routes::{self, AppState};

/// CORS from configured origins. `*` is fully permissive; an entry with a
/// `*` inside (`https://*.vercel.app`) matches on prefix and suffix.
pub fn build_cors(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::very_permissive();
    }
    let exact: Vec<HeaderValue> = origins
        .iter()
        .filter(|o| !o.contains('*'))
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    let patterns: Vec<(String, String)> = origins
        .iter()
        .filter_map(|o| o.split_once('*'))
        .map(|(prefix, suffix)| (prefix.to_string(), suffix.to_string()))
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            if exact.iter().any(|o| o == origin) {
                return true;
            }
            let Ok(origin) = origin.to_str() else { return false };
            patterns.iter().any(|(prefix, suffix)| {
                origin.len() > prefix.len() + suffix.len()
                    && origin.starts_with(prefix.as_str())
                    && origin.ends_with(suffix.as_str())
            })
        }))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_service(store: Arc<dyn TabularStore>, cfg: &AppConfig) -> Arc<OpenHouseService<dyn TabularStore>> {
    Arc::new(OpenHouseService::new(store, SheetRanges::from(&cfg.sheets)))
}

/// Assemble the router around an already-constructed store.
pub fn build_app(store: Arc<dyn TabularStore>, cfg: &AppConfig) -> Router {
    router_for(build_service(store, cfg), cfg)
}

fn router_for(service: Arc<OpenHouseService<dyn TabularStore>>, cfg: &AppConfig) -> Router {
    metrics::register_all();
    routes::build_router(AppState::new(service), build_cors(&cfg.server.cors_origins))
}

/// Log whether the spreadsheet answers. An unreachable store does not stop startup.
pub async fn report_store_reachability(service: &OpenHouseService<dyn TabularStore>, spreadsheet_id: &str) -> bool {
    match service.check_store().await {
        Ok(()) => {
            info!(event = "store_reachable", %spreadsheet_id, "spreadsheet reachable");
            true
        }
        Err(e) => {
            warn!(event = "store_unreachable", error = %e, "spreadsheet not reachable yet; requests will fail until it is");
            false
        }
    }
}

/// Connect to the configured spreadsheet, then serve until `shutdown` resolves.
pub async fn run_until<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = SheetsStore::from_config(&cfg.sheets)
        .await
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let service = build_service(Arc::new(store), &cfg);
    report_store_reachability(&service, &cfg.sheets.spreadsheet_id).await;

    let app = router_for(service, &cfg);

    let addr = cfg.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "starting server crate");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

/// Serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    run_until(cfg, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    async fn preflight(origins: &[&str], origin: &str) -> Option<String> {
        let origins: Vec<String> = origins.iter().map(|o| o.to_string()).collect();
        let app = Router::new().route("/", get(|| async { "ok" })).layer(build_cors(&origins));
        let req = Request::builder()
            .uri("/")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn exact_origins_are_allowed() {
        let got = preflight(&["http://localhost:3000"], "http://localhost:3000").await;
        assert_eq!(got.as_deref(), Some("http://localhost:3000"));
        assert_eq!(preflight(&["http://localhost:3000"], "http://evil.test").await, None);
    }

    #[tokio::test]
    async fn wildcard_origins_match_subdomains() {
        let origins = ["https://*.vercel.app"];
        assert!(preflight(&origins, "https://picks-git-main.vercel.app").await.is_some());
        assert_eq!(preflight(&origins, "https://vercel.app.evil.test").await, None);
    }

    #[tokio::test]
    async fn startup_check_goes_through_the_service() {
        let store = Arc::new(service::storage::memory::InMemoryStore::new());
        let service = build_service(store.clone(), &AppConfig::default());
        assert!(report_store_reachability(&service, "sheet").await);

        store.fail_with(Some("offline"));
        assert!(!report_store_reachability(&service, "sheet").await);
    }

    #[tokio::test]
    async fn star_is_permissive() {
        assert!(preflight(&["*"], "http://anything.test").await.is_some());
    }
}
