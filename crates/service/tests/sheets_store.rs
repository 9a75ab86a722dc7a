use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use configs::SheetsConfig;
use serde_json::{json, Value};
use service::errors::StoreError;
use service::sheets::SheetsStore;
use service::storage::TabularStore;
use tokio::net::TcpListener;

const TEST_KEY: &str = include_str!("fixtures/test_service_account_key.pem");

#[derive(Clone, Default)]
struct MockSheets {
    token_requests: Arc<AtomicUsize>,
    appended: Arc<Mutex<Vec<(String, Value, std::collections::HashMap<String, String>)>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "Bearer tok-1")
        .unwrap_or(false)
}

fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}})),
    )
}

async fn token(
    State(mock): State<MockSheets>,
    Form(form): Form<std::collections::HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    mock.token_requests.fetch_add(1, Ordering::SeqCst);
    let grant_ok = form.get("grant_type").map(String::as_str) == Some("urn:ietf:params:oauth:grant-type:jwt-bearer");
    // A compact JWS has exactly three dot-separated parts.
    let assertion_ok = form.get("assertion").map(|a| a.split('.').count() == 3).unwrap_or(false);
    if !(grant_ok && assertion_ok) {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"})));
    }
    (StatusCode::OK, Json(json!({"access_token": "tok-1", "expires_in": 3600, "token_type": "Bearer"})))
}

async fn read_values(
    Path((id, range)): Path<(String, String)>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": {"message": "bad token"}})));
    }
    if id != "sheet-1" {
        return not_found();
    }
    match range.as_str() {
        "open_house_picks!A:G" => (
            StatusCode::OK,
            Json(json!({
                "range": "open_house_picks!A1:G3",
                "majorDimension": "ROWS",
                "values": [
                    ["id", "address", "area", "open_house_time", "redfin_url", "notes", "price"],
                    ["1", "123 Main St", "Eastside", "Sat 1-4 PM", "https://r/1", "", "$950,000"],
                    [2, "456 Lake View Dr", "North Seattle"]
                ]
            })),
        ),
        _ => (StatusCode::OK, Json(json!({"range": range.clone()}))),
    }
}

async fn append_values(
    State(mock): State<MockSheets>,
    Path((_id, range)): Path<(String, String)>,
    Query(query): Query<std::collections::HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": {"message": "bad token"}})));
    }
    mock.appended.lock().unwrap().push((range, body, query));
    (StatusCode::OK, Json(json!({"updates": {"updatedRows": 1}})))
}

async fn spreadsheet(Path(id): Path<String>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) || id != "sheet-1" {
        return not_found();
    }
    (StatusCode::OK, Json(json!({"spreadsheetId": id})))
}

async fn start_mock() -> anyhow::Result<(String, MockSheets)> {
    let mock = MockSheets::default();
    let app = Router::new()
        .route("/token", post(token))
        .route("/v4/spreadsheets/:id", get(spreadsheet))
        .route("/v4/spreadsheets/:id/values/:range", get(read_values).post(append_values))
        .with_state(mock.clone());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("mock sheets error: {}", e);
        }
    });
    Ok((format!("http://{}", addr), mock))
}

fn config(base_url: &str, spreadsheet_id: &str) -> SheetsConfig {
    let key = json!({
        "type": "service_account",
        "client_email": "picks@test-project.iam.gserviceaccount.com",
        "private_key_id": "kid-1",
        "private_key": TEST_KEY,
        "token_uri": format!("{}/token", base_url),
    });
    SheetsConfig {
        spreadsheet_id: spreadsheet_id.into(),
        service_account_json: Some(key.to_string()),
        api_base: base_url.into(),
        ..SheetsConfig::default()
    }
}

#[tokio::test]
async fn reads_range_as_strings_and_reuses_token() -> anyhow::Result<()> {
    let (base, mock) = start_mock().await?;
    let cfg = config(&base, "sheet-1");
    let store = SheetsStore::from_config(&cfg).await?;

    let rows = store.read_range(&cfg.open_house_range()).await?;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1][6], "$950,000");
    assert_eq!(rows[2], vec!["2", "456 Lake View Dr", "North Seattle"]);

    let empty = store.read_range("other!A:G").await?;
    assert!(empty.is_empty());

    store.ping().await?;
    assert_eq!(mock.token_requests.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn appends_one_raw_row() -> anyhow::Result<()> {
    let (base, mock) = start_mock().await?;
    let cfg = config(&base, "sheet-1");
    let store = SheetsStore::from_config(&cfg).await?;

    let row: Vec<String> = (0..8).map(|i| format!("c{i}")).collect();
    store.append_row(&cfg.leads_range(), row.clone()).await?;

    let appended = mock.appended.lock().unwrap().clone();
    assert_eq!(appended.len(), 1);
    let (range, body, query) = &appended[0];
    assert_eq!(range, "leads!A:H:append");
    assert_eq!(body, &json!({"values": [row]}));
    assert_eq!(query.get("valueInputOption").map(String::as_str), Some("RAW"));
    assert_eq!(query.get("insertDataOption").map(String::as_str), Some("INSERT_ROWS"));
    Ok(())
}

#[tokio::test]
async fn api_errors_carry_status_and_message() -> anyhow::Result<()> {
    let (base, _mock) = start_mock().await?;
    let cfg = config(&base, "no-such-sheet");
    let store = SheetsStore::from_config(&cfg).await?;

    let err = store.read_range(&cfg.open_house_range()).await.unwrap_err();
    match &err {
        StoreError::Api { status, message } => {
            assert_eq!(*status, 404);
            assert_eq!(message, "Requested entity was not found.");
        }
        other => panic!("expected api error, got {other:?}"),
    }
    assert!(store.ping().await.is_err());
    Ok(())
}

#[tokio::test]
async fn unreachable_store_is_a_network_error() -> anyhow::Result<()> {
    let (base, _mock) = start_mock().await?;
    let mut cfg = config(&base, "sheet-1");
    cfg.api_base = "http://127.0.0.1:9".into();
    let store = SheetsStore::from_config(&cfg).await?;

    let err = store.read_range(&cfg.open_house_range()).await.unwrap_err();
    assert!(matches!(err, StoreError::Network(_)), "got {err:?}");
    Ok(())
}
