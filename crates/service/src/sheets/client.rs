use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use configs::SheetsConfig;
use reqwest::{Response, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::auth::{AccessTokenSource, ServiceAccountKey, ServiceAccountTokens};
use crate::errors::StoreError;
use crate::storage::TabularStore;

/// [`TabularStore`] over the Google Sheets v4 `values` API.
pub struct SheetsStore {
    http: reqwest::Client,
    api_base: Url,
    spreadsheet_id: String,
    tokens: Arc<dyn AccessTokenSource>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

impl SheetsStore {
    pub fn new(
        http: reqwest::Client,
        api_base: &str,
        spreadsheet_id: impl Into<String>,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Result<Self, StoreError> {
        let api_base = Url::parse(api_base)
            .map_err(|e| StoreError::Credentials(format!("invalid Sheets API base {api_base:?}: {e}")))?;
        Ok(Self { http, api_base, spreadsheet_id: spreadsheet_id.into(), tokens })
    }

    /// Build the store from validated configuration, loading and checking the key.
    pub async fn from_config(cfg: &SheetsConfig) -> Result<Self, StoreError> {
        let source = cfg
            .credentials()
            .map_err(|e| StoreError::Credentials(e.to_string()))?;
        let key = ServiceAccountKey::load(&source).await?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        let tokens = ServiceAccountTokens::new(key, http.clone())?;
        debug!(client_email = tokens.client_email(), "service account loaded");
        Self::new(http, &cfg.api_base, cfg.spreadsheet_id.clone(), Arc::new(tokens))
    }

    fn url(&self, tail: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Credentials(format!("Sheets API base {} cannot be a base", self.api_base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str()])
            .extend(tail);
        Ok(url)
    }

    async fn checked(resp: Response) -> Result<Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        Err(StoreError::Api { status: status.as_u16(), message })
    }
}

/// Sheets may return numbers or booleans when a cell is not formatted as text.
fn cell_to_string(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TabularStore for SheetsStore {
    #[instrument(skip(self))]
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let token = self.tokens.access_token().await?;
        let url = self.url(&["values", range])?;
        let resp = self.http.get(url).bearer_auth(token).send().await?;
        let body: ValueRange = Self::checked(resp).await?.json().await?;
        let rows: Vec<Vec<String>> = body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();
        debug!(rows = rows.len(), "range read");
        Ok(rows)
    }

    #[instrument(skip(self, row), fields(cells = row.len()))]
    async fn append_row(&self, range: &str, row: Vec<String>) -> Result<(), StoreError> {
        let token = self.tokens.access_token().await?;
        let target = format!("{range}:append");
        let url = self.url(&["values", target.as_str()])?;
        let resp = self
            .http
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .bearer_auth(token)
            .json(&json!({ "values": [row] }))
            .send()
            .await?;
        Self::checked(resp).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let token = self.tokens.access_token().await?;
        let url = self.url(&[])?;
        let resp = self
            .http
            .get(url)
            .query(&[("fields", "spreadsheetId")])
            .bearer_auth(token)
            .send()
            .await?;
        Self::checked(resp).await?;
        Ok(())
    }
}
