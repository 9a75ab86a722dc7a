//! Application configuration: `config.toml` (path from `CONFIG_PATH`) layered
//! under environment variables, then normalized and validated once at startup.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            worker_threads: None,
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_open_house_tab")]
    pub open_house_tab: String,
    #[serde(default = "default_leads_tab")]
    pub leads_tab: String,
    #[serde(default)]
    pub service_account_file: Option<String>,
    #[serde(default)]
    pub service_account_json: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            open_house_tab: default_open_house_tab(),
            leads_tab: default_leads_tab(),
            service_account_file: None,
            service_account_json: None,
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

/// Where the service-account key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsSource {
    File(PathBuf),
    Json(String),
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8000 }
fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".into(),
        "http://localhost:3001".into(),
        "https://*.vercel.app".into(),
    ]
}
fn default_open_house_tab() -> String { "open_house_picks".into() }
fn default_leads_tab() -> String { "leads".into() }
fn default_api_base() -> String { "https://sheets.googleapis.com".into() }
fn default_request_timeout() -> u64 { 30 }
fn default_log_format() -> String { "compact".into() }

/// Load `CONFIG_PATH` (default `config.toml`) and overlay the process environment.
/// A missing file is not an error: deployments may configure purely through env.
pub fn load_default() -> Result<AppConfig, ConfigError> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let mut cfg = if Path::new(&path).exists() {
        load_from_file(&path)?
    } else {
        debug!(%path, "config file not found, using defaults");
        AppConfig::default()
    };
    cfg.apply_env(|key| std::env::var(key).ok())?;
    Ok(cfg)
}

pub fn load_from_file(path: &str) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_string(), source })?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self, ConfigError> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Overlay environment variables; `lookup` is injected so tests never touch the real env.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = non_empty("SERVER_HOST") {
            self.server.host = host;
        }
        // 托管平台通常注入 PORT，优先于 SERVER_PORT
        for key in ["SERVER_PORT", "PORT"] {
            if let Some(raw) = non_empty(key) {
                self.server.port = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid(format!("{key} must be a port number, got {raw:?}")))?;
            }
        }
        if let Some(raw) = non_empty("TOKIO_WORKER_THREADS") {
            self.server.worker_threads = raw.trim().parse().ok();
        }
        if let Some(raw) = non_empty("CORS_ORIGINS") {
            self.server.cors_origins = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // 表格与凭据
        if let Some(id) = non_empty("GOOGLE_SHEET_ID") {
            self.sheets.spreadsheet_id = id;
        }
        if let Some(tab) = non_empty("OPEN_HOUSE_TAB") {
            self.sheets.open_house_tab = tab;
        }
        if let Some(tab) = non_empty("LEADS_TAB") {
            self.sheets.leads_tab = tab;
        }
        if let Some(file) = non_empty("GOOGLE_SERVICE_ACCOUNT_FILE") {
            self.sheets.service_account_file = Some(file);
        }
        if let Some(json) = non_empty("GOOGLE_SERVICE_ACCOUNT_JSON") {
            self.sheets.service_account_json = Some(json);
        }
        if let Some(base) = non_empty("GOOGLE_SHEETS_API_BASE") {
            self.sheets.api_base = base;
        }

        if let Some(format) = non_empty("LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<(), ConfigError> {
        self.server.normalize()?;
        self.sheets.normalize();
        self.sheets.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("server.port must be in 1..=65535".into()));
        }
        if self.worker_threads == Some(0) {
            self.worker_threads = None;
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl SheetsConfig {
    fn normalize(&mut self) {
        self.spreadsheet_id = self.spreadsheet_id.trim().to_string();
        if self.open_house_tab.trim().is_empty() {
            self.open_house_tab = default_open_house_tab();
        }
        if self.leads_tab.trim().is_empty() {
            self.leads_tab = default_leads_tab();
        }
        self.api_base = self.api_base.trim_end_matches('/').to_string();
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spreadsheet_id.is_empty() {
            return Err(ConfigError::Missing("GOOGLE_SHEET_ID (sheets.spreadsheet_id)"));
        }
        self.credentials()?;
        Ok(())
    }

    /// The key file wins over inline JSON, matching how operators usually override.
    pub fn credentials(&self) -> Result<CredentialsSource, ConfigError> {
        if let Some(file) = self.service_account_file.as_deref().filter(|f| !f.trim().is_empty()) {
            return Ok(CredentialsSource::File(PathBuf::from(file)));
        }
        match self.service_account_json.as_deref().filter(|j| !j.trim().is_empty()) {
            Some(json) => {
                serde_json::from_str::<serde_json::Value>(json).map_err(|e| {
                    ConfigError::Invalid(format!("invalid JSON in GOOGLE_SERVICE_ACCOUNT_JSON: {e}"))
                })?;
                Ok(CredentialsSource::Json(json.to_string()))
            }
            None => Err(ConfigError::Missing(
                "GOOGLE_SERVICE_ACCOUNT_FILE or GOOGLE_SERVICE_ACCOUNT_JSON",
            )),
        }
    }

    /// A1 range covering the listing columns `id..price`.
    pub fn open_house_range(&self) -> String {
        format!("{}!A:G", self.open_house_tab)
    }

    /// A1 range covering the eight lead columns.
    pub fn leads_range(&self) -> String {
        format!("{}!A:H", self.leads_tab)
    }
}
