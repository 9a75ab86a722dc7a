//! Service-account OAuth for the Sheets API.
//!
//! A signed RS256 assertion is exchanged at the key's `token_uri` for a
//! short-lived bearer token, which is cached until shortly before expiry.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use configs::CredentialsSource;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::errors::StoreError;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// Fields of a Google service-account key file this client needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json)
            .map_err(|e| StoreError::Credentials(format!("invalid service account JSON: {e}")))
    }

    pub async fn from_file(path: &Path) -> Result<Self, StoreError> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            StoreError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub async fn load(source: &CredentialsSource) -> Result<Self, StoreError> {
        match source {
            CredentialsSource::File(path) => Self::from_file(path).await,
            CredentialsSource::Json(json) => Self::from_json(json),
        }
    }
}

/// Anything able to hand out a bearer token for the Sheets API.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, StoreError>;
}

/// Fixed token, for emulators and tests.
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, StoreError> {
        Ok(self.0.clone())
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Token source backed by a service-account key.
pub struct ServiceAccountTokens {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    scope: String,
    http: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
}

impl ServiceAccountTokens {
    /// Fails fast when the private key is not a usable RSA PEM.
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Result<Self, StoreError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| StoreError::Credentials(format!("invalid private key: {e}")))?;
        Ok(Self {
            key,
            signing_key,
            scope: SPREADSHEETS_SCOPE.to_string(),
            http,
            cached: RwLock::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, StoreError> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        encode(&header, &claims, &self.signing_key)
            .map_err(|e| StoreError::Credentials(format!("cannot sign assertion: {e}")))
    }

    #[instrument(skip(self), fields(client_email = %self.key.client_email))]
    async fn fetch(&self) -> Result<CachedToken, StoreError> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;
        let resp = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Credentials(format!(
                "token exchange failed ({}): {}",
                status.as_u16(),
                body.trim()
            )));
        }
        let token: TokenResponse = resp.json().await?;
        debug!(expires_in = token.expires_in, "access token refreshed");
        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> Result<String, StoreError> {
        let fresh_until = |c: &CachedToken| c.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > Utc::now();

        if let Some(cached) = self.cached.read().await.as_ref().filter(|c| fresh_until(*c)) {
            return Ok(cached.token.clone());
        }

        let mut slot = self.cached.write().await;
        // Another request may have refreshed while we waited for the write lock.
        if let Some(cached) = slot.as_ref().filter(|c| fresh_until(*c)) {
            return Ok(cached.token.clone());
        }
        let fetched = self.fetch().await?;
        let token = fetched.token.clone();
        *slot = Some(fetched);
        Ok(token)
    }
}
