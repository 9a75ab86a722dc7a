use thiserror::Error;

/// Failures talking to, or interpreting data from, the external tabular store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credentials error: {0}")]
    Credentials(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("Google Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation { field, message: message.into() }
    }
}
