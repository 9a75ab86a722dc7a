use serde::{Deserialize, Serialize};

/// Static service identity returned by the root health check.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Health {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl Health {
    pub fn healthy(service: &str, version: &str) -> Self {
        Self { status: "healthy".into(), service: service.into(), version: version.into() }
    }
}

/// `{success, message}` envelope used for acknowledgements and the 404 fallback.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub success: bool,
    pub message: String,
}

impl StatusMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}
