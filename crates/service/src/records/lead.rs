use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::email;
use crate::errors::ServiceError;

pub const DEFAULT_SOURCE: &str = "contact";

/// Column order of the leads tab; [`Lead::to_row`] emits cells in exactly this order.
pub const LEAD_COLUMNS: [&str; 8] = [
    "created_at",
    "name",
    "email",
    "phone",
    "message",
    "source",
    "listing_id",
    "listing_address",
];

/// Body of `POST /leads`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub listing_id: Option<i64>,
    #[serde(default)]
    pub listing_address: Option<String>,
}

impl LeadInput {
    /// Reject anything that must not reach the store.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if let Some(problem) = email::email_problem(email::bare_address(&self.email)) {
            return Err(ServiceError::validation(
                "email",
                format!("value is not a valid email address: {problem}"),
            ));
        }
        Ok(())
    }

    /// Stamp the submission time and keep only the bare email address;
    /// `listing_id` stays a weak reference.
    pub fn into_lead(self, created_at: DateTime<Utc>) -> Lead {
        Lead {
            created_at,
            name: self.name,
            email: email::bare_address(&self.email).to_string(),
            phone: self.phone,
            message: self.message,
            source: self.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            listing_id: self.listing_id,
            listing_address: self.listing_address,
        }
    }
}

/// A validated, timestamped lead ready to be appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lead {
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub source: String,
    pub listing_id: Option<i64>,
    pub listing_address: Option<String>,
}

impl Lead {
    pub fn created_at_iso(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Project onto the leads tab, one cell per [`LEAD_COLUMNS`] entry.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.created_at_iso(),
            self.name.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.message.clone(),
            self.source.clone(),
            self.listing_id.map(|id| id.to_string()).unwrap_or_default(),
            self.listing_address.clone().unwrap_or_default(),
        ]
    }
}
