use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use common::types::StatusMessage;
use service::records::LeadInput;

use super::AppState;
use crate::errors::ApiError;
use crate::metrics;

pub const LEAD_ACK: &str = "Thank you! We will contact you soon.";

/// The acknowledgement is fixed; stored data is never echoed back.
#[utoipa::path(
    post,
    path = "/leads",
    tag = "leads",
    request_body = crate::openapi::LeadRequest,
    responses(
        (status = 200, description = "Lead stored", body = crate::openapi::StatusMessageDoc),
        (status = 422, description = "Invalid field, e.g. malformed email"),
        (status = 500, description = "Store failure", body = crate::openapi::DetailResponse),
    )
)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<LeadInput>, JsonRejection>,
) -> Result<Json<StatusMessage>, ApiError> {
    let Json(input) = payload.map_err(|rejection| {
        metrics::LEADS_REJECTED_TOTAL.inc();
        ApiError::from(rejection)
    })?;
    state.service.submit_lead(input).await.map_err(|e| {
        metrics::record_failure(&e);
        ApiError::from_service(e, "Failed to submit lead")
    })?;
    metrics::LEADS_SUBMITTED_TOTAL.inc();
    Ok(Json(StatusMessage::success(LEAD_ACK)))
}
