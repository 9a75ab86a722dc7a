use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use service::open_house::ListingFilter;
use service::records::Listing;

use super::AppState;
use crate::errors::ApiError;
use crate::metrics;

#[utoipa::path(
    get,
    path = "/open-houses",
    tag = "open-houses",
    params(
        ("area" = Option<String>, Query, description = "Exact area name; `All` disables the filter"),
        ("day" = Option<String>, Query, description = "Case-insensitive substring of the showing time; `All` disables the filter"),
    ),
    responses(
        (status = 200, description = "Listings in sheet row order", body = [crate::openapi::ListingDoc]),
        (status = 500, description = "Store failure", body = crate::openapi::DetailResponse),
    )
)]
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    metrics::LISTING_REQUESTS_TOTAL.inc();
    let Query(pairs) = query?;
    let filter = ListingFilter::from_pairs(pairs);
    let listings = state.service.list_open_houses(&filter).await.map_err(|e| {
        metrics::record_failure(&e);
        ApiError::from_service(e, "Failed to fetch open houses")
    })?;
    metrics::LISTINGS_RETURNED_TOTAL.inc_by(listings.len() as u64);
    Ok(Json(listings))
}
