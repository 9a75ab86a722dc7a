use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};
use service::errors::ServiceError;

// Prometheus metrics (default registry)
pub static LISTING_REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "home_picks_listing_requests_total",
        "Total open-house listing requests served"
    )
    .expect("register listing_requests_total")
});

pub static LISTINGS_RETURNED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "home_picks_listings_returned_total",
        "Total listings returned across all requests"
    )
    .expect("register listings_returned_total")
});

pub static LEADS_SUBMITTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "home_picks_leads_submitted_total",
        "Total leads appended to the store"
    )
    .expect("register leads_submitted_total")
});

pub static LEADS_REJECTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "home_picks_leads_rejected_total",
        "Total lead submissions rejected by validation"
    )
    .expect("register leads_rejected_total")
});

pub static STORAGE_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "home_picks_storage_errors_total",
        "Total failed round trips to the tabular store"
    )
    .expect("register storage_errors_total")
});

pub fn record_failure(e: &ServiceError) {
    match e {
        ServiceError::Validation { .. } => LEADS_REJECTED_TOTAL.inc(),
        ServiceError::Storage(_) => STORAGE_ERRORS_TOTAL.inc(),
    }
}

/// Touch every counter so they show up in the exposition before first use.
pub fn register_all() {
    Lazy::force(&LISTING_REQUESTS_TOTAL);
    Lazy::force(&LISTINGS_RETURNED_TOTAL);
    Lazy::force(&LEADS_SUBMITTED_TOTAL);
    Lazy::force(&LEADS_REJECTED_TOTAL);
    Lazy::force(&STORAGE_ERRORS_TOTAL);
}

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_land_in_the_right_counter() {
        let before = LEADS_REJECTED_TOTAL.get();
        record_failure(&ServiceError::validation("email", "bad"));
        assert!(LEADS_REJECTED_TOTAL.get() > before);
    }

    #[test]
    fn exposition_lists_registered_counters() {
        register_all();
        let (status, body) = encode_metrics();
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("home_picks_leads_submitted_total"));
    }
}
