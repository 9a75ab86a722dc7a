use std::sync::Arc;

use chrono::{DateTime, Utc};
use configs::SheetsConfig;
use tracing::{error, info, instrument, warn};

use super::filter::ListingFilter;
use crate::errors::ServiceError;
use crate::records::{listings_from_table, Lead, LeadInput, Listing};
use crate::storage::TabularStore;

/// A1 ranges the service reads listings from and appends leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRanges {
    pub open_houses: String,
    pub leads: String,
}

impl From<&SheetsConfig> for SheetRanges {
    fn from(cfg: &SheetsConfig) -> Self {
        Self { open_houses: cfg.open_house_range(), leads: cfg.leads_range() }
    }
}

impl Default for SheetRanges {
    fn default() -> Self {
        Self::from(&SheetsConfig::default())
    }
}

/// Application service over an injected [`TabularStore`].
///
/// Holds no per-request state: listings are read fresh on every call and
/// each lead is a single append.
pub struct OpenHouseService<S: TabularStore + ?Sized> {
    store: Arc<S>,
    ranges: SheetRanges,
    clock: fn() -> DateTime<Utc>,
}

impl<S: TabularStore + ?Sized> OpenHouseService<S> {
    pub fn new(store: Arc<S>, ranges: SheetRanges) -> Self {
        Self { store, ranges, clock: Utc::now }
    }

    /// Replace the submission clock, for deterministic timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    #[instrument(skip(self), fields(range = %self.ranges.open_houses))]
    pub async fn list_open_houses(&self, filter: &ListingFilter) -> Result<Vec<Listing>, ServiceError> {
        let table = self.store.read_range(&self.ranges.open_houses).await.map_err(|e| {
            error!(event = "open_houses_read_failed", error = %e, "reading listings failed");
            e
        })?;
        let listings = filter.apply(listings_from_table(&table));
        info!(event = "open_houses_listed", rows = table.len().saturating_sub(1), returned = listings.len());
        Ok(listings)
    }

    /// Validate, timestamp and append one lead. Nothing is written when validation fails.
    #[instrument(skip(self, input), fields(source = ?input.source, listing_id = ?input.listing_id))]
    pub async fn submit_lead(&self, input: LeadInput) -> Result<Lead, ServiceError> {
        if let Err(e) = input.validate() {
            warn!(event = "lead_rejected", error = %e, "lead failed validation");
            return Err(e);
        }
        let lead = input.into_lead((self.clock)());
        self.store.append_row(&self.ranges.leads, lead.to_row()).await.map_err(|e| {
            error!(event = "lead_append_failed", error = %e, "appending lead failed");
            e
        })?;
        info!(event = "lead_submitted", created_at = %lead.created_at_iso(), source = %lead.source, "lead appended");
        Ok(lead)
    }

    /// Reachability probe for startup diagnostics.
    pub async fn check_store(&self) -> Result<(), ServiceError> {
        Ok(self.store.ping().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryStore;
    use chrono::TimeZone;

    const HEADERS: [&str; 7] = ["id", "address", "area", "open_house_time", "redfin_url", "notes", "price"];

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap()
    }

    fn seeded() -> Arc<InMemoryStore> {
        let ranges = SheetRanges::default();
        Arc::new(InMemoryStore::new().with_table(
            &ranges.open_houses,
            vec![
                HEADERS.to_vec(),
                vec!["1", "123 Main St", "Eastside", "Sat 1-4 PM", "u1", "n1", "$950,000"],
                vec!["2", "456 Lake View Dr", "North Seattle", "Sun 12-3 PM", "u2", "n2", ""],
                vec!["", "", "", ""],
                vec!["3", "789 Pine St", "Eastside", "Sun 2-5 PM"],
            ],
        ))
    }

    fn lead(email: &str) -> LeadInput {
        LeadInput {
            name: "Jane".into(),
            email: email.into(),
            phone: "555".into(),
            message: "hello".into(),
            source: None,
            listing_id: Some(2),
            listing_address: None,
        }
    }

    #[tokio::test]
    async fn lists_and_filters_in_row_order() -> Result<(), anyhow::Error> {
        let svc = OpenHouseService::new(seeded(), SheetRanges::default());

        let all = svc.list_open_houses(&ListingFilter::default()).await?;
        assert_eq!(all.iter().map(|l| l.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(all[0].price, Some(950_000));
        assert_eq!(all[1].price, None);

        let east = svc.list_open_houses(&ListingFilter::new(Some("Eastside"), Some("sun"))).await?;
        assert_eq!(east.iter().map(|l| l.id).collect::<Vec<_>>(), vec![3]);
        Ok(())
    }

    #[tokio::test]
    async fn storage_failure_surfaces_as_storage_error() {
        let store = seeded();
        store.fail_with(Some("sheet unavailable"));
        let svc = OpenHouseService::new(store, SheetRanges::default());
        let err = svc.list_open_houses(&ListingFilter::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));
        assert_eq!(err.to_string(), "sheet unavailable");
    }

    #[tokio::test]
    async fn invalid_email_never_touches_the_store() {
        let store = seeded();
        let svc = OpenHouseService::new(Arc::clone(&store), SheetRanges::default());
        let err = svc.submit_lead(lead("not-an-email")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { field: "email", .. }));
        assert_eq!(store.append_count(), 0);
    }

    #[tokio::test]
    async fn valid_lead_appends_one_eight_cell_row() -> Result<(), anyhow::Error> {
        let store = seeded();
        let svc = OpenHouseService::new(Arc::clone(&store), SheetRanges::default()).with_clock(fixed_now);
        svc.submit_lead(lead("jane@example.com")).await?;

        assert_eq!(store.append_count(), 1);
        let rows = store.rows(&SheetRanges::default().leads);
        assert_eq!(
            rows,
            vec![vec![
                "2026-10-17T09:00:00.000Z",
                "Jane",
                "jane@example.com",
                "555",
                "hello",
                "contact",
                "2",
                "",
            ]]
        );
        Ok(())
    }

    #[tokio::test]
    async fn resubmission_appends_a_duplicate() -> Result<(), anyhow::Error> {
        let store = Arc::new(InMemoryStore::new());
        let svc = OpenHouseService::new(Arc::clone(&store), SheetRanges::default());
        svc.submit_lead(lead("jane@example.com")).await?;
        svc.submit_lead(lead("jane@example.com")).await?;
        assert_eq!(store.append_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn works_through_a_trait_object() -> Result<(), anyhow::Error> {
        let store: Arc<dyn TabularStore> = seeded();
        let svc = OpenHouseService::new(store, SheetRanges::default());
        assert_eq!(svc.list_open_houses(&ListingFilter::default()).await?.len(), 3);
        svc.check_store().await?;
        Ok(())
    }
}
