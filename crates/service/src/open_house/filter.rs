use serde::Deserialize;

use crate::records::Listing;

/// Query value that disables a filter.
pub const ALL: &str = "All";

/// Query parameters of `GET /open-houses`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListingFilter {
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub day: Option<String>,
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty() && *v != ALL)
}

impl ListingFilter {
    pub fn new(area: Option<&str>, day: Option<&str>) -> Self {
        Self { area: area.map(str::to_string), day: day.map(str::to_string) }
    }

    /// Build from raw query pairs. A repeated key keeps its last value; unknown keys are ignored.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut filter = Self::default();
        for (key, value) in pairs {
            match key.as_ref() {
                "area" => filter.area = Some(value.into()),
                "day" => filter.day = Some(value.into()),
                _ => {}
            }
        }
        filter
    }

    /// Exact area match and case-insensitive literal substring on the showing time.
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(area) = active(&self.area) {
            if listing.area != area {
                return false;
            }
        }
        if let Some(day) = active(&self.day) {
            if !listing.open_house_time.to_lowercase().contains(&day.to_lowercase()) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, listings: Vec<Listing>) -> Vec<Listing> {
        listings.into_iter().filter(|l| self.matches(l)).collect()
    }
}
