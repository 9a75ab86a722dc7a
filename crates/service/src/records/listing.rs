use serde::{Deserialize, Serialize};
use tracing::debug;

/// One open-house pick as exposed by `GET /open-houses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: u64,
    pub address: String,
    pub area: String,
    pub open_house_time: String,
    pub redfin_url: String,
    pub notes: String,
    pub price: Option<u64>,
}

impl Listing {
    fn empty(id: u64) -> Self {
        Self {
            id,
            address: String::new(),
            area: String::new(),
            open_house_time: String::new(),
            redfin_url: String::new(),
            notes: String::new(),
            price: None,
        }
    }
}

/// Sheet header names the listing tab is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    Address,
    Area,
    OpenHouseTime,
    RedfinUrl,
    Notes,
    Price,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        match header.trim() {
            "id" => Some(Self::Id),
            "address" => Some(Self::Address),
            "area" => Some(Self::Area),
            "open_house_time" => Some(Self::OpenHouseTime),
            "redfin_url" => Some(Self::RedfinUrl),
            "notes" => Some(Self::Notes),
            "price" => Some(Self::Price),
            _ => None,
        }
    }
}

/// Parse an id cell; anything that is not an integer counts as 0.
pub fn parse_id(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(0)
}

/// Strip currency formatting and parse. Empty, non-numeric and negative
/// values all yield `None`; a bad price never drops the row.
pub fn parse_price(raw: &str) -> Option<u64> {
    let clean: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    let clean = clean.trim();
    if clean.is_empty() {
        return None;
    }
    match clean.parse::<u64>() {
        Ok(price) => Some(price),
        Err(_) => {
            debug!(raw, "unparseable price cell, treating as absent");
            None
        }
    }
}

/// Map one data row onto a [`Listing`] using the header row for column lookup.
///
/// Returns `None` for rows with no non-empty cell and for rows whose id does
/// not resolve to a positive integer. Short rows read as empty cells past
/// their end; cells under unknown headers are ignored.
pub fn listing_from_row(headers: &[String], row: &[String]) -> Option<Listing> {
    if row.iter().all(|cell| cell.is_empty()) {
        return None;
    }

    let mut listing = Listing::empty(0);
    let mut id = 0i64;
    for (i, header) in headers.iter().enumerate() {
        let Some(column) = Column::from_header(header) else { continue };
        let value = row.get(i).map(String::as_str).unwrap_or("");
        match column {
            Column::Id => id = parse_id(value),
            Column::Price => listing.price = parse_price(value),
            Column::Address => listing.address = value.to_string(),
            Column::Area => listing.area = value.to_string(),
            Column::OpenHouseTime => listing.open_house_time = value.to_string(),
            Column::RedfinUrl => listing.redfin_url = value.to_string(),
            Column::Notes => listing.notes = value.to_string(),
        }
    }

    if id <= 0 {
        debug!(id, "dropping row without a positive id");
        return None;
    }
    listing.id = id as u64;
    Some(listing)
}

/// Convert a whole value range (first row = headers) into listings, keeping row order.
pub fn listings_from_table(values: &[Vec<String>]) -> Vec<Listing> {
    let Some((headers, rows)) = values.split_first() else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| listing_from_row(headers, row))
        .collect()
}
