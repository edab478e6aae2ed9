//! Plain catalog entities produced by the record store.
//!
//! These are data-only types with no behavior. All scalar fields on
//! [`Listing`] except the enums are optional: absence means "not yet set",
//! and no validation is enforced at construction.

use crate::blob::Blob;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a listing stores items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StorageType {
    /// Inside the host's own room or house.
    #[default]
    #[serde(rename = "In House")]
    InHouse,
    /// In a basement.
    #[serde(rename = "Basement")]
    Basement,
    /// At a separate off-site location.
    #[serde(rename = "Off Location")]
    OffLocation,
}

/// Billing period for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RentType {
    /// Flat rate for the whole summer.
    #[default]
    Summer,
    /// Billed per month.
    Monthly,
    /// Billed per day.
    Daily,
}

impl StorageType {
    /// Wire string used in backend records.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InHouse => "In House",
            Self::Basement => "Basement",
            Self::OffLocation => "Off Location",
        }
    }
}

impl RentType {
    /// Wire string used in backend records.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Summer => "Summer",
            Self::Monthly => "Monthly",
            Self::Daily => "Daily",
        }
    }
}

/// A storable catalog item, constructed directly from a record snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorableObject {
    /// Display name of the item.
    pub name: String,
}

impl StorableObject {
    /// Create a new storable object.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A vendor company offering storage, built by flattening a three-level
/// nested record (company → price index → item → option → price).
///
/// `price_index` keys are item names and values are prices; duplicate item
/// names resolve last-write-wins during flattening.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StorageCompany {
    /// Company display name.
    pub name: String,
    /// Item name → price, flattened from the nested record.
    pub price_index: HashMap<String, f64>,
    /// Offered pickup times.
    pub pickup_times: Vec<DateTime<Utc>>,
    /// Offered dropoff times.
    pub dropoff_times: Vec<DateTime<Utc>>,
    /// Company image; empty until resolved through the blob cache.
    pub image: Blob,
}

/// A storage-space listing.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Owning user id.
    pub uid: Option<String>,
    /// Listing record id.
    pub listing_id: Option<String>,
    /// Free-form location description.
    pub location: Option<String>,
    /// Where the items are kept.
    pub storage_type: StorageType,
    /// Advertised floor area.
    pub square_feet: Option<String>,
    /// Billing period.
    pub rent_type: RentType,
    /// Advertised price.
    pub rent: Option<String>,
    /// Dates the space is available.
    pub dates: Vec<NaiveDate>,
    /// Items the host will not store.
    pub restricted_items: Vec<StorableObject>,
    /// Items the host explicitly allows.
    pub allowed_items: Vec<StorableObject>,
    /// Listing photos.
    pub images: Vec<Blob>,
    /// Free-form description.
    pub description: String,
}
