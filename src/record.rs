//! Restaurant and review domain records plus the review draft payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{LatLng, RestaurantId, ReviewId};

/// Operating hours keyed by day name, values are free-form time ranges.
pub type OperatingHours = BTreeMap<String, String>;

/// Restaurant record as cached locally; the canonical copy is remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Stable restaurant identifier.
    pub id: RestaurantId,
    /// Display name.
    pub name: String,
    /// Cuisine facet value, e.g. `"Italian"`.
    pub cuisine_type: String,
    /// Neighborhood facet value, e.g. `"SoHo"`.
    pub neighborhood: String,
    /// Street address.
    pub address: String,
    /// Geographic coordinate for the map marker.
    pub latlng: LatLng,
    /// Photograph reference; some rows arrive without one.
    #[serde(default)]
    pub photograph: String,
    /// Operating hours by day.
    #[serde(default)]
    pub operating_hours: OperatingHours,
    /// Local favorite flag, eventually consistent with the remote.
    #[serde(default)]
    pub is_favorite: bool,
}

/// Review record, indexed locally by its owning restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Stable review identifier.
    pub id: ReviewId,
    /// Owning restaurant identifier.
    pub restaurant_id: RestaurantId,
    /// Reviewer name.
    pub name: String,
    /// Rating, 1 through 5.
    pub rating: u8,
    /// Review body.
    pub comments: String,
    /// Last-update timestamp in milliseconds since epoch.
    #[serde(default)]
    pub updated_at_ms: u64,
}

/// Payload used to create a new [`Review`] against the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDraft {
    /// Owning restaurant identifier.
    pub restaurant_id: RestaurantId,
    /// Reviewer name.
    pub name: String,
    /// Rating, 1 through 5.
    pub rating: u8,
    /// Review body.
    pub comments: String,
}
