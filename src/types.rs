//! Shared primitive IDs and the geographic coordinate type.

use serde::{Deserialize, Serialize};

/// Restaurant identifier assigned by the remote service.
pub type RestaurantId = u64;
/// Review identifier assigned by the remote service.
pub type ReviewId = u64;
/// Monotonic sequence number of a queued pending request.
pub type PendingSeq = u64;

/// Geographic coordinate of a restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}
