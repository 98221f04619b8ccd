//! Pending mutation model and the versioned persistence wrapper.

use serde::{Deserialize, Serialize};

use crate::{
    record::ReviewDraft,
    types::{PendingSeq, RestaurantId},
};

/// Version number for serialized [`PendingEnvelope`] payloads.
pub const PENDING_FORMAT_VERSION: u16 = 1;

/// A mutation that failed to reach the network and awaits replay.
///
/// Entries are immutable once enqueued; they are deleted exactly when
/// their replay succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingOp {
    /// Favorite flag toggle for one restaurant.
    FavoriteUpdate {
        /// Restaurant to update.
        restaurant_id: RestaurantId,
        /// Desired favorite state.
        is_favorite: bool,
    },
    /// Creation of a new review.
    ReviewCreate {
        /// The review payload to post.
        draft: ReviewDraft,
    },
}

impl PendingOp {
    /// Restaurant the mutation concerns, used for notification targeting.
    pub fn restaurant_id(&self) -> RestaurantId {
        match self {
            Self::FavoriteUpdate { restaurant_id, .. } => *restaurant_id,
            Self::ReviewCreate { draft } => draft.restaurant_id,
        }
    }
}

/// Queue row metadata plus the pending operation.
///
/// `seq` and `ts_ms` come from the backing store row, which is
/// authoritative; the payload never carries its own copy.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPending {
    /// Monotonic queue sequence assigned at enqueue time.
    pub seq: PendingSeq,
    /// Enqueue timestamp in milliseconds.
    pub ts_ms: u64,
    /// The queued mutation.
    pub op: PendingOp,
}

/// Versioned wrapper for stable on-disk payload decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEnvelope {
    /// Payload format version.
    pub format_version: u16,
    /// Wrapped operation.
    pub op: PendingOp,
}

impl PendingEnvelope {
    /// Constructs an envelope using [`PENDING_FORMAT_VERSION`].
    pub fn new(op: PendingOp) -> Self {
        Self {
            format_version: PENDING_FORMAT_VERSION,
            op,
        }
    }
}
