//! Runtime event stream payloads.

use crate::{
    record::Review,
    types::{PendingSeq, RestaurantId},
};

/// Events emitted toward the UI-facing collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum DataEvent {
    /// A restaurant's favorite state was confirmed remotely.
    FavoriteChanged {
        /// Restaurant whose flag changed.
        restaurant_id: RestaurantId,
        /// New favorite state.
        is_favorite: bool,
    },
    /// A review was created for the restaurant currently displayed.
    ReviewAdded {
        /// The created review, ready for immediate rendering.
        review: Review,
    },
    /// Host connectivity changed.
    ConnectivityChanged {
        /// True when the network came back.
        online: bool,
    },
    /// A drain pass replayed the whole queue snapshot.
    QueueDrained {
        /// Number of entries replayed.
        replayed: usize,
    },
    /// A drain pass stopped at a failing entry; it will retry next pass.
    ReplayHalted {
        /// Sequence of the retained entry.
        at: PendingSeq,
    },
}
