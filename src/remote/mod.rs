//! Remote access to the canonical data source.

/// HTTP implementation of [`RemoteApi`].
pub mod http;

use crate::{
    record::{Restaurant, Review, ReviewDraft},
    types::RestaurantId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The requested identifier does not exist remotely.
    NotFound,
    /// Transient failure reaching the remote endpoint; timeouts included.
    Network(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        if value.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            Self::NotFound
        } else {
            Self::Network(value.to_string())
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Stateless accessors for the REST-like endpoint.
///
/// All methods are side-effect-free locally and block the calling thread;
/// the runtime dispatches them through `spawn_blocking`. Failures are
/// always signaled so the caller can decide whether to enqueue.
pub trait RemoteApi: Send {
    /// Fetches the full restaurant list.
    fn fetch_restaurants(&mut self) -> RemoteResult<Vec<Restaurant>>;

    /// Fetches one restaurant by id.
    fn fetch_restaurant_by_id(&mut self, id: RestaurantId) -> RemoteResult<Restaurant>;

    /// Fetches the reviews owned by one restaurant.
    fn fetch_reviews_by_restaurant(&mut self, id: RestaurantId) -> RemoteResult<Vec<Review>>;

    /// Sets the favorite flag; returns the confirmed record.
    fn update_favorite(&mut self, id: RestaurantId, is_favorite: bool)
    -> RemoteResult<Restaurant>;

    /// Creates a review; returns the created record with its assigned id.
    fn create_review(&mut self, draft: &ReviewDraft) -> RemoteResult<Review>;
}
