//! Offline-first data layer for a restaurant directory and review app.
//!
//! Reads follow a cache-aside policy over a sqlite-backed [`store`];
//! mutations that cannot reach the network are queued durably and
//! replayed in order when connectivity returns.
//!
//! # Examples
//!
//! Blocking usage with [`sync::session::Session`] and a canned remote:
//! ```
//! use dinesync::{
//!     record::{Restaurant, Review, ReviewDraft},
//!     remote::{RemoteApi, RemoteError, RemoteResult},
//!     store::local::LocalStore,
//!     sync::session::Session,
//!     types::RestaurantId,
//! };
//!
//! struct CannedRemote(Vec<Restaurant>);
//!
//! impl RemoteApi for CannedRemote {
//!     fn fetch_restaurants(&mut self) -> RemoteResult<Vec<Restaurant>> {
//!         Ok(self.0.clone())
//!     }
//!     fn fetch_restaurant_by_id(&mut self, _: RestaurantId) -> RemoteResult<Restaurant> {
//!         Err(RemoteError::NotFound)
//!     }
//!     fn fetch_reviews_by_restaurant(&mut self, _: RestaurantId) -> RemoteResult<Vec<Review>> {
//!         Ok(Vec::new())
//!     }
//!     fn update_favorite(&mut self, _: RestaurantId, _: bool) -> RemoteResult<Restaurant> {
//!         Err(RemoteError::Network("offline".to_string()))
//!     }
//!     fn create_review(&mut self, _: &ReviewDraft) -> RemoteResult<Review> {
//!         Err(RemoteError::Network("offline".to_string()))
//!     }
//! }
//!
//! let remote = CannedRemote(vec![Restaurant {
//!     id: 1,
//!     name: "Noodle Bar".to_string(),
//!     cuisine_type: "Thai".to_string(),
//!     neighborhood: "Harlem".to_string(),
//!     address: "123 Main St".to_string(),
//!     latlng: Default::default(),
//!     photograph: String::new(),
//!     operating_hours: Default::default(),
//!     is_favorite: false,
//! }]);
//!
//! let mut session = Session::new(LocalStore::open_in_memory(), Box::new(remote));
//! let thai = session
//!     .filter_by_cuisine_and_neighborhood("Thai", "all")
//!     .expect("filter");
//! assert_eq!(thai.len(), 1);
//! // Second read is served from the cache.
//! assert_eq!(session.fetch_restaurants().expect("cached").len(), 1);
//! ```
//!
//! Runtime usage against a live endpoint:
//! ```no_run
//! use dinesync::{
//!     remote::http::HttpRemote,
//!     runtime::handle::{RuntimeConfig, spawn_helper},
//!     store::local::LocalStore,
//!     sync::session::Session,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = LocalStore::open("dinesync.db");
//! let remote = Box::new(HttpRemote::new("http://localhost:1337"));
//! let handle = spawn_helper(Session::new(store, remote), RuntimeConfig::default());
//! let restaurants = handle.fetch_restaurants().await.expect("fetch");
//! # let _ = restaurants;
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```

/// Pending mutation model and versioned envelope.
pub mod pending;
/// Restaurant and review domain records.
pub mod record;
/// Remote client trait and HTTP implementation.
pub mod remote;
/// Single-writer async runtime and event stream.
pub mod runtime;
/// Sqlite-backed local store.
pub mod store;
/// Cache-aside reader, pending queue, and reconciler.
pub mod sync;
/// Shared primitive types.
pub mod types;
