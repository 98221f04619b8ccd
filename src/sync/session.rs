use hashbrown::HashSet;
use tracing::{debug, warn};

use crate::{
    pending::PendingOp,
    record::{Restaurant, Review, ReviewDraft},
    remote::{RemoteApi, RemoteError, RemoteResult},
    runtime::events::DataEvent,
    store::{StoreResult, local::LocalStore},
    types::RestaurantId,
};

use super::{MutationOutcome, queue::DrainOutcome, reconciler::Reconciler};

/// Wildcard sentinel matching every facet value.
pub const ALL: &str = "all";

/// The data-access context: local store, remote client, replay state.
///
/// One session is shared by all reads and writes of a running app; the
/// runtime serializes access to it. Reads follow a cache-aside policy
/// (local first, network on miss, populate on the way back). Mutations
/// attempt the network first and are queued durably on failure.
pub struct Session {
    store: LocalStore,
    remote: Box<dyn RemoteApi>,
    reconciler: Reconciler,
}

impl Session {
    pub fn new(store: LocalStore, remote: Box<dyn RemoteApi>) -> Self {
        Self {
            store,
            remote,
            reconciler: Reconciler::new(),
        }
    }

    /// The underlying local store.
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Records which restaurant detail page is currently displayed.
    pub fn set_viewing(&mut self, viewing: Option<RestaurantId>) {
        self.reconciler.set_viewing(viewing);
    }

    /// Returns the restaurant list, from cache when it is non-empty.
    ///
    /// Cache-aside without refresh: once the list is cached, list reads
    /// never revisit the network. Store failures degrade to a miss.
    pub fn fetch_restaurants(&mut self) -> RemoteResult<Vec<Restaurant>> {
        match self.store.restaurant_count() {
            Ok(count) if count > 0 => match self.store.restaurants() {
                Ok(cached) => return Ok(cached),
                Err(err) => warn!(?err, "restaurant cache read failed, going to network"),
            },
            Ok(_) => {}
            Err(err) => warn!(?err, "restaurant cache count failed, going to network"),
        }

        let fetched = self.remote.fetch_restaurants()?;
        if let Err(err) = self.store.put_restaurants(&fetched) {
            warn!(?err, "failed to cache restaurant list");
        }
        Ok(fetched)
    }

    /// Returns one restaurant, from cache on hit.
    pub fn fetch_restaurant_by_id(&mut self, id: RestaurantId) -> RemoteResult<Restaurant> {
        match self.store.restaurant(id) {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(err) => warn!(?err, id, "restaurant cache lookup failed, going to network"),
        }

        let fetched = self.remote.fetch_restaurant_by_id(id)?;
        if let Err(err) = self.store.put_restaurant(&fetched) {
            warn!(?err, id, "failed to cache restaurant");
        }
        Ok(fetched)
    }

    /// Returns the reviews for one restaurant, from the index on hit.
    ///
    /// An empty index result counts as a miss; a restaurant genuinely
    /// without reviews re-fetches an empty list from the remote.
    pub fn fetch_reviews_by_restaurant(&mut self, id: RestaurantId) -> RemoteResult<Vec<Review>> {
        match self.store.reviews_for(id) {
            Ok(cached) if !cached.is_empty() => return Ok(cached),
            Ok(_) => {}
            Err(err) => warn!(?err, id, "review cache lookup failed, going to network"),
        }

        let fetched = self.remote.fetch_reviews_by_restaurant(id)?;
        if let Err(err) = self.store.put_reviews(&fetched) {
            warn!(?err, id, "failed to cache reviews");
        }
        Ok(fetched)
    }

    /// Filters the working restaurant set by cuisine and neighborhood.
    ///
    /// `"all"` is the wildcard for either dimension.
    pub fn filter_by_cuisine_and_neighborhood(
        &mut self,
        cuisine: &str,
        neighborhood: &str,
    ) -> RemoteResult<Vec<Restaurant>> {
        let mut results = self.fetch_restaurants()?;
        if cuisine != ALL {
            results.retain(|r| r.cuisine_type == cuisine);
        }
        if neighborhood != ALL {
            results.retain(|r| r.neighborhood == neighborhood);
        }
        Ok(results)
    }

    /// Distinct neighborhoods across the working set, first-seen order.
    pub fn neighborhoods(&mut self) -> RemoteResult<Vec<String>> {
        Ok(distinct(self.fetch_restaurants()?, |r| r.neighborhood.clone()))
    }

    /// Distinct cuisine types across the working set, first-seen order.
    pub fn cuisines(&mut self) -> RemoteResult<Vec<String>> {
        Ok(distinct(self.fetch_restaurants()?, |r| r.cuisine_type.clone()))
    }

    /// Sets the favorite flag, queueing the write when the network fails.
    ///
    /// On a queued outcome the cached record is flipped optimistically so
    /// the flag survives an offline restart; the replay confirmation
    /// overwrites it later.
    pub fn set_favorite(
        &mut self,
        id: RestaurantId,
        is_favorite: bool,
    ) -> RemoteResult<MutationOutcome<Restaurant>> {
        match self.remote.update_favorite(id, is_favorite) {
            Ok(confirmed) => {
                if let Err(err) = self.store.put_restaurant(&confirmed) {
                    warn!(?err, id, "failed to cache favorite update");
                }
                Ok(MutationOutcome::Applied(confirmed))
            }
            Err(RemoteError::Network(reason)) => {
                debug!(id, reason, "favorite update unreachable, queueing");
                self.enqueue(PendingOp::FavoriteUpdate {
                    restaurant_id: id,
                    is_favorite,
                });
                match self.store.restaurant(id) {
                    Ok(Some(mut cached)) => {
                        cached.is_favorite = is_favorite;
                        if let Err(err) = self.store.put_restaurant(&cached) {
                            warn!(?err, id, "failed to flip cached favorite flag");
                        }
                    }
                    Ok(None) => {}
                    Err(err) => warn!(?err, id, "cached favorite flip lookup failed"),
                }
                Ok(MutationOutcome::Queued)
            }
            // NotFound is not network-caused and surfaces to the caller.
            Err(other) => Err(other),
        }
    }

    /// Creates a review, queueing the write when the network fails.
    pub fn add_review(&mut self, draft: ReviewDraft) -> RemoteResult<MutationOutcome<Review>> {
        match self.remote.create_review(&draft) {
            Ok(created) => {
                if let Err(err) = self.store.put_review(&created) {
                    warn!(?err, review_id = created.id, "failed to cache created review");
                }
                Ok(MutationOutcome::Applied(created))
            }
            Err(RemoteError::Network(reason)) => {
                debug!(
                    restaurant_id = draft.restaurant_id,
                    reason, "review creation unreachable, queueing"
                );
                self.enqueue(PendingOp::ReviewCreate { draft });
                Ok(MutationOutcome::Queued)
            }
            Err(other) => Err(other),
        }
    }

    /// Handles a network-restored signal by draining the pending queue.
    pub fn network_restored(
        &mut self,
        emit: &mut dyn FnMut(DataEvent),
    ) -> StoreResult<DrainOutcome> {
        self.reconciler
            .on_online(&self.store, self.remote.as_mut(), emit)
    }

    /// Handles a network-lost signal.
    pub fn network_lost(&mut self, emit: &mut dyn FnMut(DataEvent)) {
        self.reconciler.on_offline(emit);
    }

    /// Best-effort enqueue; a non-durable queue drops the write.
    fn enqueue(&self, op: PendingOp) {
        match self.store.enqueue_pending(&op) {
            Ok(Some(seq)) => debug!(seq, "queued pending mutation"),
            Ok(None) => {}
            Err(err) => warn!(?err, "failed to queue pending mutation"),
        }
    }
}

fn distinct(restaurants: Vec<Restaurant>, field: impl Fn(&Restaurant) -> String) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for restaurant in &restaurants {
        let value = field(restaurant);
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}
