use tracing::{debug, warn};

use crate::{
    pending::{PendingOp, StoredPending},
    remote::{RemoteApi, RemoteResult},
    runtime::events::DataEvent,
    store::{StoreResult, local::LocalStore},
    types::RestaurantId,
};

use super::queue::{self, DrainOutcome, ReplayHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplayState {
    Idle,
    Draining,
}

/// Bridges connectivity signals to queue replay.
///
/// State machine: `Idle --network-online--> Draining --pass done--> Idle`.
/// A network-online signal received while already draining is a no-op.
#[derive(Debug)]
pub struct Reconciler {
    state: ReplayState,
    viewing: Option<RestaurantId>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            state: ReplayState::Idle,
            viewing: None,
        }
    }

    /// Records which restaurant detail page is currently displayed.
    ///
    /// A replayed review is announced to the UI collaborator only when it
    /// belongs to this restaurant.
    pub fn set_viewing(&mut self, viewing: Option<RestaurantId>) {
        self.viewing = viewing;
    }

    pub fn is_draining(&self) -> bool {
        self.state == ReplayState::Draining
    }

    /// Handles a network-restored signal: runs one drain pass.
    pub fn on_online(
        &mut self,
        store: &LocalStore,
        remote: &mut dyn RemoteApi,
        emit: &mut dyn FnMut(DataEvent),
    ) -> StoreResult<DrainOutcome> {
        if self.state == ReplayState::Draining {
            debug!("drain pass already active, ignoring connectivity signal");
            return Ok(DrainOutcome::Drained { replayed: 0 });
        }
        self.state = ReplayState::Draining;
        emit(DataEvent::ConnectivityChanged { online: true });

        let outcome = {
            let mut pass = ReplayPass {
                remote,
                viewing: self.viewing,
                emit: &mut *emit,
            };
            queue::drain_in_order(store, &mut pass)
        };
        self.state = ReplayState::Idle;

        match &outcome {
            Ok(DrainOutcome::Drained { replayed }) => {
                emit(DataEvent::QueueDrained {
                    replayed: *replayed,
                });
            }
            Ok(DrainOutcome::Halted { at, .. }) => {
                emit(DataEvent::ReplayHalted { at: *at });
            }
            Err(err) => {
                warn!(?err, "drain pass aborted by store failure");
            }
        }
        outcome
    }

    /// Handles a network-lost signal. Presentation-only, no state change.
    pub fn on_offline(&mut self, emit: &mut dyn FnMut(DataEvent)) {
        emit(DataEvent::ConnectivityChanged { online: false });
    }
}

struct ReplayPass<'a> {
    remote: &'a mut dyn RemoteApi,
    viewing: Option<RestaurantId>,
    emit: &'a mut dyn FnMut(DataEvent),
}

impl ReplayHandler for ReplayPass<'_> {
    fn replay(&mut self, store: &LocalStore, entry: &StoredPending) -> RemoteResult<()> {
        match &entry.op {
            PendingOp::FavoriteUpdate {
                restaurant_id,
                is_favorite,
            } => {
                let confirmed = self.remote.update_favorite(*restaurant_id, *is_favorite)?;
                if let Err(err) = store.put_restaurant(&confirmed) {
                    warn!(?err, restaurant_id, "failed to cache replayed favorite state");
                }
                (self.emit)(DataEvent::FavoriteChanged {
                    restaurant_id: *restaurant_id,
                    is_favorite: *is_favorite,
                });
            }
            PendingOp::ReviewCreate { draft } => {
                let created = self.remote.create_review(draft)?;
                if let Err(err) = store.put_review(&created) {
                    warn!(?err, review_id = created.id, "failed to cache replayed review");
                }
                if self.viewing == Some(created.restaurant_id) {
                    (self.emit)(DataEvent::ReviewAdded { review: created });
                }
            }
        }
        Ok(())
    }
}
