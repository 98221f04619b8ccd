use std::sync::{Arc, Mutex};

use hashbrown::HashSet;

use dinesync::{
    pending::{PendingOp, StoredPending},
    record::{Restaurant, Review, ReviewDraft},
    remote::{RemoteApi, RemoteError, RemoteResult},
    runtime::events::DataEvent,
    store::local::LocalStore,
    sync::{
        MutationOutcome,
        queue::{self, DrainOutcome, ReplayHandler},
        session::Session,
    },
    types::{PendingSeq, RestaurantId},
};

fn restaurant(id: RestaurantId, is_favorite: bool) -> Restaurant {
    Restaurant {
        id,
        name: format!("Restaurant {id}"),
        cuisine_type: "Italian".to_string(),
        neighborhood: "SoHo".to_string(),
        address: "123 Main St".to_string(),
        latlng: Default::default(),
        photograph: String::new(),
        operating_hours: Default::default(),
        is_favorite,
    }
}

fn draft(restaurant_id: RestaurantId, comments: &str) -> ReviewDraft {
    ReviewDraft {
        restaurant_id,
        name: "Pat".to_string(),
        rating: 5,
        comments: comments.to_string(),
    }
}

#[derive(Default)]
struct ScriptedState {
    online: bool,
    fail_favorites: HashSet<RestaurantId>,
    replayed: Vec<String>,
    next_review_id: u64,
}

#[derive(Clone, Default)]
struct ScriptedRemote(Arc<Mutex<ScriptedState>>);

impl ScriptedRemote {
    fn offline() -> Self {
        Self::default()
    }

    fn set_online(&self, online: bool) {
        self.0.lock().expect("lock").online = online;
    }

    fn fail_favorite_for(&self, id: RestaurantId) {
        self.0.lock().expect("lock").fail_favorites.insert(id);
    }

    fn clear_failures(&self) {
        self.0.lock().expect("lock").fail_favorites.clear();
    }

    fn replayed(&self) -> Vec<String> {
        self.0.lock().expect("lock").replayed.clone()
    }
}

impl RemoteApi for ScriptedRemote {
    fn fetch_restaurants(&mut self) -> RemoteResult<Vec<Restaurant>> {
        Err(RemoteError::Network("offline".to_string()))
    }

    fn fetch_restaurant_by_id(&mut self, _: RestaurantId) -> RemoteResult<Restaurant> {
        Err(RemoteError::Network("offline".to_string()))
    }

    fn fetch_reviews_by_restaurant(&mut self, _: RestaurantId) -> RemoteResult<Vec<Review>> {
        Err(RemoteError::Network("offline".to_string()))
    }

    fn update_favorite(
        &mut self,
        id: RestaurantId,
        is_favorite: bool,
    ) -> RemoteResult<Restaurant> {
        let mut state = self.0.lock().expect("lock");
        if !state.online {
            return Err(RemoteError::Network("offline".to_string()));
        }
        if state.fail_favorites.contains(&id) {
            return Err(RemoteError::Network("flaky endpoint".to_string()));
        }
        state.replayed.push(format!("favorite:{id}:{is_favorite}"));
        Ok(restaurant(id, is_favorite))
    }

    fn create_review(&mut self, draft: &ReviewDraft) -> RemoteResult<Review> {
        let mut state = self.0.lock().expect("lock");
        if !state.online {
            return Err(RemoteError::Network("offline".to_string()));
        }
        state.next_review_id += 1;
        let id = state.next_review_id;
        state
            .replayed
            .push(format!("review:{}:{id}", draft.restaurant_id));
        Ok(Review {
            id,
            restaurant_id: draft.restaurant_id,
            name: draft.name.clone(),
            rating: draft.rating,
            comments: draft.comments.clone(),
            updated_at_ms: 42,
        })
    }
}

fn collect_events(events: &mut Vec<DataEvent>) -> impl FnMut(DataEvent) + '_ {
    move |evt| events.push(evt)
}

#[test]
fn drain_replays_in_enqueue_order() {
    let remote = ScriptedRemote::offline();
    let probe = remote.clone();
    let mut session = Session::new(LocalStore::open_in_memory(), Box::new(remote));

    assert!(session.set_favorite(1, true).expect("toggle").is_queued());
    assert!(session.add_review(draft(2, "queued")).expect("review").is_queued());
    assert!(session.set_favorite(3, true).expect("toggle").is_queued());
    assert_eq!(session.store().pending_count().expect("count"), 3);

    probe.set_online(true);
    let mut events = Vec::new();
    let outcome = session
        .network_restored(&mut collect_events(&mut events))
        .expect("drain");

    assert_eq!(outcome, DrainOutcome::Drained { replayed: 3 });
    assert_eq!(
        probe.replayed(),
        vec!["favorite:1:true", "review:2:1", "favorite:3:true"]
    );
    assert_eq!(session.store().pending_count().expect("count"), 0);
}

#[test]
fn failed_entry_halts_the_pass_without_skipping() {
    let remote = ScriptedRemote::offline();
    let probe = remote.clone();
    let mut session = Session::new(LocalStore::open_in_memory(), Box::new(remote));

    assert!(session.set_favorite(1, true).expect("toggle").is_queued());
    assert!(session.set_favorite(2, true).expect("toggle").is_queued());
    assert!(session.set_favorite(3, true).expect("toggle").is_queued());

    probe.set_online(true);
    probe.fail_favorite_for(2);

    let mut events = Vec::new();
    let outcome = session
        .network_restored(&mut collect_events(&mut events))
        .expect("drain");
    assert_eq!(outcome, DrainOutcome::Halted { at: 2, replayed: 1 });

    let left: Vec<PendingSeq> = session
        .store()
        .pending_snapshot()
        .expect("snapshot")
        .iter()
        .map(|p| p.seq)
        .collect();
    assert_eq!(left, vec![2, 3], "failed entry retained, later entry untouched");
    assert_eq!(probe.replayed(), vec!["favorite:1:true"]);
    assert!(events.contains(&DataEvent::ReplayHalted { at: 2 }));

    // The next connectivity signal retries from the same entry.
    probe.clear_failures();
    let outcome = session
        .network_restored(&mut collect_events(&mut events))
        .expect("second drain");
    assert_eq!(outcome, DrainOutcome::Drained { replayed: 2 });
    assert_eq!(
        probe.replayed(),
        vec!["favorite:1:true", "favorite:2:true", "favorite:3:true"]
    );
    assert_eq!(session.store().pending_count().expect("count"), 0);
}

#[test]
fn favorite_round_trip_updates_the_cached_record() {
    let remote = ScriptedRemote::offline();
    let probe = remote.clone();
    let mut session = Session::new(LocalStore::open_in_memory(), Box::new(remote));
    session
        .store()
        .put_restaurant(&restaurant(7, false))
        .expect("seed cache");

    let outcome = session.set_favorite(7, true).expect("offline toggle");
    assert_eq!(outcome, MutationOutcome::Queued);
    // Optimistic flip so the flag survives an offline restart.
    assert!(session.store().restaurant(7).expect("get").expect("cached").is_favorite);

    probe.set_online(true);
    let mut events = Vec::new();
    session
        .network_restored(&mut collect_events(&mut events))
        .expect("drain");

    let cached = session.store().restaurant(7).expect("get").expect("cached");
    assert!(cached.is_favorite);
    assert_eq!(probe.replayed(), vec!["favorite:7:true"]);
    assert!(events.contains(&DataEvent::FavoriteChanged {
        restaurant_id: 7,
        is_favorite: true
    }));
}

#[test]
fn review_replay_notifies_only_the_displayed_restaurant() {
    let remote = ScriptedRemote::offline();
    let probe = remote.clone();
    let mut session = Session::new(LocalStore::open_in_memory(), Box::new(remote));

    assert!(session.add_review(draft(1, "first")).expect("review").is_queued());
    assert!(session.add_review(draft(2, "second")).expect("review").is_queued());

    session.set_viewing(Some(2));
    probe.set_online(true);
    let mut events = Vec::new();
    session
        .network_restored(&mut collect_events(&mut events))
        .expect("drain");

    let added: Vec<_> = events
        .iter()
        .filter_map(|evt| match evt {
            DataEvent::ReviewAdded { review } => Some(review.restaurant_id),
            _ => None,
        })
        .collect();
    assert_eq!(added, vec![2], "only the displayed detail page is notified");
    // Both reviews were still replayed and cached.
    assert_eq!(session.store().reviews_for(1).expect("reviews").len(), 1);
    assert_eq!(session.store().reviews_for(2).expect("reviews").len(), 1);
}

struct EnqueueDuringDrain {
    seen: Vec<PendingSeq>,
    injected: bool,
}

impl ReplayHandler for EnqueueDuringDrain {
    fn replay(&mut self, store: &LocalStore, entry: &StoredPending) -> RemoteResult<()> {
        self.seen.push(entry.seq);
        if !self.injected {
            self.injected = true;
            store
                .enqueue_pending(&PendingOp::FavoriteUpdate {
                    restaurant_id: 99,
                    is_favorite: true,
                })
                .expect("enqueue mid drain");
        }
        Ok(())
    }
}

#[test]
fn entries_enqueued_mid_pass_wait_for_the_next_pass() {
    let store = LocalStore::open_in_memory();
    for id in [1u64, 2] {
        store
            .enqueue_pending(&PendingOp::FavoriteUpdate {
                restaurant_id: id,
                is_favorite: true,
            })
            .expect("enqueue");
    }

    let mut handler = EnqueueDuringDrain {
        seen: Vec::new(),
        injected: false,
    };
    let outcome = queue::drain_in_order(&store, &mut handler).expect("drain");

    assert_eq!(outcome, DrainOutcome::Drained { replayed: 2 });
    assert_eq!(handler.seen, vec![1, 2], "snapshot cursor ignores the injected entry");
    assert_eq!(store.pending_count().expect("count"), 1);

    let left = store.pending_snapshot().expect("snapshot");
    assert_eq!(left[0].op.restaurant_id(), 99);
}
