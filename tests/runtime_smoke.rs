use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::sync::broadcast;

use dinesync::{
    record::{Restaurant, Review, ReviewDraft},
    remote::{RemoteApi, RemoteError, RemoteResult},
    runtime::{
        events::DataEvent,
        handle::{RuntimeConfig, spawn_helper},
    },
    store::local::LocalStore,
    sync::{MutationOutcome, queue::DrainOutcome, session::Session},
    types::RestaurantId,
};

fn restaurant(id: RestaurantId, cuisine: &str) -> Restaurant {
    Restaurant {
        id,
        name: format!("Restaurant {id}"),
        cuisine_type: cuisine.to_string(),
        neighborhood: "SoHo".to_string(),
        address: "123 Main St".to_string(),
        latlng: Default::default(),
        photograph: String::new(),
        operating_hours: Default::default(),
        is_favorite: false,
    }
}

struct SwitchState {
    online: bool,
    restaurants: Vec<Restaurant>,
    next_review_id: u64,
}

#[derive(Clone)]
struct SwitchRemote(Arc<Mutex<SwitchState>>);

impl SwitchRemote {
    fn new(online: bool, restaurants: Vec<Restaurant>) -> Self {
        Self(Arc::new(Mutex::new(SwitchState {
            online,
            restaurants,
            next_review_id: 0,
        })))
    }

    fn set_online(&self, online: bool) {
        self.0.lock().expect("lock").online = online;
    }
}

impl RemoteApi for SwitchRemote {
    fn fetch_restaurants(&mut self) -> RemoteResult<Vec<Restaurant>> {
        let state = self.0.lock().expect("lock");
        if !state.online {
            return Err(RemoteError::Network("offline".to_string()));
        }
        Ok(state.restaurants.clone())
    }

    fn fetch_restaurant_by_id(&mut self, id: RestaurantId) -> RemoteResult<Restaurant> {
        let state = self.0.lock().expect("lock");
        if !state.online {
            return Err(RemoteError::Network("offline".to_string()));
        }
        state
            .restaurants
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(RemoteError::NotFound)
    }

    fn fetch_reviews_by_restaurant(&mut self, _: RestaurantId) -> RemoteResult<Vec<Review>> {
        let state = self.0.lock().expect("lock");
        if !state.online {
            return Err(RemoteError::Network("offline".to_string()));
        }
        Ok(Vec::new())
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
        match state.restaurants.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                r.is_favorite = is_favorite;
                Ok(r.clone())
            }
            None => Err(RemoteError::NotFound),
        }
    }

    fn create_review(&mut self, draft: &ReviewDraft) -> RemoteResult<Review> {
        let mut state = self.0.lock().expect("lock");
        if !state.online {
            return Err(RemoteError::Network("offline".to_string()));
        }
        state.next_review_id += 1;
        Ok(Review {
            id: state.next_review_id,
            restaurant_id: draft.restaurant_id,
            name: draft.name.clone(),
            rating: draft.rating,
            comments: draft.comments.clone(),
            updated_at_ms: 42,
        })
    }
}

async fn next_event(sub: &mut broadcast::Receiver<DataEvent>) -> DataEvent {
    tokio::time::timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("event timeout")
        .expect("recv")
}

#[tokio::test]
async fn handle_round_trips_reads_and_immediate_mutations() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let remote = SwitchRemote::new(
        true,
        vec![restaurant(1, "Italian"), restaurant(2, "Thai")],
    );
    let session = Session::new(LocalStore::open_in_memory(), Box::new(remote));
    let handle = spawn_helper(session, RuntimeConfig::default());
    let mut sub = handle.subscribe();

    let restaurants = handle.fetch_restaurants().await.expect("fetch");
    assert_eq!(restaurants.len(), 2);

    let cuisines = handle.cuisines().await.expect("cuisines");
    assert_eq!(cuisines, vec!["Italian".to_string(), "Thai".to_string()]);

    let filtered = handle
        .filter_by_cuisine_and_neighborhood("Thai", "all")
        .await
        .expect("filter");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, 2);

    let outcome = handle.set_favorite(1, true).await.expect("favorite");
    assert!(matches!(outcome, MutationOutcome::Applied(ref r) if r.is_favorite));
    assert_eq!(
        next_event(&mut sub).await,
        DataEvent::FavoriteChanged {
            restaurant_id: 1,
            is_favorite: true
        }
    );

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn offline_mutation_queues_then_replays_on_connectivity() {
    let remote = SwitchRemote::new(false, vec![restaurant(1, "Italian")]);
    let probe = remote.clone();
    let session = Session::new(LocalStore::open_in_memory(), Box::new(remote));
    let handle = spawn_helper(session, RuntimeConfig::default());
    let mut sub = handle.subscribe();

    let outcome = handle.set_favorite(1, true).await.expect("offline favorite");
    assert_eq!(outcome, MutationOutcome::Queued);

    probe.set_online(true);
    let drained = handle.network_restored().await.expect("replay");
    assert_eq!(drained, DrainOutcome::Drained { replayed: 1 });

    assert_eq!(
        next_event(&mut sub).await,
        DataEvent::ConnectivityChanged { online: true }
    );
    assert_eq!(
        next_event(&mut sub).await,
        DataEvent::FavoriteChanged {
            restaurant_id: 1,
            is_favorite: true
        }
    );
    assert_eq!(next_event(&mut sub).await, DataEvent::QueueDrained { replayed: 1 });

    // The replay confirmation landed in the cache.
    let cached = handle.fetch_restaurant_by_id(1).await.expect("fetch");
    assert!(cached.is_favorite);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn network_lost_emits_a_transient_offline_notification() {
    let remote = SwitchRemote::new(true, vec![restaurant(1, "Italian")]);
    let session = Session::new(LocalStore::open_in_memory(), Box::new(remote));
    let handle = spawn_helper(session, RuntimeConfig::default());
    let mut sub = handle.subscribe();

    handle.network_lost().await.expect("signal");
    assert_eq!(
        next_event(&mut sub).await,
        DataEvent::ConnectivityChanged { online: false }
    );

    // Losing the network changes no local state.
    let drained = handle.network_restored().await.expect("drain");
    assert_eq!(drained, DrainOutcome::Drained { replayed: 0 });

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn queued_review_is_announced_for_the_displayed_restaurant() {
    let remote = SwitchRemote::new(false, vec![restaurant(3, "Sushi")]);
    let probe = remote.clone();
    let session = Session::new(LocalStore::open_in_memory(), Box::new(remote));
    let handle = spawn_helper(session, RuntimeConfig::default());
    let mut sub = handle.subscribe();

    let outcome = handle
        .add_review(ReviewDraft {
            restaurant_id: 3,
            name: "Pat".to_string(),
            rating: 5,
            comments: "Great uni.".to_string(),
        })
        .await
        .expect("offline review");
    assert_eq!(outcome, MutationOutcome::Queued);

    handle.set_viewing(Some(3)).await.expect("viewing");
    probe.set_online(true);
    handle.network_restored().await.expect("replay");

    let mut review_seen = false;
    for _ in 0..4 {
        match next_event(&mut sub).await {
            DataEvent::ReviewAdded { review } => {
                assert_eq!(review.restaurant_id, 3);
                review_seen = true;
                break;
            }
            _ => continue,
        }
    }
    assert!(review_seen, "expected ReviewAdded for the displayed restaurant");

    handle.shutdown().await.expect("shutdown");
}
