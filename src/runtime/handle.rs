use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, oneshot};

use crate::{
    record::{Restaurant, Review, ReviewDraft},
    remote::RemoteError,
    store::StoreError,
    sync::{MutationOutcome, queue::DrainOutcome, session::Session},
    types::RestaurantId,
};

use super::events::DataEvent;

#[derive(Debug)]
pub enum HelperError {
    Remote(RemoteError),
    Store(StoreError),
    Runtime(String),
    ChannelClosed,
}

impl From<RemoteError> for HelperError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

impl From<StoreError> for HelperError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub cmd_queue_bound: usize,
    pub events_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cmd_queue_bound: 256,
            events_capacity: 1024,
        }
    }
}

pub struct DataHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<DataEvent>,
}

impl Clone for DataHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    FetchRestaurants {
        resp: oneshot::Sender<Result<Vec<Restaurant>, HelperError>>,
    },
    FetchRestaurant {
        id: RestaurantId,
        resp: oneshot::Sender<Result<Restaurant, HelperError>>,
    },
    FetchReviews {
        restaurant_id: RestaurantId,
        resp: oneshot::Sender<Result<Vec<Review>, HelperError>>,
    },
    Filter {
        cuisine: String,
        neighborhood: String,
        resp: oneshot::Sender<Result<Vec<Restaurant>, HelperError>>,
    },
    Neighborhoods {
        resp: oneshot::Sender<Result<Vec<String>, HelperError>>,
    },
    Cuisines {
        resp: oneshot::Sender<Result<Vec<String>, HelperError>>,
    },
    SetFavorite {
        id: RestaurantId,
        is_favorite: bool,
        resp: oneshot::Sender<Result<MutationOutcome<Restaurant>, HelperError>>,
    },
    AddReview {
        draft: ReviewDraft,
        resp: oneshot::Sender<Result<MutationOutcome<Review>, HelperError>>,
    },
    SetViewing {
        restaurant_id: Option<RestaurantId>,
        resp: oneshot::Sender<()>,
    },
    NetworkRestored {
        resp: oneshot::Sender<Result<DrainOutcome, HelperError>>,
    },
    NetworkLost {
        resp: oneshot::Sender<()>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Spawns the single-writer command loop around `session`.
///
/// All session work (sqlite and HTTP) is blocking and runs under
/// `spawn_blocking`; the loop processes one command at a time, which is
/// what serializes queue drains against new mutations.
pub fn spawn_helper(session: Session, config: RuntimeConfig) -> DataHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.cmd_queue_bound);
    let (events_tx, _) = broadcast::channel::<DataEvent>(config.events_capacity);
    let session = Arc::new(Mutex::new(session));
    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &session, &events_tx_loop).await {
                break;
            }
        }
    });

    DataHandle { cmd_tx, events_tx }
}

impl DataHandle {
    /// Subscribes to the UI-facing event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<DataEvent> {
        self.events_tx.subscribe()
    }

    pub async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>, HelperError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::FetchRestaurants { resp: tx })
            .await
            .map_err(|_| HelperError::ChannelClosed)?;
        rx.await.map_err(|_| HelperError::ChannelClosed)?
    }

    pub async fn fetch_restaurant_by_id(
        &self,
        id: RestaurantId,
    ) -> Result<Restaurant, HelperError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::FetchRestaurant { id, resp: tx })
            .await
            .map_err(|_| HelperError::ChannelClosed)?;
        rx.await.map_err(|_| HelperError::ChannelClosed)?
    }

    pub async fn fetch_reviews_by_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<Review>, HelperError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::FetchReviews {
                restaurant_id,
                resp: tx,
            })
            .await
            .map_err(|_| HelperError::ChannelClosed)?;
        rx.await.map_err(|_| HelperError::ChannelClosed)?
    }

    pub async fn filter_by_cuisine_and_neighborhood(
        &self,
        cuisine: impl Into<String>,
        neighborhood: impl Into<String>,
    ) -> Result<Vec<Restaurant>, HelperError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Filter {
                cuisine: cuisine.into(),
                neighborhood: neighborhood.into(),
                resp: tx,
            })
            .await
            .map_err(|_| HelperError::ChannelClosed)?;
        rx.await.map_err(|_| HelperError::ChannelClosed)?
    }

    pub async fn neighborhoods(&self) -> Result<Vec<String>, HelperError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Neighborhoods { resp: tx })
            .await
            .map_err(|_| HelperError::ChannelClosed)?;
        rx.await.map_err(|_| HelperError::ChannelClosed)?
    }

    pub async fn cuisines(&self) -> Result<Vec<String>, HelperError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Cuisines { resp: tx })
            .await
            .map_err(|_| HelperError::ChannelClosed)?;
        rx.await.map_err(|_| HelperError::ChannelClosed)?
    }

    pub async fn set_favorite(
        &self,
        id: RestaurantId,
        is_favorite: bool,
    ) -> Result<MutationOutcome<Restaurant>, HelperError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SetFavorite {
                id,
                is_favorite,
                resp: tx,
            })
            .await
            .map_err(|_| HelperError::ChannelClosed)?;
        rx.await.map_err(|_| HelperError::ChannelClosed)?
    }

    pub async fn add_review(
        &self,
        draft: ReviewDraft,
    ) -> Result<MutationOutcome<Review>, HelperError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::AddReview { draft, resp: tx })
            .await
            .map_err(|_| HelperError::ChannelClosed)?;
        rx.await.map_err(|_| HelperError::ChannelClosed)?
    }

    pub async fn set_viewing(
        &self,
        restaurant_id: Option<RestaurantId>,
    ) -> Result<(), HelperError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SetViewing {
                restaurant_id,
                resp: tx,
            })
            .await
            .map_err(|_| HelperError::ChannelClosed)?;
        rx.await.map_err(|_| HelperError::ChannelClosed)
    }

    pub async fn network_restored(&self) -> Result<DrainOutcome, HelperError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::NetworkRestored { resp: tx })
            .await
            .map_err(|_| HelperError::ChannelClosed)?;
        rx.await.map_err(|_| HelperError::ChannelClosed)?
    }

    pub async fn network_lost(&self) -> Result<(), HelperError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::NetworkLost { resp: tx })
            .await
            .map_err(|_| HelperError::ChannelClosed)?;
        rx.await.map_err(|_| HelperError::ChannelClosed)
    }

    pub async fn shutdown(&self) -> Result<(), HelperError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| HelperError::ChannelClosed)?;
        rx.await.map_err(|_| HelperError::ChannelClosed)
    }
}

async fn handle_command(
    cmd: Command,
    session: &Arc<Mutex<Session>>,
    events_tx: &broadcast::Sender<DataEvent>,
) -> bool {
    match cmd {
        Command::FetchRestaurants { resp } => {
            let res = with_session(session, |s| s.fetch_restaurants())
                .await
                .and_then(|r| r.map_err(HelperError::from));
            let _ = resp.send(res);
        }
        Command::FetchRestaurant { id, resp } => {
            let res = with_session(session, move |s| s.fetch_restaurant_by_id(id))
                .await
                .and_then(|r| r.map_err(HelperError::from));
            let _ = resp.send(res);
        }
        Command::FetchReviews {
            restaurant_id,
            resp,
        } => {
            let res = with_session(session, move |s| {
                s.fetch_reviews_by_restaurant(restaurant_id)
            })
            .await
            .and_then(|r| r.map_err(HelperError::from));
            let _ = resp.send(res);
        }
        Command::Filter {
            cuisine,
            neighborhood,
            resp,
        } => {
            let res = with_session(session, move |s| {
                s.filter_by_cuisine_and_neighborhood(&cuisine, &neighborhood)
            })
            .await
            .and_then(|r| r.map_err(HelperError::from));
            let _ = resp.send(res);
        }
        Command::Neighborhoods { resp } => {
            let res = with_session(session, |s| s.neighborhoods())
                .await
                .and_then(|r| r.map_err(HelperError::from));
            let _ = resp.send(res);
        }
        Command::Cuisines { resp } => {
            let res = with_session(session, |s| s.cuisines())
                .await
                .and_then(|r| r.map_err(HelperError::from));
            let _ = resp.send(res);
        }
        Command::SetFavorite {
            id,
            is_favorite,
            resp,
        } => {
            let tx = events_tx.clone();
            let res = with_session(session, move |s| {
                let out = s.set_favorite(id, is_favorite);
                if let Ok(MutationOutcome::Applied(confirmed)) = &out {
                    let _ = tx.send(DataEvent::FavoriteChanged {
                        restaurant_id: confirmed.id,
                        is_favorite: confirmed.is_favorite,
                    });
                }
                out
            })
            .await
            .and_then(|r| r.map_err(HelperError::from));
            let _ = resp.send(res);
        }
        Command::AddReview { draft, resp } => {
            let tx = events_tx.clone();
            let res = with_session(session, move |s| {
                let out = s.add_review(draft);
                if let Ok(MutationOutcome::Applied(created)) = &out {
                    let _ = tx.send(DataEvent::ReviewAdded {
                        review: created.clone(),
                    });
                }
                out
            })
            .await
            .and_then(|r| r.map_err(HelperError::from));
            let _ = resp.send(res);
        }
        Command::SetViewing {
            restaurant_id,
            resp,
        } => {
            let _ = with_session(session, move |s| s.set_viewing(restaurant_id)).await;
            let _ = resp.send(());
        }
        Command::NetworkRestored { resp } => {
            let tx = events_tx.clone();
            let res = with_session(session, move |s| {
                let mut emit = |evt: DataEvent| {
                    let _ = tx.send(evt);
                };
                s.network_restored(&mut emit)
            })
            .await
            .and_then(|r| r.map_err(HelperError::from));
            let _ = resp.send(res);
        }
        Command::NetworkLost { resp } => {
            let tx = events_tx.clone();
            let _ = with_session(session, move |s| {
                let mut emit = |evt: DataEvent| {
                    let _ = tx.send(evt);
                };
                s.network_lost(&mut emit);
            })
            .await;
            let _ = resp.send(());
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}

async fn with_session<T, F>(session: &Arc<Mutex<Session>>, f: F) -> Result<T, HelperError>
where
    T: Send + 'static,
    F: FnOnce(&mut Session) -> T + Send + 'static,
{
    let session = Arc::clone(session);
    tokio::task::spawn_blocking(move || {
        let mut guard = session.blocking_lock();
        f(&mut guard)
    })
    .await
    .map_err(|err| HelperError::Runtime(format!("join error: {err}")))
}
