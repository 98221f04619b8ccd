use crate::{
    record::{Restaurant, Review, ReviewDraft},
    types::RestaurantId,
};

use super::{RemoteApi, RemoteResult};

/// Blocking HTTP client for the restaurant review service.
pub struct HttpRemote {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpRemote {
    /// Builds a client against `base_url`, e.g. `http://localhost:1337`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl RemoteApi for HttpRemote {
    fn fetch_restaurants(&mut self) -> RemoteResult<Vec<Restaurant>> {
        let url = format!("{}/restaurants", self.base_url);
        Ok(self.client.get(url).send()?.error_for_status()?.json()?)
    }

    fn fetch_restaurant_by_id(&mut self, id: RestaurantId) -> RemoteResult<Restaurant> {
        let url = format!("{}/restaurants/{id}", self.base_url);
        Ok(self.client.get(url).send()?.error_for_status()?.json()?)
    }

    fn fetch_reviews_by_restaurant(&mut self, id: RestaurantId) -> RemoteResult<Vec<Review>> {
        let url = format!("{}/reviews/?restaurant_id={id}", self.base_url);
        Ok(self.client.get(url).send()?.error_for_status()?.json()?)
    }

    fn update_favorite(
        &mut self,
        id: RestaurantId,
        is_favorite: bool,
    ) -> RemoteResult<Restaurant> {
        let url = format!("{}/restaurants/{id}/?is_favorite={is_favorite}", self.base_url);
        Ok(self.client.put(url).send()?.error_for_status()?.json()?)
    }

    fn create_review(&mut self, draft: &ReviewDraft) -> RemoteResult<Review> {
        let url = format!("{}/reviews/", self.base_url);
        Ok(self
            .client
            .post(url)
            .json(draft)
            .send()?
            .error_for_status()?
            .json()?)
    }
}
