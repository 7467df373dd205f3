//! Boosts: raise a place's chance for the next roll.

use std::sync::Arc;

use lunch_shared::{ApiError, Boost, Method, Request};
use serde_json::json;

use super::{call, InFlight};
use crate::stores::Store;
use crate::ws::Transport;

#[derive(Clone)]
pub struct BoostsApi {
    transport: Arc<dyn Transport>,
    store: Store<Boost>,
    listing: Arc<InFlight>,
}

impl BoostsApi {
    pub fn new(transport: Arc<dyn Transport>, store: Store<Boost>) -> Self {
        Self {
            transport,
            store,
            listing: Arc::new(InFlight::new()),
        }
    }

    pub fn store(&self) -> &Store<Boost> {
        &self.store
    }

    pub async fn list(&self) -> Result<(), ApiError> {
        let transport = self.transport.clone();
        self.listing
            .run(move || async move {
                call(transport.as_ref(), Request::new(Method::BoostsList)).await
            })
            .await
    }

    /// Boost `place_id`. The reply also carries the re-weighted places, which
    /// reach the places store through the inbound handler.
    pub async fn create(&self, place_id: &str) -> Result<(), ApiError> {
        let request = Request::with_params(Method::BoostsCreate, json!({ "placeId": place_id }));
        call(self.transport.as_ref(), request).await
    }
}
