//! Places: list them and add new ones.

use std::sync::Arc;

use lunch_shared::{ApiError, Method, Place, Request};
use serde_json::json;

use super::{call, InFlight};
use crate::stores::Store;
use crate::ws::Transport;

#[derive(Clone)]
pub struct PlacesApi {
    transport: Arc<dyn Transport>,
    store: Store<Place>,
    listing: Arc<InFlight>,
}

impl PlacesApi {
    pub fn new(transport: Arc<dyn Transport>, store: Store<Place>) -> Self {
        Self {
            transport,
            store,
            listing: Arc::new(InFlight::new()),
        }
    }

    pub fn store(&self) -> &Store<Place> {
        &self.store
    }

    /// Fetch every place. Concurrent calls share a single request.
    pub async fn list(&self) -> Result<(), ApiError> {
        let transport = self.transport.clone();
        self.listing
            .run(move || async move {
                call(transport.as_ref(), Request::new(Method::PlacesList)).await
            })
            .await
    }

    pub async fn create(&self, name: &str) -> Result<(), ApiError> {
        let request = Request::with_params(Method::PlacesCreate, json!({ "name": name }));
        call(self.transport.as_ref(), request).await
    }
}
