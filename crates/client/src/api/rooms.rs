//! Rooms and their members.

use std::sync::Arc;

use lunch_shared::{ApiError, Method, Request, Room};
use serde_json::json;

use super::{call, InFlight};
use crate::stores::Store;
use crate::ws::Transport;

#[derive(Clone)]
pub struct RoomsApi {
    transport: Arc<dyn Transport>,
    store: Store<Room>,
    listing: Arc<InFlight>,
}

impl RoomsApi {
    pub fn new(transport: Arc<dyn Transport>, store: Store<Room>) -> Self {
        Self {
            transport,
            store,
            listing: Arc::new(InFlight::new()),
        }
    }

    pub fn store(&self) -> &Store<Room> {
        &self.store
    }

    pub async fn list(&self) -> Result<(), ApiError> {
        let transport = self.transport.clone();
        self.listing
            .run(move || async move {
                call(transport.as_ref(), Request::new(Method::RoomsList)).await
            })
            .await
    }

    pub async fn create(&self, name: &str) -> Result<(), ApiError> {
        let request = Request::with_params(Method::RoomsCreate, json!({ "name": name }));
        call(self.transport.as_ref(), request).await
    }
}
