//! Rolls: the history of who landed where, newest first.

use std::sync::Arc;

use lunch_shared::{ApiError, Method, Request, Roll};

use super::{call, InFlight};
use crate::stores::Store;
use crate::ws::Transport;

#[derive(Clone)]
pub struct RollsApi {
    transport: Arc<dyn Transport>,
    store: Store<Roll>,
    listing: Arc<InFlight>,
}

impl RollsApi {
    /// `store` is the newest-first rolls store the inbound handler merges into.
    pub fn new(transport: Arc<dyn Transport>, store: Store<Roll>) -> Self {
        Self {
            transport,
            store,
            listing: Arc::new(InFlight::new()),
        }
    }

    pub fn store(&self) -> &Store<Roll> {
        &self.store
    }

    pub async fn list(&self) -> Result<(), ApiError> {
        let transport = self.transport.clone();
        self.listing
            .run(move || async move {
                call(transport.as_ref(), Request::new(Method::RollsList)).await
            })
            .await
    }

    /// Roll for a place; the server picks it.
    pub async fn create(&self) -> Result<(), ApiError> {
        call(self.transport.as_ref(), Request::new(Method::RollsCreate)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{with_stores, MockTransport};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn roll_json(place_id: &str, user_id: &str, time: &str) -> serde_json::Value {
        json!({
            "placeId": place_id,
            "userId": user_id,
            "time": time,
            "place": {"id": place_id, "name": "Pho", "time": "2023-01-01T00:00:00Z", "chance": 1.0},
            "user": {"id": user_id, "name": "ann"}
        })
    }

    #[tokio::test]
    async fn create_stores_exactly_the_returned_roll() {
        let (transport, stores) = with_stores(MockTransport::new().reply(json!({
            "rolls": [roll_json("p1", "u1", "2024-01-01T00:00:00Z")]
        })));
        let api = RollsApi::new(transport.clone(), stores.rolls.clone());

        api.create().await.unwrap();

        let rolls = api.store().snapshot();
        assert_eq!(rolls.len(), 1);
        assert_eq!(rolls[0].place_id, "p1");
        assert_eq!(rolls[0].user_id, "u1");
        assert_eq!(rolls[0].time, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(rolls[0].place.as_ref().unwrap().name, "Pho");
        assert_eq!(transport.requests()[0].method, Method::RollsCreate);
        assert_eq!(transport.requests()[0].params, None);
    }

    #[tokio::test]
    async fn rolls_stay_newest_first_across_list_and_create() {
        let (transport, stores) = with_stores(
            MockTransport::new()
                .reply(json!({"rolls": [
                    roll_json("p1", "u1", "2024-01-01T10:00:00Z"),
                    roll_json("p2", "u2", "2024-01-03T10:00:00Z"),
                    roll_json("p3", "u1", "2024-01-02T10:00:00Z")
                ]}))
                .reply(json!({"rolls": [roll_json("p4", "u3", "2024-01-02T12:00:00Z")]})),
        );
        let api = RollsApi::new(transport, stores.rolls.clone());

        api.list().await.unwrap();
        api.create().await.unwrap();

        let places: Vec<_> = api.store().snapshot().into_iter().map(|r| r.place_id).collect();
        assert_eq!(places, vec!["p2", "p4", "p3", "p1"]);
    }

    #[tokio::test]
    async fn same_place_and_user_replaces_previous_roll() {
        let (transport, stores) = with_stores(
            MockTransport::new()
                .reply(json!({"rolls": [roll_json("p1", "u1", "2024-01-01T10:00:00Z")]}))
                .reply(json!({"rolls": [roll_json("p1", "u1", "2024-01-05T10:00:00Z")]})),
        );
        let api = RollsApi::new(transport, stores.rolls.clone());

        api.list().await.unwrap();
        api.create().await.unwrap();

        let rolls = api.store().snapshot();
        assert_eq!(rolls.len(), 1);
        assert_eq!(rolls[0].time, Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn no_points_left_is_reported() {
        let (transport, stores) =
            with_stores(MockTransport::new().reply(json!({"error": "no points left"})));
        let api = RollsApi::new(transport, stores.rolls.clone());

        assert_eq!(
            api.create().await,
            Err(ApiError::Server("no points left".into()))
        );
        assert!(api.store().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let (transport, stores) =
            with_stores(MockTransport::new().fail(ApiError::ConnectionClosed));
        let api = RollsApi::new(transport, stores.rolls.clone());

        assert_eq!(api.list().await, Err(ApiError::ConnectionClosed));
    }
}
