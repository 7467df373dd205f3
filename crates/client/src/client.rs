//! The client context: transport, stores and domain APIs wired together.

use std::sync::Arc;

use lunch_shared::{ApiError, Response};
use tokio::sync::{broadcast, watch};

use crate::api::{BoostsApi, OAuthApi, PlacesApi, RollsApi, RoomsApi, UsersApi};
use crate::api_client::ApiClient;
use crate::config::ClientConfig;
use crate::stores::Stores;
use crate::ws::{ConnectionState, Transport, WsTransport};

/// Everything a UI needs: one per signed-in session.
///
/// The transport hands every inbound message to [`Stores`] in arrival order,
/// replies and pushes alike, before any caller sees its reply.
pub struct LunchClient {
    pub places: PlacesApi,
    pub rolls: RollsApi,
    pub boosts: BoostsApi,
    pub rooms: RoomsApi,
    pub users: UsersApi,
    pub oauth: OAuthApi,
    stores: Stores,
    transport: Arc<dyn Transport>,
    connection_state: Option<watch::Receiver<ConnectionState>>,
}

impl LunchClient {
    /// Build a client talking to the endpoints in `config`. The WebSocket
    /// shares the REST client's cookies.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let rest = ApiClient::new(config.api_url.clone())?;
        let ws = WsTransport::new(config, Some(rest.cookies()));
        let connection_state = ws.state();

        let mut client = Self::with_transport(Arc::new(ws), rest);
        client.connection_state = Some(connection_state);
        Ok(client)
    }

    /// Build a client over any transport.
    pub fn with_transport(transport: Arc<dyn Transport>, rest: ApiClient) -> Self {
        let stores = Stores::new();
        transport.set_inbound_handler(stores.inbound_handler());

        Self {
            places: PlacesApi::new(transport.clone(), stores.places.clone()),
            rolls: RollsApi::new(transport.clone(), stores.rolls.clone()),
            boosts: BoostsApi::new(transport.clone(), stores.boosts.clone()),
            rooms: RoomsApi::new(transport.clone(), stores.rooms.clone()),
            users: UsersApi::new(rest.clone(), stores.me.clone()),
            oauth: OAuthApi::new(rest),
            stores,
            transport,
            connection_state: None,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Connect the WebSocket without issuing a request.
    pub async fn open(&self) -> Result<(), ApiError> {
        self.transport.open().await
    }

    /// Every inbound message, for callers that want to react to pushes directly.
    pub fn subscribe(&self) -> broadcast::Receiver<Response> {
        self.transport.subscribe()
    }

    /// Connection state of the built-in WebSocket transport.
    pub fn connection_state(&self) -> Option<watch::Receiver<ConnectionState>> {
        self.connection_state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use serde_json::json;

    fn client_with(transport: Arc<MockTransport>) -> LunchClient {
        let rest = ApiClient::new("http://127.0.0.1:9/api/").unwrap();
        LunchClient::with_transport(transport, rest)
    }

    #[tokio::test]
    async fn pushes_reach_the_stores() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(transport.clone());
        let mut places = client.stores().places.subscribe();

        transport.push(json!({
            "id": "another-client",
            "places": [{"id": "p1", "name": "Pho", "time": "2024-01-01T00:00:00Z", "chance": 1.0}]
        }));

        places.changed().await.unwrap();
        assert_eq!(places.borrow_and_update()[0].name, "Pho");
    }

    #[tokio::test]
    async fn boost_push_updates_boosts_and_places() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(transport.clone());
        let mut boosts = client.stores().boosts.subscribe();
        let mut places = client.stores().places.subscribe();

        transport.push(json!({
            "boosts": [{"time": "2024-01-01T00:00:00Z", "userId": "u1", "placeId": "p1"}],
            "places": [{"id": "p1", "name": "Pho", "time": "2024-01-01T00:00:00Z", "chance": 3.0}]
        }));

        places.changed().await.unwrap();
        boosts.changed().await.unwrap();
        assert_eq!(client.stores().places.snapshot()[0].chance, 3.0);
        assert_eq!(client.stores().boosts.len(), 1);
    }

    #[tokio::test]
    async fn derived_views_follow_pushes() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(transport.clone());
        let mut sorted = client.stores().places_by_chance();

        transport.push(json!({"places": [
            {"id": "p1", "name": "Tacos", "time": "2024-01-01T00:00:00Z", "chance": 1.0},
            {"id": "p2", "name": "Pho", "time": "2024-01-01T00:00:00Z", "chance": 2.0}
        ]}));

        sorted.changed().await.unwrap();
        let names: Vec<_> = sorted.borrow_and_update().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["Pho", "Tacos"]);
    }

    #[tokio::test]
    async fn mock_clients_have_no_connection_state() {
        let client = client_with(Arc::new(MockTransport::new()));
        assert!(client.connection_state().is_none());
    }
}
