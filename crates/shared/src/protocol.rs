//! WebSocket wire protocol.
//!
//! Requests go out as `{id, method, params?}`. Replies and unsolicited pushes
//! share one shape, `{id?, error?, places?, rolls?, boosts?, rooms?}`; a push
//! is any message whose `id` matches no pending request.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::models::{Boost, Place, Roll, Room};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Method {
    #[serde(rename = "places/list")]
    PlacesList,
    #[serde(rename = "places/create")]
    PlacesCreate,
    #[serde(rename = "rolls/list")]
    RollsList,
    #[serde(rename = "rolls/create")]
    RollsCreate,
    #[serde(rename = "boosts/list")]
    BoostsList,
    #[serde(rename = "boosts/create")]
    BoostsCreate,
    #[serde(rename = "rooms/list")]
    RoomsList,
    #[serde(rename = "rooms/create")]
    RoomsCreate,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::PlacesList => "places/list",
            Method::PlacesCreate => "places/create",
            Method::RollsList => "rolls/list",
            Method::RollsCreate => "rolls/create",
            Method::BoostsList => "boosts/list",
            Method::BoostsCreate => "boosts/create",
            Method::RoomsList => "rooms/list",
            Method::RoomsCreate => "rooms/create",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request before the transport assigns it a correlation id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(method: Method) -> Self {
        Self { method, params: None }
    }

    pub fn with_params(method: Method, params: Value) -> Self {
        Self {
            method,
            params: Some(params),
        }
    }
}

/// The request as it goes on the wire, with its correlation id attached.
#[derive(Debug, Serialize)]
struct RequestEnvelope<'a> {
    id: &'a str,
    #[serde(flatten)]
    request: &'a Request,
}

/// Serialize `request` to JSON with `id` attached as the correlation id.
pub fn attach_request_id(request: &Request, id: &str) -> Result<String, ApiError> {
    serde_json::to_string(&RequestEnvelope { id, request })
        .map_err(|e| ApiError::Serialize(format!("{}: {e}", request.method)))
}

/// Read the correlation id of an inbound message, if it has one.
pub fn extract_request_id(message: &Value) -> Option<&str> {
    message.get("id").and_then(Value::as_str).filter(|id| !id.is_empty())
}

/// A reply or push from the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub places: Vec<Place>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rolls: Vec<Roll>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub boosts: Vec<Boost>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rooms: Vec<Room>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn collection<T: DeserializeOwned>(message: &Value, key: &str, errors: &mut Vec<ApiError>) -> Vec<T> {
    match message.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(items) => Vec::<T>::deserialize(items).unwrap_or_else(|e| {
            errors.push(ApiError::Deserialize(format!("{key}: {e}")));
            Vec::new()
        }),
    }
}

/// Typed fan-out of a server message, one variant per store.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Places(Vec<Place>),
    Rolls(Vec<Roll>),
    Boosts(Vec<Boost>),
    Rooms(Vec<Room>),
}

impl Response {
    /// Decode `message` one collection at a time. A malformed entity costs only
    /// the collection it sits in; the failures are returned alongside.
    pub fn decode_each(message: &Value) -> (Self, Vec<ApiError>) {
        let text = |key: &str| message.get(key).and_then(Value::as_str).map(str::to_string);
        let mut errors = Vec::new();
        let response = Self {
            id: text("id"),
            error: text("error"),
            places: collection(message, "places", &mut errors),
            rolls: collection(message, "rolls", &mut errors),
            boosts: collection(message, "boosts", &mut errors),
            rooms: collection(message, "rooms", &mut errors),
        };
        (response, errors)
    }

    /// Server-reported errors are empty strings when absent on some servers.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    /// Turn an application-level `{error}` into [`ApiError::Server`].
    pub fn into_result(self) -> Result<Self, ApiError> {
        match self.error_message() {
            Some(message) => Err(ApiError::Server(message.to_string())),
            None => Ok(self),
        }
    }

    /// Split the message into per-store updates, skipping empty collections.
    pub fn updates(&self) -> Vec<Update> {
        let mut updates = Vec::new();
        if !self.places.is_empty() {
            updates.push(Update::Places(self.places.clone()));
        }
        if !self.rolls.is_empty() {
            updates.push(Update::Rolls(self.rolls.clone()));
        }
        if !self.boosts.is_empty() {
            updates.push(Update::Boosts(self.boosts.clone()));
        }
        if !self.rooms.is_empty() {
            updates.push(Update::Rooms(self.rooms.clone()));
        }
        updates
    }
}
