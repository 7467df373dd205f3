//! Entities exchanged with the lunch service.
//!
//! Every entity is an immutable value. Stores replace whole entities keyed by
//! [`Identified::key`], they never edit fields in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity used by stores to deduplicate incoming entities.
pub trait Identified {
    type Key: PartialEq;

    fn key(&self) -> Self::Key;
}

/// Entities carrying an event timestamp.
pub trait Timed {
    fn time(&self) -> DateTime<Utc>;
}

// --- Identity ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
}

impl Identified for User {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }
}

// --- Places ---

/// A location with a roll probability weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    /// Older servers call this `addedAt`.
    #[serde(alias = "addedAt")]
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub chance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Identified for Place {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl Timed for Place {
    fn time(&self) -> DateTime<Utc> {
        self.time
    }
}

// --- Events ---

/// A user rolled and landed on a place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Roll {
    pub place_id: String,
    pub user_id: String,
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<Place>,
}

/// One roll per (place, user); a newer roll on the same place replaces the older one.
impl Identified for Roll {
    type Key = (String, String);

    fn key(&self) -> Self::Key {
        (self.place_id.clone(), self.user_id.clone())
    }
}

impl Timed for Roll {
    fn time(&self) -> DateTime<Utc> {
        self.time
    }
}

/// A user boosted a place's roll chance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Boost {
    pub time: DateTime<Utc>,
    pub user_id: String,
    pub place_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<Place>,
}

impl Identified for Boost {
    type Key = (DateTime<Utc>, String, String);

    fn key(&self) -> Self::Key {
        (self.time, self.place_id.clone(), self.user_id.clone())
    }
}

impl Timed for Boost {
    fn time(&self) -> DateTime<Utc> {
        self.time
    }
}

// --- Rooms ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    pub time: DateTime<Utc>,
    pub user: User,
    #[serde(default)]
    pub members: Vec<User>,
}

impl Identified for Room {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl Timed for Room {
    fn time(&self) -> DateTime<Utc> {
        self.time
    }
}

// --- REST payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlackOAuthRequest {
    pub code: String,
    pub redirect_uri: String,
}
