//! Lunch Client
//!
//! Native client for the lunch service: places, rolls, boosts and rooms kept
//! in sync over a WebSocket, with REST for the session endpoints.
//!
//! ```rust,ignore
//! let client = LunchClient::new(&ClientConfig::from_env()?)?;
//! client.users.get_me().await?;
//! client.places.list().await?;
//!
//! let mut places = client.stores().places_by_chance();
//! while places.changed().await.is_ok() {
//!     for place in places.borrow_and_update().iter() {
//!         println!("{} {:.2}", place.name, place.chance);
//!     }
//! }
//! ```

pub mod api;
pub mod api_client;
pub mod client;
pub mod config;
pub mod logging;
pub mod stores;
pub mod ws;

pub use api_client::ApiClient;
pub use client::LunchClient;
pub use config::ClientConfig;
pub use stores::{Store, Stores};
pub use ws::{ConnectionState, InboundHandler, Transport, WsTransport};
