//! WebSocket transport for the lunch service.
//!
//! - [`connection`]: the reconnecting socket loop and its observable state
//! - [`transport`]: id-correlated requests and the inbound broadcast
//!
//! ```text
//!  PlacesApi  RollsApi  BoostsApi  RoomsApi
//!       │         │         │         │        request(..) ─┐
//!       └─────────┴────┬────┴─────────┘                     │
//!                      ▼                                    ▼
//!               ┌─────────────┐   pending map (id → waiter)
//!               │ WsTransport │───────────────────────────────
//!               └─────────────┘
//!                      │ every inbound message, in arrival order
//!                      ▼
//!      InboundHandler (Stores::apply_response) ──▶ waiter ──▶ broadcast
//! ```

mod connection;
mod transport;

pub use connection::{ConnectionState, ReconnectConfig};
pub use transport::{InboundHandler, Transport, WsTransport};
