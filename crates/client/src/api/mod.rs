//! Domain API modules, one per resource.
//!
//! The WebSocket-backed modules share one shape: `list()` (deduplicated while
//! in flight) and `create(..)` send a request and reject on a server
//! `{error}`. They never merge replies themselves: the transport's inbound
//! handler (see [`crate::Stores::inbound_handler`]) has merged every reply,
//! in arrival order, by the time the call returns. `users` and `oauth` go
//! over REST.

pub mod boosts;
pub mod inflight;
pub mod oauth;
pub mod places;
pub mod rolls;
pub mod rooms;
pub mod users;

pub use boosts::BoostsApi;
pub use inflight::InFlight;
pub use oauth::OAuthApi;
pub use places::PlacesApi;
pub use rolls::RollsApi;
pub use rooms::RoomsApi;
pub use users::UsersApi;

use lunch_shared::{ApiError, Request};

use crate::ws::Transport;

/// Open the transport, send `request`, and surface a server `{error}` as [`ApiError::Server`].
pub(crate) async fn call(transport: &dyn Transport, request: Request) -> Result<(), ApiError> {
    transport.open().await?;
    let method = request.method;
    match transport.request(request).await?.into_result() {
        Ok(_) => Ok(()),
        Err(e) => {
            crate::log_warn!("{} failed: {}", method, e);
            Err(e)
        }
    }
}
