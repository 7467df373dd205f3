//! Client-side state: one store per entity kind, bundled in [`Stores`].

pub mod collection;
pub mod current_user;
pub mod derived;

pub use collection::Store;
pub use current_user::CurrentUser;
pub use derived::derive;

use std::sync::Arc;

use lunch_shared::{Boost, Place, Response, Roll, Room, Update};
use tokio::sync::watch;

use crate::ws::InboundHandler;

/// Every store the client keeps, passed around explicitly instead of living in globals.
#[derive(Clone)]
pub struct Stores {
    pub places: Store<Place>,
    pub rolls: Store<Roll>,
    pub boosts: Store<Boost>,
    pub rooms: Store<Room>,
    pub me: CurrentUser,
}

impl Default for Stores {
    fn default() -> Self {
        Self {
            places: Store::new(),
            rolls: Store::newest_first(),
            boosts: Store::newest_first(),
            rooms: Store::new(),
            me: CurrentUser::default(),
        }
    }
}

impl Stores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a typed update to the store that owns it.
    pub fn apply(&self, update: Update) {
        match update {
            Update::Places(places) => self.places.merge(places),
            Update::Rolls(rolls) => self.rolls.merge(rolls),
            Update::Boosts(boosts) => self.boosts.merge(boosts),
            Update::Rooms(rooms) => self.rooms.merge(rooms),
        }
    }

    /// Merge everything a server message carries. Error replies change nothing.
    pub fn apply_response(&self, response: &Response) {
        if let Some(error) = response.error_message() {
            crate::log_debug!("not merging error reply: {}", error);
            return;
        }
        for update in response.updates() {
            self.apply(update);
        }
    }

    /// A handler merging every inbound message into these stores, for
    /// [`crate::Transport::set_inbound_handler`].
    pub fn inbound_handler(&self) -> InboundHandler {
        let stores = self.clone();
        Arc::new(move |response: &Response| stores.apply_response(response))
    }

    // --- Derived views ---

    pub fn places_by_chance(&self) -> watch::Receiver<Vec<Place>> {
        derive(self.places.subscribe(), derived::places_by_chance)
    }

    pub fn rolls_newest_first(&self) -> watch::Receiver<Vec<Roll>> {
        derive(self.rolls.subscribe(), derived::rolls_newest_first)
    }

    pub fn boosts_newest_first(&self) -> watch::Receiver<Vec<Boost>> {
        derive(self.boosts.subscribe(), derived::boosts_newest_first)
    }

    pub fn rooms_oldest_first(&self) -> watch::Receiver<Vec<Room>> {
        derive(self.rooms.subscribe(), derived::rooms_oldest_first)
    }
}
