//! The signed-in user, if any.

use std::sync::Arc;

use lunch_shared::User;
use tokio::sync::watch;

#[derive(Clone)]
pub struct CurrentUser {
    tx: Arc<watch::Sender<Option<User>>>,
}

impl Default for CurrentUser {
    fn default() -> Self {
        Self {
            tx: Arc::new(watch::channel(None).0),
        }
    }
}

impl CurrentUser {
    pub fn get(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    pub fn set(&self, user: User) {
        self.tx.send_replace(Some(user));
    }

    /// Forget the user (on logout)
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.tx.subscribe()
    }
}
