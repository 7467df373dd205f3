//! The signed-in user, over REST.

use lunch_shared::{ApiError, User};
use serde_json::Value;

use crate::api_client::ApiClient;
use crate::stores::CurrentUser;

#[derive(Clone)]
pub struct UsersApi {
    client: ApiClient,
    me: CurrentUser,
}

impl UsersApi {
    pub fn new(client: ApiClient, me: CurrentUser) -> Self {
        Self { client, me }
    }

    pub fn me(&self) -> &CurrentUser {
        &self.me
    }

    /// Fetch the signed-in user.
    ///
    /// Not being signed in is not an error: a 401 yields `Ok(None)` and
    /// clears the current user.
    pub async fn get_me(&self) -> Result<Option<User>, ApiError> {
        match self.client.get_json::<User>("users/me").await {
            Ok(user) => {
                crate::log_info!("signed in as {} ({})", user.name, user.id);
                self.me.set(user.clone());
                Ok(Some(user))
            }
            Err(e) if e.is_unauthorized() => {
                crate::log_debug!("not signed in");
                self.me.clear();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// End the session; the server drops the cookie.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.client
            .post_json::<(), Value>("users/logout", None)
            .await?;
        self.me.clear();
        Ok(())
    }
}
