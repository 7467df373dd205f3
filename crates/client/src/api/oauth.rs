//! OAuth sign-in.

use lunch_shared::{ApiError, SlackOAuthRequest};
use serde_json::Value;

use crate::api_client::ApiClient;

#[derive(Clone)]
pub struct OAuthApi {
    client: ApiClient,
}

impl OAuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchange a Slack authorization code for a session cookie.
    pub async fn slack(&self, code: &str, redirect_uri: &str) -> Result<(), ApiError> {
        let body = SlackOAuthRequest {
            code: code.to_string(),
            redirect_uri: redirect_uri.to_string(),
        };
        self.client
            .post_json::<_, Value>("oauth/slack", Some(&body))
            .await?;
        Ok(())
    }
}
