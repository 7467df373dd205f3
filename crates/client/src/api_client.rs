//! HTTP API client for the cookie-authenticated REST endpoints.

use std::sync::Arc;

use lunch_shared::ApiError;
use reqwest::cookie::Jar;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// HTTP client sharing one cookie jar across every request.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    cookies: Arc<Jar>,
}

impl ApiClient {
    /// Create a new API client with an empty cookie jar
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_cookies(base_url, Arc::new(Jar::default()))
    }

    /// Create a client that stores session cookies in `cookies`
    pub fn with_cookies(base_url: impl Into<String>, cookies: Arc<Jar>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_provider(cookies.clone())
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            cookies,
        })
    }

    /// The jar holding the session cookie, shared with the WebSocket handshake.
    pub fn cookies(&self) -> Arc<Jar> {
        self.cookies.clone()
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Make a GET request
    pub async fn get_json<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        let url = self.url(path);
        crate::log_debug!("GET {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let text = read_success_body(resp).await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Deserialize(e.to_string()))
    }

    /// Make a POST request with an optional JSON body. An empty reply decodes as `{}`.
    pub async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&TReq>,
    ) -> Result<TRes, ApiError> {
        let url = self.url(path);
        crate::log_debug!("POST {}", url);

        let mut rb = self.client.post(&url);
        if let Some(body) = body {
            let body_bytes = serde_json::to_vec(body)
                .map_err(|e| ApiError::Serialize(format!("{path}: {e}")))?;
            rb = rb
                .body(body_bytes)
                .header("Content-Type", "application/json");
        }

        let resp = rb
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let text = read_success_body(resp).await?;
        if text.is_empty() {
            serde_json::from_str("{}").map_err(|e| ApiError::Deserialize(e.to_string()))
        } else {
            serde_json::from_str(&text).map_err(|e| ApiError::Deserialize(e.to_string()))
        }
    }
}

/// Anything but 200 is an error, carrying the status and body.
async fn read_success_body(resp: reqwest::Response) -> Result<String, ApiError> {
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

    if status != StatusCode::OK {
        return Err(ApiError::Http {
            status: status.as_u16(),
            body: text,
        });
    }
    Ok(text)
}
