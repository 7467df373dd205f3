//! Client configuration from environment variables.

use std::time::Duration;

use lunch_shared::ApiError;
use url::Url;

use crate::ws::ReconnectConfig;

pub const DEFAULT_API_URL: &str = "https://localhost:8000/api/";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Endpoints and transport tuning for a [`crate::LunchClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API; paths like `users/me` are joined onto it.
    pub api_url: String,
    /// WebSocket endpoint.
    pub ws_url: String,
    pub reconnect: ReconnectConfig,
    /// `None` waits for replies indefinitely.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Build a config for `api_url`, deriving the WebSocket URL from it.
    pub fn new(api_url: impl Into<String>) -> Result<Self, ApiError> {
        let api_url = api_url.into();
        let ws_url = ws_url_for_api(&api_url)?;
        Ok(Self {
            api_url,
            ws_url,
            reconnect: ReconnectConfig::default(),
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        })
    }

    /// Parse configuration from environment variables.
    ///
    /// Environment variables:
    /// - `LUNCH_API_URL`: REST base URL (default: "https://localhost:8000/api/")
    /// - `LUNCH_WS_URL`: WebSocket URL (default: `LUNCH_API_URL` with a ws scheme, joined with "ws")
    /// - `LUNCH_REQUEST_TIMEOUT_SECS`: reply timeout, 0 disables it (default: 30)
    /// - `LUNCH_RECONNECT_MAX_ATTEMPTS`: 0 retries forever (default: 10)
    pub fn from_env() -> Result<Self, ApiError> {
        let api_url =
            std::env::var("LUNCH_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(api_url)?;

        if let Ok(ws_url) = std::env::var("LUNCH_WS_URL") {
            config.ws_url = ws_url;
        }

        if let Some(secs) = env_number::<u64>("LUNCH_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(max_attempts) = env_number::<u32>("LUNCH_RECONNECT_MAX_ATTEMPTS") {
            config.reconnect.max_attempts = max_attempts;
        }

        Ok(config)
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            crate::log_warn!("ignoring {}: not a number: {:?}", key, raw);
            None
        }
    }
}

/// Convert an HTTP/HTTPS API base into the WebSocket endpoint under it.
pub fn ws_url_for_api(api_url: &str) -> Result<String, ApiError> {
    let mut base = Url::parse(api_url)
        .map_err(|e| ApiError::Network(format!("invalid API URL {api_url:?}: {e}")))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    let scheme = match base.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => {
            return Err(ApiError::Network(format!(
                "unsupported API URL scheme {other:?}"
            )))
        }
    };

    let mut ws = base
        .join("ws")
        .map_err(|e| ApiError::Network(format!("invalid WebSocket URL: {e}")))?;
    ws.set_scheme(scheme)
        .map_err(|_| ApiError::Network(format!("cannot switch {api_url:?} to {scheme}")))?;
    Ok(ws.to_string())
}
