//! Request/response correlation over the reconnecting WebSocket.
//!
//! Each outgoing request gets a fresh UUID in its `id` field and a oneshot
//! waiter in the pending map. Every inbound message first goes through the
//! installed [`InboundHandler`], in arrival order. Only then is the waiter
//! whose id it echoes resolved and the message broadcast to subscribers, so a
//! caller resuming after its reply never races a later push.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_channel::mpsc::{unbounded, UnboundedSender};
use lunch_shared::{attach_request_id, extract_request_id, ApiError, Request, Response};
use reqwest::cookie::{CookieStore, Jar};
use serde_json::Value;
use tokio::sync::{broadcast, oneshot, watch, Mutex as AsyncMutex};
use tokio_tungstenite::tungstenite::{
    client::IntoClientRequest, handshake::client::Request as HandshakeRequest, http::header::COOKIE,
};
use url::Url;
use uuid::Uuid;

use super::connection::{
    ConnectionParts, ConnectionState, OutgoingFrame, OutgoingQueue, ReconnectConfig, WsConnection,
};
use crate::config::ClientConfig;

const INBOUND_CAPACITY: usize = 256;

/// Sees every inbound message before its caller or any subscriber does.
pub type InboundHandler = Arc<dyn Fn(&Response) + Send + Sync>;

/// A request/response channel to the lunch service.
///
/// Domain modules only talk to this trait, so they can be driven by a mock in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish the connection. Resolves once it is ready; calls made while
    /// connected resolve immediately.
    async fn open(&self) -> Result<(), ApiError>;

    /// Send `request` and wait for the reply carrying the same correlation id.
    ///
    /// The inbound handler has already seen the reply when this resolves.
    async fn request(&self, request: Request) -> Result<Response, ApiError>;

    /// Install the handler run on every inbound message, replacing any previous one.
    fn set_inbound_handler(&self, handler: InboundHandler);

    /// Every inbound message, including replies to other callers and pushes.
    fn subscribe(&self) -> broadcast::Receiver<Response>;
}

type Waiter = oneshot::Sender<Result<Response, ApiError>>;
type PendingMap = Arc<Mutex<HashMap<String, Waiter>>>;
type HandlerSlot = Arc<Mutex<Option<InboundHandler>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// WebSocket-backed [`Transport`]. Cheap to clone; the connection stops when
/// the last clone is dropped.
#[derive(Clone)]
pub struct WsTransport {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    cookies: Option<Arc<Jar>>,
    reconnect: ReconnectConfig,
    request_timeout: Option<Duration>,
    sender: UnboundedSender<OutgoingFrame>,
    /// Survives a loop that gave up, so the next one picks up where it left off.
    outgoing: OutgoingQueue,
    state: Arc<watch::Sender<ConnectionState>>,
    connection: Mutex<Option<WsConnection>>,
    pending: PendingMap,
    handler: HandlerSlot,
    inbound: broadcast::Sender<Response>,
}

impl WsTransport {
    /// Create a transport for `config.ws_url`. Nothing connects until [`Transport::open`].
    ///
    /// `cookies` is the REST client's jar; its cookies for the endpoint are sent
    /// with every handshake so the socket shares the HTTP session.
    pub fn new(config: &ClientConfig, cookies: Option<Arc<Jar>>) -> Self {
        let (sender, receiver) = unbounded();
        let (inbound, _) = broadcast::channel(INBOUND_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                url: config.ws_url.clone(),
                cookies,
                reconnect: config.reconnect.clone(),
                request_timeout: config.request_timeout,
                sender,
                outgoing: Arc::new(AsyncMutex::new(receiver)),
                state: Arc::new(watch::channel(ConnectionState::Disconnected).0),
                connection: Mutex::new(None),
                pending: Arc::new(Mutex::new(HashMap::new())),
                handler: Arc::new(Mutex::new(None)),
                inbound,
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Observe the connection state.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Number of requests still waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        lock(&self.inner.pending).len()
    }

    /// Spawn the connection loop unless one is alive. A loop that gave up is replaced.
    fn ensure_running(&self) {
        let mut connection = lock(&self.inner.connection);
        let alive = connection.as_ref().is_some_and(|c| !c.is_finished())
            && !self.inner.state.borrow().is_failed();
        if alive {
            return;
        }
        if connection.is_some() {
            crate::log_info!("Restarting connection to {}", self.inner.url);
        }

        let url = self.inner.url.clone();
        let cookies = self.inner.cookies.clone();
        let pending_for_message = self.inner.pending.clone();
        let pending_for_close = self.inner.pending.clone();
        let pending_for_send = self.inner.pending.clone();
        let handler = self.inner.handler.clone();
        let inbound = self.inner.inbound.clone();

        // Waiters of open() must not see the previous loop's Failed.
        self.inner.state.send_replace(ConnectionState::Connecting);
        *connection = Some(WsConnection::spawn(ConnectionParts {
            host: url.clone(),
            state: self.inner.state.clone(),
            outgoing: self.inner.outgoing.clone(),
            request_builder: Arc::new(move || handshake_request(&url, cookies.as_deref())),
            on_message: Arc::new(move |text: &str| {
                handle_inbound(text, &pending_for_message, &handler, &inbound)
            }),
            on_close: Arc::new(move || fail_pending(&pending_for_close)),
            is_awaited: Arc::new(move |id: &str| lock(&pending_for_send).contains_key(id)),
            reconnect: self.inner.reconnect.clone(),
        }));
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self) -> Result<(), ApiError> {
        if self.inner.state.borrow().is_connected() {
            return Ok(());
        }
        self.ensure_running();

        let mut state = self.state();
        let reached = state
            .wait_for(|s| s.is_connected() || s.is_failed())
            .await
            .map(|s| (*s).clone())
            .map_err(|_| ApiError::ConnectionClosed)?;

        match reached {
            ConnectionState::Failed { reason } => Err(ApiError::Network(reason)),
            _ => Ok(()),
        }
    }

    async fn request(&self, request: Request) -> Result<Response, ApiError> {
        let id = Uuid::new_v4().to_string();
        let text = attach_request_id(&request, &id)?;

        let (tx, rx) = oneshot::channel();
        lock(&self.inner.pending).insert(id.clone(), tx);
        let _pending = PendingGuard {
            pending: self.inner.pending.clone(),
            id: id.clone(),
        };

        self.inner
            .sender
            .unbounded_send(OutgoingFrame { id, text })
            .map_err(|e| ApiError::Network(format!("failed to send {}: {}", request.method, e)))?;

        let reply = match self.inner.request_timeout {
            Some(limit) => tokio::time::timeout(limit, rx).await.map_err(|_| {
                crate::log_warn!("{} timed out after {:?}", request.method, limit);
                ApiError::Timeout {
                    method: request.method.to_string(),
                }
            })?,
            None => rx.await,
        };

        reply.map_err(|_| ApiError::ConnectionClosed)?
    }

    fn set_inbound_handler(&self, handler: InboundHandler) {
        *lock(&self.inner.handler) = Some(handler);
    }

    fn subscribe(&self) -> broadcast::Receiver<Response> {
        self.inner.inbound.subscribe()
    }
}

/// Removes a request's waiter when the caller stops waiting (reply, timeout or drop).
struct PendingGuard {
    pending: PendingMap,
    id: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        lock(&self.pending).remove(&self.id);
    }
}

fn handle_inbound(
    text: &str,
    pending: &PendingMap,
    handler: &HandlerSlot,
    inbound: &broadcast::Sender<Response>,
) {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            crate::log_error!("Failed to parse message: {}", e);
            return;
        }
    };

    let (response, errors) = Response::decode_each(&value);
    for e in &errors {
        crate::log_error!("Failed to decode message: {}", e);
    }

    let handler = lock(handler).clone();
    if let Some(handler) = handler {
        handler(&response);
    }

    let id = extract_request_id(&value);
    match id.and_then(|id| lock(pending).remove(id)) {
        Some(waiter) => {
            let result = match errors.into_iter().next() {
                Some(e) => Err(e),
                None => Ok(response.clone()),
            };
            let _ = waiter.send(result);
        }
        None => crate::log_debug!("Push without a pending request (id {:?})", id),
    }

    // No subscribers is fine.
    let _ = inbound.send(response);
}

/// Reject everything in flight; replies sent on a dead socket never arrive.
fn fail_pending(pending: &PendingMap) {
    let waiters: Vec<Waiter> = lock(pending).drain().map(|(_, waiter)| waiter).collect();
    if !waiters.is_empty() {
        crate::log_warn!("Connection lost with {} request(s) in flight", waiters.len());
    }
    for waiter in waiters {
        let _ = waiter.send(Err(ApiError::ConnectionClosed));
    }
}

fn handshake_request(url: &str, cookies: Option<&Jar>) -> Result<HandshakeRequest, String> {
    let mut request = url.into_client_request().map_err(|e| e.to_string())?;
    if let Some(jar) = cookies {
        if let Some(cookie) = jar.cookies(&cookie_url(url)?) {
            request.headers_mut().insert(COOKIE, cookie);
        }
    }
    Ok(request)
}

/// Cookies are scoped to http(s) origins; look them up under the matching scheme.
fn cookie_url(ws_url: &str) -> Result<Url, String> {
    let mut url = Url::parse(ws_url).map_err(|e| e.to_string())?;
    let scheme = match url.scheme() {
        "wss" => "https",
        "ws" => "http",
        _ => return Ok(url),
    };
    url.set_scheme(scheme)
        .map_err(|_| format!("cannot map {ws_url} to {scheme}"))?;
    Ok(url)
}
