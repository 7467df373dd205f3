//! WebSocket connection with state tracking and auto-reconnect.

use std::sync::Arc;

use futures_channel::mpsc::UnboundedReceiver;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{handshake::client::Request as HandshakeRequest, Message},
};

/// Connection state for a WebSocket
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Failed { reason: String },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ConnectionState::Failed { .. })
    }
}

/// Configuration for auto-reconnect behavior
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of reconnect attempts (0 = infinite)
    pub max_attempts: u32,
    /// Initial delay in milliseconds
    pub initial_delay_ms: u32,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u32,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 1.5,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for a given attempt number
    pub fn delay_for_attempt(&self, attempt: u32) -> u32 {
        let delay = self.initial_delay_ms as f32 * self.backoff_multiplier.powi(attempt as i32);
        (delay as u32).min(self.max_delay_ms)
    }
}

pub(crate) type RequestBuilder = Arc<dyn Fn() -> Result<HandshakeRequest, String> + Send + Sync>;
pub(crate) type MessageHandler = Arc<dyn Fn(&str) + Send + Sync>;
pub(crate) type CloseHandler = Arc<dyn Fn() + Send + Sync>;
pub(crate) type AwaitedCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A serialized request waiting to be written, tagged with its correlation id.
#[derive(Debug)]
pub(crate) struct OutgoingFrame {
    pub id: String,
    pub text: String,
}

/// Queue of frames shared by successive connection loops.
pub(crate) type OutgoingQueue = Arc<AsyncMutex<UnboundedReceiver<OutgoingFrame>>>;

/// Everything the background loop owns.
pub(crate) struct ConnectionParts {
    pub host: String,
    pub state: Arc<watch::Sender<ConnectionState>>,
    /// Held for the lifetime of the loop.
    pub outgoing: OutgoingQueue,
    /// Called on each reconnect attempt.
    pub request_builder: RequestBuilder,
    pub on_message: MessageHandler,
    /// Called whenever a live connection is lost or the loop gives up.
    pub on_close: CloseHandler,
    /// Frames whose caller stopped waiting are dropped instead of written.
    pub is_awaited: AwaitedCheck,
    pub reconnect: ReconnectConfig,
}

/// A managed WebSocket connection. The background loop stops when this is dropped.
pub(crate) struct WsConnection {
    task: JoinHandle<()>,
}

impl WsConnection {
    pub(crate) fn spawn(parts: ConnectionParts) -> Self {
        Self {
            task: tokio::spawn(connection_loop(parts)),
        }
    }

    /// The loop returned, either after giving up or because nobody can send anymore.
    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        self.task.abort();
    }
}

enum Closed {
    /// The socket went away; reconnect.
    Remote,
    /// Every sender is gone, nobody can issue requests anymore.
    SendersGone,
}

async fn connection_loop(parts: ConnectionParts) {
    let ConnectionParts {
        host,
        state,
        outgoing,
        request_builder,
        on_message,
        on_close,
        is_awaited,
        reconnect,
    } = parts;

    let mut outgoing = outgoing.lock_owned().await;
    let mut attempt = 0u32;

    loop {
        let request = match request_builder() {
            Ok(request) => request,
            Err(reason) => {
                crate::log_error!("Cannot build WebSocket request for {}: {}", host, reason);
                state.send_replace(ConnectionState::Failed { reason });
                on_close();
                return;
            }
        };

        if attempt == 0 {
            state.send_replace(ConnectionState::Connecting);
        } else {
            state.send_replace(ConnectionState::Reconnecting { attempt });
        }

        match connect_async(request).await {
            Ok((ws_stream, _response)) => {
                state.send_replace(ConnectionState::Connected);
                attempt = 0;
                crate::log_info!("WebSocket connected to {}", host);

                let (mut write, mut read) = ws_stream.split();

                let reading = async {
                    while let Some(frame) = read.next().await {
                        match frame {
                            Ok(Message::Text(text)) => {
                                crate::log_debug!("WebSocket received: {}", text.as_str());
                                on_message(text.as_str());
                            }
                            Ok(Message::Close(_)) => {
                                crate::log_info!("WebSocket to {} received close frame", host);
                                break;
                            }
                            Ok(_) => {
                                // Pings are answered by tungstenite; binary frames are not part of the protocol.
                            }
                            Err(e) => {
                                crate::log_error!("WebSocket read error: {}", e);
                                break;
                            }
                        }
                    }
                    Closed::Remote
                };

                let writing = async {
                    while let Some(frame) = outgoing.next().await {
                        if !is_awaited(&frame.id) {
                            crate::log_debug!("Dropping request {}: nobody awaits it", frame.id);
                            continue;
                        }
                        crate::log_debug!("Sending to {}: {}", host, frame.text);
                        if let Err(e) = write.send(Message::Text(frame.text.into())).await {
                            crate::log_error!("Send failed: {}", e);
                            return Closed::Remote;
                        }
                    }
                    Closed::SendersGone
                };

                let closed = tokio::select! {
                    closed = reading => closed,
                    closed = writing => closed,
                };

                crate::log_info!("WebSocket to {} closed", host);
                state.send_replace(ConnectionState::Disconnected);
                on_close();

                if let Closed::SendersGone = closed {
                    return;
                }

                let delay = reconnect.delay_for_attempt(0);
                tokio::time::sleep(tokio::time::Duration::from_millis(delay as u64)).await;
                attempt = 1;
            }
            Err(e) => {
                crate::log_error!("WebSocket error for {}: {}", host, e);

                if reconnect.max_attempts > 0 && attempt >= reconnect.max_attempts {
                    state.send_replace(ConnectionState::Failed {
                        reason: format!(
                            "Max reconnect attempts ({}) exceeded",
                            reconnect.max_attempts
                        ),
                    });
                    on_close();
                    return;
                }

                let delay = reconnect.delay_for_attempt(attempt);
                crate::log_info!(
                    "Reconnecting to {} in {}ms (attempt {})",
                    host,
                    delay,
                    attempt + 1
                );
                tokio::time::sleep(tokio::time::Duration::from_millis(delay as u64)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_channel::mpsc::unbounded;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    #[test]
    fn backoff_grows_and_caps() {
        let config = ReconnectConfig::default();
        assert_eq!(config.delay_for_attempt(0), 1000);
        assert_eq!(config.delay_for_attempt(1), 1500);
        assert_eq!(config.delay_for_attempt(2), 2250);
        assert_eq!(config.delay_for_attempt(50), 30000);
    }

    #[test]
    fn state_predicates() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Reconnecting { attempt: 2 }.is_connected());
        assert!(ConnectionState::Failed { reason: "x".into() }.is_failed());
        assert!(!ConnectionState::Disconnected.is_failed());
    }

    #[tokio::test]
    async fn frames_nobody_awaits_are_not_written() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/api/ws", listener.local_addr().unwrap());

        let (sender, receiver) = unbounded();
        for (id, text) in [("rejected", "first"), ("live", "second")] {
            sender
                .unbounded_send(OutgoingFrame {
                    id: id.into(),
                    text: text.into(),
                })
                .unwrap();
        }

        let handshake_url = url.clone();
        let connection = WsConnection::spawn(ConnectionParts {
            host: url,
            state: Arc::new(watch::channel(ConnectionState::Disconnected).0),
            outgoing: Arc::new(AsyncMutex::new(receiver)),
            request_builder: Arc::new(move || {
                handshake_url
                    .as_str()
                    .into_client_request()
                    .map_err(|e| e.to_string())
            }),
            on_message: Arc::new(|_: &str| {}),
            on_close: Arc::new(|| {}),
            is_awaited: Arc::new(|id: &str| id == "live"),
            reconnect: ReconnectConfig::default(),
        });

        let (stream, _) = listener.accept().await.unwrap();
        let mut server = accept_async(stream).await.unwrap();
        let first = server.next().await.unwrap().unwrap();

        assert_eq!(first, Message::text("second"));
        drop(connection);
        drop(sender);
    }
}
