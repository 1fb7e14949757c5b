//! WebSocket server implementation.
//!
//! Accepts WebSocket connections at `/ws` and lets clients subscribe to
//! registry notification topics. Events are delivered via broadcast channels
//! and filtered per-client based on subscription filters.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use verileaf_types::{RegistryEvent, Timestamp};

use crate::error::WsError;
use crate::subscriptions::{
    ClientMessage, ClientSubscriptions, ServerMessage, SubscriptionEvent, SubscriptionFilter,
    SubscriptionTopic,
};

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Shared state for the WebSocket server, holding one broadcast channel per
/// topic.
pub struct WsState {
    pub claims_tx: broadcast::Sender<SubscriptionEvent>,
    pub scores_tx: broadcast::Sender<SubscriptionEvent>,
    pub roles_tx: broadcast::Sender<SubscriptionEvent>,
}

impl WsState {
    /// Create a new `WsState` with the given channel capacity for each topic.
    pub fn new(channel_capacity: usize) -> Self {
        let (claims_tx, _) = broadcast::channel(channel_capacity);
        let (scores_tx, _) = broadcast::channel(channel_capacity);
        let (roles_tx, _) = broadcast::channel(channel_capacity);
        Self {
            claims_tx,
            scores_tx,
            roles_tx,
        }
    }

    pub fn sender_for(&self, topic: &SubscriptionTopic) -> &broadcast::Sender<SubscriptionEvent> {
        match topic {
            SubscriptionTopic::Claims => &self.claims_tx,
            SubscriptionTopic::Scores => &self.scores_tx,
            SubscriptionTopic::Roles => &self.roles_tx,
        }
    }

    /// Publish a registry notification on its topic.
    ///
    /// Returns the number of connected receivers; zero is not an error.
    pub fn publish(&self, event: &RegistryEvent) -> usize {
        let event = SubscriptionEvent::new(event, Timestamp::now());
        self.sender_for(&event.topic).send(event).unwrap_or(0)
    }
}

/// The WebSocket server, configured with an address and shared state.
pub struct WebSocketServer {
    pub addr: SocketAddr,
    pub state: Arc<WsState>,
}

impl WebSocketServer {
    pub fn new(addr: SocketAddr, state: Arc<WsState>) -> Self {
        Self { addr, state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .with_state(self.state.clone())
    }

    /// Listen for WebSocket connections until `shutdown` resolves.
    pub async fn start<F>(self, shutdown: F) -> Result<(), WsError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| WsError::Bind {
                addr: self.addr.to_string(),
                reason: e.to_string(),
            })?;
        info!(addr = %self.addr, "WebSocket server listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| WsError::Server(e.to_string()))
    }
}

/// Axum handler that upgrades an HTTP request to a WebSocket connection.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
///
/// Each active subscription gets a forwarder task reading its topic channel;
/// all of them are aborted when the client disconnects.
async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(ws_sender));

    let mut client_subs = ClientSubscriptions::new();
    let mut forwarders: HashMap<SubscriptionTopic, JoinHandle<()>> = HashMap::new();

    debug!("websocket client connected");

    while let Some(msg_result) = ws_receiver.next().await {
        let msg = match msg_result {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "websocket receive error");
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                handle_text_message(&text, &state, &mut client_subs, &mut forwarders, &ws_sender)
                    .await;
            }
            Message::Close(_) => break,
            Message::Ping(data) => {
                let mut sender = ws_sender.lock().await;
                let _ = sender.send(Message::Pong(data)).await;
            }
            _ => {}
        }
    }

    for (_, handle) in forwarders.drain() {
        handle.abort();
    }
    debug!("websocket client disconnected");
}

async fn handle_text_message(
    text: &str,
    state: &Arc<WsState>,
    client_subs: &mut ClientSubscriptions,
    forwarders: &mut HashMap<SubscriptionTopic, JoinHandle<()>>,
    ws_sender: &WsSender,
) {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            let error = ServerMessage::Error {
                message: format!("invalid message: {e}"),
            };
            send_json(ws_sender, &error).await;
            return;
        }
    };

    match client_msg {
        ClientMessage::Subscribe { topic, filter } => {
            if let Some(handle) = forwarders.remove(&topic) {
                handle.abort();
            }
            client_subs.subscribe(topic, filter.clone());

            let rx = state.sender_for(&topic).subscribe();
            let sender = ws_sender.clone();
            forwarders.insert(
                topic,
                tokio::spawn(forward_events(rx, sender, topic, filter)),
            );

            let ack = ServerMessage::Ack {
                action: "subscribe".to_string(),
                topic,
            };
            send_json(ws_sender, &ack).await;
            debug!(%topic, "client subscribed");
        }
        ClientMessage::Unsubscribe { topic } => {
            let was_subscribed = client_subs.unsubscribe(&topic);
            if let Some(handle) = forwarders.remove(&topic) {
                handle.abort();
            }

            let reply = if was_subscribed {
                ServerMessage::Ack {
                    action: "unsubscribe".to_string(),
                    topic,
                }
            } else {
                ServerMessage::Error {
                    message: format!("not subscribed to {topic}"),
                }
            };
            send_json(ws_sender, &reply).await;
        }
        ClientMessage::Ping => {
            send_json(ws_sender, &ServerMessage::Pong).await;
        }
    }
}

/// Serialize and send one message; returns false once the client is gone.
async fn send_json<T: Serialize>(ws_sender: &WsSender, message: &T) -> bool {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "failed to serialize websocket message");
            return true;
        }
    };
    let mut sender = ws_sender.lock().await;
    sender.send(Message::Text(text)).await.is_ok()
}

/// Forwarder task: reads one topic's channel and sends matching events to
/// the client.
async fn forward_events(
    mut rx: broadcast::Receiver<SubscriptionEvent>,
    ws_sender: WsSender,
    topic: SubscriptionTopic,
    filter: Option<SubscriptionFilter>,
) {
    let mut matcher = ClientSubscriptions::new();
    matcher.subscribe(topic, filter);

    loop {
        match rx.recv().await {
            Ok(event) => {
                if matcher.matches_filter(&topic, &event) && !send_json(&ws_sender, &event).await {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(%topic, skipped = n, "websocket client lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(%topic, "broadcast channel closed");
                break;
            }
        }
    }
}
