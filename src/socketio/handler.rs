//! Socket Handler
//!
//! Upgrades `/socket.io/` requests to WebSocket and runs the Engine.IO
//! session: handshake, heartbeat, namespace connect and event dispatch.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::hub::SocketHub;
use super::packet::{
    EnginePacket, Handshake, SocketPacket, SocketPacketKind, DEFAULT_NAMESPACE, ENGINE_PROTOCOL,
};
use crate::api::{ApiError, AppState};
use crate::sample::Sample;

/// Status message sent to every client once it joins
pub const STATUS_EVENT: &str = "status";
const STATUS_MESSAGE: &str = "Server connected, ready to receive data";

/// Event clients use to report their own status
pub const CLIENT_STATUS_EVENT: &str = "client_status";

/// Per-socket session settings
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Interval between server pings
    pub ping_interval: Duration,
    /// How long to wait for a pong before dropping the socket
    pub ping_timeout: Duration,
    /// Largest payload advertised in the handshake
    pub max_payload: u64,
    /// Re-broadcast data events received from clients
    pub relay: bool,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_millis(25_000),
            ping_timeout: Duration::from_millis(20_000),
            max_payload: 1_000_000,
            relay: true,
        }
    }
}

/// Query string of an Engine.IO request
#[derive(Debug, Deserialize)]
pub struct EngineQuery {
    #[serde(rename = "EIO")]
    pub eio: Option<String>,
    pub transport: Option<String>,
}

/// What the receive loop should do after a frame
#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Pong,
    Close,
}

/// WebSocket upgrade handler for `/socket.io/`
pub async fn socket_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Query(query): Query<EngineQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    if query.eio.as_deref() != Some(ENGINE_PROTOCOL) {
        return ApiError::Validation(format!(
            "Unsupported protocol version {:?} (expected EIO={})",
            query.eio, ENGINE_PROTOCOL
        ))
        .into_response();
    }
    if query.transport.as_deref() != Some("websocket") {
        return ApiError::Validation(format!(
            "Unsupported transport {:?} (only websocket is served)",
            query.transport
        ))
        .into_response();
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let hub = state.hub.clone();
    let options = state.socket_options.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, hub, options))
}

/// Run one Engine.IO session until either side goes away
async fn handle_socket(socket: WebSocket, hub: SocketHub, options: SocketOptions) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<EnginePacket>();

    let sid = match hub.register(tx).await {
        Ok(sid) => sid,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register socket");
            let _ = sender.send(Message::Text(EnginePacket::Close.encode())).await;
            return;
        }
    };

    let handshake = EnginePacket::Open(Handshake {
        sid: sid.clone(),
        upgrades: Vec::new(),
        ping_interval: options.ping_interval.as_millis() as u64,
        ping_timeout: options.ping_timeout.as_millis() as u64,
        max_payload: options.max_payload,
    });
    if sender.send(Message::Text(handshake.encode())).await.is_err() {
        tracing::error!(sid = %sid, "Failed to send open handshake");
        hub.unregister(&sid).await;
        return;
    }

    let sid_for_send = sid.clone();

    // Forward queued packets to the WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(packet) = rx.recv().await {
            let closing = packet == EnginePacket::Close;
            if sender.send(Message::Text(packet.encode())).await.is_err() {
                tracing::debug!(sid = %sid_for_send, "WebSocket send failed, closing socket");
                break;
            }
            if closing {
                let _ = sender.close().await;
                break;
            }
        }
    });

    let hub_for_recv = hub.clone();
    let sid_for_recv = sid.clone();

    // Read client frames and drive the heartbeat
    let mut recv_task = tokio::spawn(async move {
        let mut ping = tokio::time::interval(options.ping_interval.max(Duration::from_millis(1)));
        // The first tick fires immediately; the first ping is due one interval in.
        ping.tick().await;
        let mut pong_deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = ping.tick() => {
                    if hub_for_recv.send_to(&sid_for_recv, EnginePacket::Ping(None)).await.is_err() {
                        break;
                    }
                    pong_deadline.get_or_insert_with(|| Instant::now() + options.ping_timeout);
                }
                _ = tokio::time::sleep_until(pong_deadline.unwrap_or_else(Instant::now)), if pong_deadline.is_some() => {
                    tracing::info!(sid = %sid_for_recv, "Ping timeout, dropping socket");
                    break;
                }
                frame = receiver.next() => match frame {
                    Some(Ok(message)) => {
                        match handle_ws_message(&hub_for_recv, &sid_for_recv, &options, message).await {
                            Flow::Continue => {}
                            Flow::Pong => pong_deadline = None,
                            Flow::Close => break,
                        }
                    }
                    Some(Err(e)) => {
                        tracing::debug!(sid = %sid_for_recv, error = %e, "WebSocket receive error");
                        break;
                    }
                    None => break,
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    hub.unregister(&sid).await;
}

/// Handle one WebSocket frame
async fn handle_ws_message(
    hub: &SocketHub,
    sid: &str,
    options: &SocketOptions,
    message: Message,
) -> Flow {
    match message {
        Message::Text(text) => match EnginePacket::decode(&text) {
            Ok(EnginePacket::Pong(_)) => Flow::Pong,
            Ok(EnginePacket::Ping(probe)) => {
                let _ = hub.send_to(sid, EnginePacket::Pong(probe)).await;
                Flow::Continue
            }
            Ok(EnginePacket::Close) => {
                tracing::debug!(sid = %sid, "Client closed the engine session");
                Flow::Close
            }
            Ok(EnginePacket::Message(packet)) => {
                handle_socket_packet(hub, sid, options, packet).await;
                Flow::Continue
            }
            Ok(other) => {
                tracing::debug!(sid = %sid, packet = %other, "Ignoring engine packet");
                Flow::Continue
            }
            Err(e) => {
                tracing::debug!(sid = %sid, error = %e, text = %text, "Invalid packet");
                Flow::Continue
            }
        },
        Message::Binary(_) => {
            tracing::debug!(sid = %sid, "Binary frames not supported");
            Flow::Continue
        }
        // Axum answers WebSocket-level pings itself
        Message::Ping(_) | Message::Pong(_) => Flow::Continue,
        Message::Close(_) => {
            tracing::debug!(sid = %sid, "Client requested close");
            Flow::Close
        }
    }
}

/// Handle a decoded Socket.IO packet
async fn handle_socket_packet(
    hub: &SocketHub,
    sid: &str,
    options: &SocketOptions,
    packet: SocketPacket,
) {
    match packet.kind {
        SocketPacketKind::Connect => {
            if packet.namespace != DEFAULT_NAMESPACE {
                let refusal = SocketPacket {
                    namespace: packet.namespace.clone(),
                    ..SocketPacket::connect_error("Invalid namespace")
                };
                let _ = hub.send_to(sid, EnginePacket::Message(refusal)).await;
                return;
            }

            if let Err(e) = hub.join(sid).await {
                tracing::error!(sid = %sid, error = %e, "Connect error");
                return;
            }
            let _ = hub
                .send_to(sid, EnginePacket::Message(SocketPacket::connect(Some(sid))))
                .await;

            let status = serde_json::json!({ "message": STATUS_MESSAGE });
            if let Ok(event) = SocketPacket::event(STATUS_EVENT, &status) {
                let _ = hub.send_to(sid, EnginePacket::Message(event)).await;
            }
        }
        SocketPacketKind::Disconnect => {
            hub.leave(sid).await;
        }
        SocketPacketKind::Event => handle_event(hub, sid, options, &packet).await,
        SocketPacketKind::Ack | SocketPacketKind::ConnectError => {
            tracing::debug!(sid = %sid, kind = ?packet.kind, "Ignoring socket packet");
        }
    }
}

/// Dispatch a client event by name
async fn handle_event(hub: &SocketHub, sid: &str, options: &SocketOptions, packet: &SocketPacket) {
    let name = packet.event_name().unwrap_or_default();
    let payload = packet.event_args().first().cloned().unwrap_or_default();

    if name == hub.event() {
        let sample: Sample = match serde_json::from_value(payload) {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!(sid = %sid, error = %e, "Dropping malformed data event");
                return;
            }
        };

        let head = &sample.channels[..sample.channels.len().min(5)];
        tracing::debug!(
            sid = %sid,
            timestamp = sample.timestamp,
            channels = sample.channels.len(),
            head = ?head,
            "Data received"
        );

        if options.relay {
            if let Err(e) = hub.publish(sample).await {
                tracing::error!(sid = %sid, error = %e, "Failed to relay sample");
            }
        }
    } else if name == CLIENT_STATUS_EVENT {
        let message = payload
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or_default();
        tracing::info!(sid = %sid, message = %message, "Client status update");
    } else {
        tracing::debug!(sid = %sid, event = %name, "Unhandled event");
    }
}
