//! Socket.IO Client
//!
//! One connection to the data server, opened when the shell mounts and
//! closed when it unmounts. Only the WebSocket transport is used and there
//! is no reconnection.

use leptos::logging::{error, log};
use serde::Deserialize;
use serde_json::Value;
use std::cell::Cell;
use std::rc::Rc;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use super::sample::{DashboardState, Sample};

/// Address of the local data server
pub const DATA_SERVER_URL: &str = "http://localhost:15641";

/// Event carrying samples
pub const DATA_EVENT: &str = "data";

/// Frame sent to leave the default namespace
const DISCONNECT_FRAME: &str = "41";

/// Called with every text frame; returns a frame to send back, if any
pub type FrameHandler = Box<dyn FnMut(&str) -> Option<String>>;

/// Called once the transport has closed
pub type CloseHandler = Box<dyn FnMut()>;

/// Notifications surfaced by a session
#[derive(Clone, Debug, PartialEq)]
pub enum SocketEvent {
    Connected,
    Data(Sample),
    Disconnected,
}

/// What to do with one inbound frame
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Reply(String),
    Notify(SocketEvent),
    Ignore,
}

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("Failed to open connection: {0}")]
    Open(String),

    #[error("Empty frame")]
    EmptyFrame,

    #[error("Unknown packet type '{0}'")]
    UnknownPacket(char),

    #[error("Event is not a named array")]
    MalformedEvent,

    #[error("Malformed data payload: {0}")]
    MalformedPayload(serde_json::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection refused: {0}")]
    Refused(String),
}

/// Engine.IO open packet; only the session id is of interest
#[derive(Deserialize)]
struct Handshake {
    sid: String,
}

/// Build the WebSocket endpoint for a Socket.IO server base URL
pub fn engine_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    let base = if let Some(host) = base.strip_prefix("https://") {
        format!("wss://{}", host)
    } else if let Some(host) = base.strip_prefix("http://") {
        format!("ws://{}", host)
    } else {
        base.to_string()
    };
    format!("{}/socket.io/?EIO=4&transport=websocket", base)
}

/// Client side of the Engine.IO/Socket.IO exchange
///
/// Turns text frames into replies and notifications. Holds no I/O, so the
/// browser connection and tests drive it the same way.
pub struct Session {
    event: String,
}

impl Session {
    pub fn new(event: &str) -> Self {
        Self {
            event: event.to_string(),
        }
    }

    /// Handle one inbound text frame
    pub fn on_frame(&mut self, text: &str) -> Result<Step, SocketError> {
        let mut chars = text.chars();
        let code = chars.next().ok_or(SocketError::EmptyFrame)?;
        let rest = chars.as_str();

        match code {
            '0' => {
                let handshake: Handshake = serde_json::from_str(rest)?;
                log!("Engine session {} opened", handshake.sid);
                Ok(Step::Reply("40".to_string()))
            }
            '1' => Ok(Step::Notify(SocketEvent::Disconnected)),
            // Echo the probe, if any
            '2' => Ok(Step::Reply(format!("3{}", rest))),
            '3' | '5' | '6' => Ok(Step::Ignore),
            '4' => self.on_message(rest),
            other => Err(SocketError::UnknownPacket(other)),
        }
    }

    fn on_message(&mut self, text: &str) -> Result<Step, SocketError> {
        let mut chars = text.chars();
        let code = chars.next().ok_or(SocketError::EmptyFrame)?;
        let body = chars.as_str();

        // Only the default namespace is joined
        if body.starts_with('/') {
            return Ok(Step::Ignore);
        }
        let body = body.trim_start_matches(|c: char| c.is_ascii_digit());

        match code {
            '0' => Ok(Step::Notify(SocketEvent::Connected)),
            '1' => Ok(Step::Notify(SocketEvent::Disconnected)),
            '2' => self.on_event(body),
            '3' => Ok(Step::Ignore),
            '4' => {
                let reason = serde_json::from_str::<Value>(body)
                    .ok()
                    .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                    .unwrap_or_else(|| "unknown reason".to_string());
                Err(SocketError::Refused(reason))
            }
            other => Err(SocketError::UnknownPacket(other)),
        }
    }

    fn on_event(&mut self, body: &str) -> Result<Step, SocketError> {
        let Value::Array(mut items) = serde_json::from_str::<Value>(body)? else {
            return Err(SocketError::MalformedEvent);
        };
        if items.is_empty() {
            return Err(SocketError::MalformedEvent);
        }
        let payload = if items.len() > 1 {
            items.swap_remove(1)
        } else {
            Value::Null
        };

        match items.first().and_then(Value::as_str) {
            Some(name) if name == self.event => {
                let sample = serde_json::from_value(payload).map_err(SocketError::MalformedPayload)?;
                Ok(Step::Notify(SocketEvent::Data(sample)))
            }
            Some(_) => Ok(Step::Ignore),
            None => Err(SocketError::MalformedEvent),
        }
    }
}

/// An open transport
pub trait Connection {
    /// Leave the namespace and close the transport
    fn close(&self);
}

/// Opens transports
pub trait Connector {
    type Connection: Connection;

    fn open(
        &self,
        url: &str,
        on_frame: FrameHandler,
        on_close: CloseHandler,
    ) -> Result<Self::Connection, SocketError>;
}

/// Applies notifications to the dashboard state
struct Dispatcher {
    state: DashboardState,
    connected: Cell<bool>,
}

impl Dispatcher {
    fn handle(&self, event: SocketEvent) {
        match event {
            SocketEvent::Connected => {
                self.connected.set(true);
                log!("Connected to data server");
            }
            SocketEvent::Data(sample) => self.state.apply(sample),
            SocketEvent::Disconnected => {
                if self.connected.replace(false) {
                    log!("Disconnected from server");
                }
            }
        }
    }
}

/// Connection lifecycle owned by the root component
pub struct Shell<C: Connection> {
    connection: Option<C>,
}

impl<C: Connection> Shell<C> {
    /// Open the single connection to `base_url`
    pub fn mount<K>(connector: &K, base_url: &str, state: DashboardState) -> Result<Self, SocketError>
    where
        K: Connector<Connection = C>,
    {
        let url = engine_url(base_url);
        let dispatcher = Rc::new(Dispatcher {
            state,
            connected: Cell::new(false),
        });

        let mut session = Session::new(DATA_EVENT);
        let frames = Rc::clone(&dispatcher);
        let on_frame: FrameHandler = Box::new(move |text: &str| match session.on_frame(text) {
            Ok(Step::Reply(frame)) => Some(frame),
            Ok(Step::Notify(event)) => {
                frames.handle(event);
                None
            }
            Ok(Step::Ignore) => None,
            Err(e) => {
                error!("Dropping frame: {}", e);
                None
            }
        });
        let on_close: CloseHandler = Box::new(move || dispatcher.handle(SocketEvent::Disconnected));

        let connection = connector.open(&url, on_frame, on_close)?;
        Ok(Self {
            connection: Some(connection),
        })
    }

    /// Close the connection; later calls do nothing
    pub fn teardown(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }
}

/// Connector backed by the browser's WebSocket
pub struct BrowserConnector;

pub struct BrowserConnection {
    ws: WebSocket,
}

impl Connector for BrowserConnector {
    type Connection = BrowserConnection;

    fn open(
        &self,
        url: &str,
        mut on_frame: FrameHandler,
        mut on_close: CloseHandler,
    ) -> Result<BrowserConnection, SocketError> {
        let ws = WebSocket::new(url).map_err(|e| SocketError::Open(format!("{:?}", e)))?;

        let replies = ws.clone();
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                let text: String = text.into();
                if let Some(reply) = on_frame(&text) {
                    if let Err(e) = replies.send_with_str(&reply) {
                        error!("WebSocket send failed: {:?}", e);
                    }
                }
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        let on_closed = Closure::wrap(Box::new(move |event: CloseEvent| {
            log!("WebSocket closed: code={}, reason={}", event.code(), event.reason());
            on_close();
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(on_closed.as_ref().unchecked_ref()));
        on_closed.forget();

        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            error!("WebSocket error: {:?}", e);
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();

        Ok(BrowserConnection { ws })
    }
}

impl Connection for BrowserConnection {
    fn close(&self) {
        self.ws.set_onmessage(None);
        if self.ws.ready_state() == WebSocket::OPEN {
            if let Err(e) = self.ws.send_with_str(DISCONNECT_FRAME) {
                error!("Failed to send disconnect: {:?}", e);
            }
        }
        if let Err(e) = self.ws.close() {
            error!("Failed to close WebSocket: {:?}", e);
        }
    }
}
