//! Socket.IO Packet Codec
//!
//! Text encoding of Engine.IO v4 packets and the Socket.IO v5 packets they
//! carry. Only the WebSocket transport is spoken, so every frame holds
//! exactly one packet and binary attachments are not supported.
//!
//! ```text
//! 0{"sid":"..","upgrades":[],"pingInterval":25000,...}   engine open
//! 2                                                      engine ping
//! 40                                                     socket connect
//! 42["data",{"timestamp":7,"channels":[1,2,3]}]          socket event
//! 42/admin,13["status",{}]                               namespaced event with ack id
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Engine.IO protocol revision spoken by this codec
pub const ENGINE_PROTOCOL: &str = "4";

/// The default namespace
pub const DEFAULT_NAMESPACE: &str = "/";

/// Engine.IO open handshake payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Engine session id
    pub sid: String,
    /// Transports the client may upgrade to (always empty: already on WebSocket)
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong
    pub ping_timeout: u64,
    /// Largest payload accepted, in bytes
    #[serde(default)]
    pub max_payload: u64,
}

/// An Engine.IO packet
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(Option<String>),
    Pong(Option<String>),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

/// Socket.IO packet types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketPacketKind {
    Connect,
    Disconnect,
    Event,
    Ack,
    ConnectError,
}

impl SocketPacketKind {
    fn code(self) -> char {
        match self {
            SocketPacketKind::Connect => '0',
            SocketPacketKind::Disconnect => '1',
            SocketPacketKind::Event => '2',
            SocketPacketKind::Ack => '3',
            SocketPacketKind::ConnectError => '4',
        }
    }

    fn from_code(code: char) -> Result<Self, PacketError> {
        match code {
            '0' => Ok(SocketPacketKind::Connect),
            '1' => Ok(SocketPacketKind::Disconnect),
            '2' => Ok(SocketPacketKind::Event),
            '3' => Ok(SocketPacketKind::Ack),
            '4' => Ok(SocketPacketKind::ConnectError),
            '5' | '6' => Err(PacketError::BinaryUnsupported),
            other => Err(PacketError::UnknownSocketType(other)),
        }
    }
}

/// A Socket.IO packet
#[derive(Debug, Clone, PartialEq)]
pub struct SocketPacket {
    pub kind: SocketPacketKind,
    pub namespace: String,
    pub ack_id: Option<u64>,
    pub data: Option<Value>,
}

impl SocketPacket {
    fn bare(kind: SocketPacketKind, data: Option<Value>) -> Self {
        Self {
            kind,
            namespace: DEFAULT_NAMESPACE.to_string(),
            ack_id: None,
            data,
        }
    }

    /// Connect request (client) or confirmation (server, carries the socket id)
    pub fn connect(sid: Option<&str>) -> Self {
        Self::bare(
            SocketPacketKind::Connect,
            sid.map(|sid| serde_json::json!({ "sid": sid })),
        )
    }

    /// Disconnect from the default namespace
    pub fn disconnect() -> Self {
        Self::bare(SocketPacketKind::Disconnect, None)
    }

    /// Connection refused
    pub fn connect_error(message: &str) -> Self {
        Self::bare(
            SocketPacketKind::ConnectError,
            Some(serde_json::json!({ "message": message })),
        )
    }

    /// Named event with a single JSON payload
    pub fn event<T: Serialize>(name: &str, payload: &T) -> Result<Self, PacketError> {
        let payload = serde_json::to_value(payload)?;
        Ok(Self::bare(
            SocketPacketKind::Event,
            Some(Value::Array(vec![Value::String(name.to_string()), payload])),
        ))
    }

    /// Event name, if this is a well-formed event
    pub fn event_name(&self) -> Option<&str> {
        if self.kind != SocketPacketKind::Event {
            return None;
        }
        self.data.as_ref()?.as_array()?.first()?.as_str()
    }

    /// Event arguments (everything after the name)
    pub fn event_args(&self) -> &[Value] {
        match (&self.kind, &self.data) {
            (SocketPacketKind::Event, Some(Value::Array(items))) if !items.is_empty() => {
                &items[1..]
            }
            _ => &[],
        }
    }

    /// Encode to the wire form (without the engine `4` prefix)
    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push(self.kind.code());
        if self.namespace != DEFAULT_NAMESPACE {
            out.push_str(&self.namespace);
            out.push(',');
        }
        if let Some(id) = self.ack_id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = &self.data {
            out.push_str(&data.to_string());
        }
        out
    }

    /// Decode from the wire form (without the engine `4` prefix)
    pub fn decode(text: &str) -> Result<Self, PacketError> {
        let mut chars = text.chars();
        let kind = SocketPacketKind::from_code(chars.next().ok_or(PacketError::Empty)?)?;
        let mut rest = chars.as_str();

        let mut namespace = DEFAULT_NAMESPACE.to_string();
        if rest.starts_with('/') {
            match rest.find(',') {
                Some(end) => {
                    namespace = rest[..end].to_string();
                    rest = &rest[end + 1..];
                }
                None => {
                    namespace = rest.to_string();
                    rest = "";
                }
            }
        }

        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let ack_id = if digits > 0 {
            let id = rest[..digits]
                .parse::<u64>()
                .map_err(|_| PacketError::InvalidAckId(rest[..digits].to_string()))?;
            rest = &rest[digits..];
            Some(id)
        } else {
            None
        };

        let data = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(rest)?)
        };

        let named = matches!(
            &data,
            Some(Value::Array(items)) if items.first().map_or(false, Value::is_string)
        );
        if kind == SocketPacketKind::Event && !named {
            return Err(PacketError::MalformedEvent);
        }

        Ok(Self {
            kind,
            namespace,
            ack_id,
            data,
        })
    }
}

impl EnginePacket {
    /// Encode to a WebSocket text frame
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(handshake) => {
                // Handshake is plain data; serialization cannot fail
                format!("0{}", serde_json::to_string(handshake).unwrap_or_default())
            }
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(probe) => format!("2{}", probe.as_deref().unwrap_or("")),
            EnginePacket::Pong(probe) => format!("3{}", probe.as_deref().unwrap_or("")),
            EnginePacket::Message(packet) => format!("4{}", packet.encode()),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }

    /// Decode a WebSocket text frame
    pub fn decode(text: &str) -> Result<Self, PacketError> {
        let mut chars = text.chars();
        let code = chars.next().ok_or(PacketError::Empty)?;
        let rest = chars.as_str();
        let probe = || (!rest.is_empty()).then(|| rest.to_string());

        match code {
            '0' => Ok(EnginePacket::Open(serde_json::from_str(rest)?)),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(probe())),
            '3' => Ok(EnginePacket::Pong(probe())),
            '4' => Ok(EnginePacket::Message(SocketPacket::decode(rest)?)),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(PacketError::UnknownEngineType(other)),
        }
    }
}

impl fmt::Display for EnginePacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Build the WebSocket endpoint for a Socket.IO server base URL
///
/// `http://localhost:15641` becomes
/// `ws://localhost:15641/socket.io/?EIO=4&transport=websocket`.
pub fn engine_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    let base = if let Some(host) = base.strip_prefix("https://") {
        format!("wss://{}", host)
    } else if let Some(host) = base.strip_prefix("http://") {
        format!("ws://{}", host)
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        format!("ws://{}", base)
    };
    format!("{}/socket.io/?EIO={}&transport=websocket", base, ENGINE_PROTOCOL)
}

/// Errors raised while decoding packets
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("Empty packet")]
    Empty,

    #[error("Unknown engine packet type '{0}'")]
    UnknownEngineType(char),

    #[error("Unknown socket packet type '{0}'")]
    UnknownSocketType(char),

    #[error("Binary packets are not supported")]
    BinaryUnsupported,

    #[error("Invalid ack id: {0}")]
    InvalidAckId(String),

    #[error("Event payload must be an array starting with the event name")]
    MalformedEvent,

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}
