//! Socket.IO Real-Time Streaming
//!
//! Serves the Socket.IO protocol (Engine.IO v4, WebSocket transport only) so
//! that stock Socket.IO clients and the dashboard can receive samples live.
//!
//! ## Architecture
//!
//! - **SocketHub**: tracks open sockets and fans samples out
//! - **Handler**: WebSocket upgrade, heartbeat and packet dispatch
//! - **Packet**: Engine.IO / Socket.IO text codec
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const socket = io("http://localhost:15641", { transports: ["websocket"] });
//! socket.on("data", (sample) => console.log(sample.timestamp, sample.channels));
//! ```

mod handler;
mod hub;
mod packet;

pub use handler::{socket_handler, SocketOptions, CLIENT_STATUS_EVENT, STATUS_EVENT};
pub use hub::{HubConfig, HubError, Sid, SocketHub};
pub use packet::{
    engine_url, EnginePacket, Handshake, PacketError, SocketPacket, SocketPacketKind,
    DEFAULT_NAMESPACE, ENGINE_PROTOCOL,
};
