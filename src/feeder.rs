//! Feeder Client
//!
//! Pushes samples from a local source to a remote data server as Socket.IO
//! events, so that a server without direct access to the acquisition
//! hardware can relay them to dashboards.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::sample::FrameNormalizer;
use crate::socketio::{engine_url, EnginePacket, PacketError, SocketPacket, SocketPacketKind};
use crate::source::{SampleSource, SourceError};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Feeder settings
#[derive(Debug, Clone)]
pub struct FeederConfig {
    /// Base URL of the data server (e.g. `http://localhost:15641`)
    pub url: String,
    /// Event name samples are emitted under
    pub event: String,
    /// Delay between samples
    pub interval: Duration,
    /// Delay between connection attempts
    pub reconnect_delay: Duration,
    /// Log every n-th sample; 0 disables
    pub log_every: u64,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:15641".to_string(),
            event: "data".to_string(),
            interval: Duration::from_millis(10),
            reconnect_delay: Duration::from_secs(2),
            log_every: 500,
        }
    }
}

/// Errors raised by the feeder
#[derive(Debug, Error)]
pub enum FeederError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Protocol error: {0}")]
    Packet(#[from] PacketError),

    #[error("Server refused connection: {0}")]
    Refused(String),

    #[error("Connection closed by server")]
    Closed,

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Streams a source to a remote server, reconnecting as needed
pub struct Feeder {
    source: Box<dyn SampleSource>,
    normalizer: FrameNormalizer,
    config: FeederConfig,
    sent: u64,
}

impl Feeder {
    pub fn new(source: Box<dyn SampleSource>, normalizer: FrameNormalizer, config: FeederConfig) -> Self {
        Self {
            source,
            normalizer,
            config,
            sent: 0,
        }
    }

    /// Number of samples emitted so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Feed until the source is exhausted
    ///
    /// Connection failures are retried forever after `reconnect_delay`.
    pub async fn run(&mut self) -> Result<(), FeederError> {
        let url = engine_url(&self.config.url);

        loop {
            tracing::info!(url = %url, "Connecting to data server");

            let result = match connect(&url).await {
                Ok(socket) => {
                    tracing::info!("Connected to data server");
                    self.stream(socket).await
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => return Ok(()),
                Err(FeederError::Source(e)) => return Err(FeederError::Source(e)),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        retry_in_ms = self.config.reconnect_delay.as_millis() as u64,
                        "Disconnected from data server"
                    );
                    tokio::time::sleep(self.config.reconnect_delay).await;
                }
            }
        }
    }

    /// Emit samples over an established session until the source ends
    async fn stream(&mut self, mut socket: Socket) -> Result<(), FeederError> {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let frame = match self.source.next_frame().await? {
                        Some(frame) => frame,
                        None => {
                            tracing::info!(sent = self.sent, "Source exhausted, disconnecting");
                            send(&mut socket, &EnginePacket::Message(SocketPacket::disconnect())).await?;
                            let _ = socket.close(None).await;
                            return Ok(());
                        }
                    };

                    let Some(sample) = self.normalizer.process(frame) else {
                        continue;
                    };

                    let event = SocketPacket::event(&self.config.event, &sample)?;
                    send(&mut socket, &EnginePacket::Message(event)).await?;
                    self.sent += 1;

                    if self.config.log_every > 0 && self.sent % self.config.log_every == 0 {
                        tracing::info!(
                            sent = self.sent,
                            timestamp = sample.timestamp,
                            channels = sample.channels.len(),
                            "Feeding samples"
                        );
                    }
                }
                frame = socket.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => handle_server_frame(&mut socket, &text).await?,
                        Some(Ok(Message::Close(_))) | None => return Err(FeederError::Closed),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                    }
                }
            }
        }
    }
}

/// Open the WebSocket and complete the Engine.IO and Socket.IO handshakes
async fn connect(url: &str) -> Result<Socket, FeederError> {
    let (mut socket, _) = tokio_tungstenite::connect_async(url).await?;

    let mut joined = false;
    while !joined {
        let text = match socket.next().await {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => return Err(FeederError::Closed),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
        };

        match EnginePacket::decode(&text)? {
            EnginePacket::Open(handshake) => {
                tracing::debug!(sid = %handshake.sid, "Engine session opened");
                send(&mut socket, &EnginePacket::Message(SocketPacket::connect(None))).await?;
            }
            EnginePacket::Message(packet) if packet.kind == SocketPacketKind::Connect => {
                joined = true;
            }
            EnginePacket::Message(packet) if packet.kind == SocketPacketKind::ConnectError => {
                let reason = packet
                    .data
                    .as_ref()
                    .and_then(|data| data.get("message"))
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown reason")
                    .to_string();
                return Err(FeederError::Refused(reason));
            }
            EnginePacket::Ping(probe) => send(&mut socket, &EnginePacket::Pong(probe)).await?,
            EnginePacket::Close => return Err(FeederError::Closed),
            _ => {}
        }
    }

    Ok(socket)
}

/// React to a frame the server sent mid-stream
async fn handle_server_frame(socket: &mut Socket, text: &str) -> Result<(), FeederError> {
    match EnginePacket::decode(text) {
        Ok(EnginePacket::Ping(probe)) => send(socket, &EnginePacket::Pong(probe)).await,
        Ok(EnginePacket::Close) => Err(FeederError::Closed),
        Ok(EnginePacket::Message(packet)) if packet.kind == SocketPacketKind::Disconnect => {
            Err(FeederError::Closed)
        }
        Ok(EnginePacket::Message(packet)) => {
            if let Some(name) = packet.event_name() {
                tracing::debug!(event = %name, "Server event");
            }
            Ok(())
        }
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::debug!(error = %e, text = %text, "Ignoring invalid frame");
            Ok(())
        }
    }
}

async fn send(socket: &mut Socket, packet: &EnginePacket) -> Result<(), FeederError> {
    socket.send(Message::Text(packet.encode())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FeederConfig::default();
        assert_eq!(config.url, "http://localhost:15641");
        assert_eq!(config.event, "data");
        assert_eq!(config.interval, Duration::from_millis(10));
        assert_eq!(config.reconnect_delay, Duration::from_secs(2));
        assert_eq!(config.log_every, 500);
    }
}
