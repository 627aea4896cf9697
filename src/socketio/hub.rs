//! Socket Hub
//!
//! Tracks every open socket and fans samples out to the ones that have
//! joined the default namespace.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::packet::{EnginePacket, PacketError, SocketPacket};
use crate::sample::Sample;

/// Unique identifier for a socket
pub type Sid = String;

/// Configuration for the socket hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent sockets
    pub max_connections: usize,
    /// Event name samples are broadcast under
    pub event: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            event: "data".to_string(),
        }
    }
}

/// Handle for sending packets to one socket
pub struct SocketHandle {
    /// Channel sender for this socket
    pub sender: mpsc::UnboundedSender<EnginePacket>,
    /// Whether the socket has joined the default namespace
    pub joined: bool,
}

/// Shared registry of sockets
#[derive(Clone)]
pub struct SocketHub {
    sockets: Arc<RwLock<HashMap<Sid, SocketHandle>>>,
    latest: Arc<RwLock<Option<Sample>>>,
    published: Arc<AtomicU64>,
    config: Arc<HubConfig>,
}

impl SocketHub {
    /// Create a new hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            sockets: Arc::new(RwLock::new(HashMap::new())),
            latest: Arc::new(RwLock::new(None)),
            published: Arc::new(AtomicU64::new(0)),
            config: Arc::new(config),
        }
    }

    /// Event name samples are published under
    pub fn event(&self) -> &str {
        &self.config.event
    }

    /// Register a new socket
    ///
    /// Returns the engine session id, or an error if the connection limit
    /// has been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<EnginePacket>,
    ) -> Result<Sid, HubError> {
        let mut sockets = self.sockets.write().await;
        if sockets.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let sid = Uuid::new_v4().simple().to_string();
        sockets.insert(
            sid.clone(),
            SocketHandle {
                sender,
                joined: false,
            },
        );

        tracing::info!(sid = %sid, "Socket opened");
        Ok(sid)
    }

    /// Mark a socket as connected to the default namespace
    pub async fn join(&self, sid: &str) -> Result<(), HubError> {
        let mut sockets = self.sockets.write().await;
        let handle = sockets.get_mut(sid).ok_or(HubError::SocketNotFound)?;
        handle.joined = true;

        tracing::info!(sid = %sid, "Client connected");
        Ok(())
    }

    /// Detach a socket from the default namespace without closing it
    pub async fn leave(&self, sid: &str) {
        if let Some(handle) = self.sockets.write().await.get_mut(sid) {
            handle.joined = false;
        }
    }

    /// Remove a socket
    pub async fn unregister(&self, sid: &str) {
        if self.sockets.write().await.remove(sid).is_some() {
            tracing::info!(sid = %sid, "Client disconnected");
        }
    }

    /// Send a packet to every joined socket
    ///
    /// Returns the number of sockets the packet was handed to.
    pub async fn broadcast(&self, packet: &EnginePacket) -> usize {
        let sockets = self.sockets.read().await;

        let mut sent_count = 0;
        for handle in sockets.values().filter(|handle| handle.joined) {
            if handle.sender.send(packet.clone()).is_ok() {
                sent_count += 1;
            }
        }

        if sent_count > 0 {
            tracing::trace!(recipients = sent_count, "Broadcast packet");
        }
        sent_count
    }

    /// Record a sample as the latest and broadcast it to every joined socket
    pub async fn publish(&self, sample: Sample) -> Result<usize, HubError> {
        let packet = EnginePacket::Message(SocketPacket::event(&self.config.event, &sample)?);

        *self.latest.write().await = Some(sample);
        self.published.fetch_add(1, Ordering::Relaxed);

        Ok(self.broadcast(&packet).await)
    }

    /// Send a packet to one socket
    pub async fn send_to(&self, sid: &str, packet: EnginePacket) -> Result<(), HubError> {
        let sockets = self.sockets.read().await;
        let handle = sockets.get(sid).ok_or(HubError::SocketNotFound)?;

        handle.sender.send(packet).map_err(|_| HubError::SendFailed)
    }

    /// Most recently published sample
    pub async fn latest(&self) -> Option<Sample> {
        self.latest.read().await.clone()
    }

    /// Number of samples published since start
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Number of open sockets
    pub async fn connection_count(&self) -> usize {
        self.sockets.read().await.len()
    }

    /// Number of sockets joined to the default namespace
    pub async fn joined_count(&self) -> usize {
        self.sockets
            .read()
            .await
            .values()
            .filter(|handle| handle.joined)
            .count()
    }
}

/// Errors that can occur in the socket hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Socket not found")]
    SocketNotFound,

    #[error("Failed to send packet")]
    SendFailed,

    #[error("Failed to encode packet: {0}")]
    Encode(#[from] PacketError),
}
