//! Realtime connection management.
//!
//! [`ConnectionManager`] owns at most one live WebSocket per active
//! channel view: it classifies inbound frames, fans them out to typed
//! listeners, tracks lifecycle state, and exposes a fail-fast `send`.
//! It never reconnects on its own; callers walk a
//! [`reconnect::ReconnectPolicy`] and issue fresh `connect()` calls.

mod manager;
mod registry;
mod state;

pub mod reconnect;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use manager::ConnectionManager;
pub use registry::ListenerToken;
pub use state::ConnectionState;

use thiserror::Error;
use url::Url;

use simplechat_shared::protocol::OutboundFrame;

/// Identifies one logical chat connection.
///
/// Immutable for the lifetime of one connection attempt; a channel switch
/// builds a fresh target and a fresh manager.
#[derive(Debug, Clone)]
pub struct ConnectionTarget {
    /// Display name carried on the handshake, not renegotiated later.
    pub display_name: String,
    /// Channel-scoped WebSocket endpoint (`ws(s)://host/ws/chat/<channelId>`).
    pub endpoint: Url,
}

impl ConnectionTarget {
    pub fn new(display_name: impl Into<String>, endpoint: Url) -> Self {
        Self {
            display_name: display_name.into(),
            endpoint,
        }
    }

    /// The endpoint with the display name attached as a `username` query
    /// pair, percent-encoded.
    pub fn handshake_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("username", &self.display_name);
        url
    }
}

/// A chat message delivered to chat listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub sender: String,
    pub content: String,
}

/// Payload for [`ConnectionManager::send`].
///
/// Opaque cargo to the manager: raw text passes through verbatim,
/// structured frames are JSON-encoded at transmission time.
#[derive(Debug, Clone)]
pub enum OutboundPayload {
    Raw(String),
    Frame(OutboundFrame),
}

impl OutboundPayload {
    pub(crate) fn into_text(self) -> String {
        match self {
            OutboundPayload::Raw(text) => text,
            OutboundPayload::Frame(frame) => frame.encode(),
        }
    }
}

/// Caller-visible failures of the connection manager.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// `send` was called outside the `Connected` state. Nothing was
    /// transmitted and nothing is queued.
    #[error("not connected (state: {0})")]
    NotConnected(ConnectionState),

    /// `connect` was called while a connection is already active; call
    /// `disconnect` first.
    #[error("connection already active (state: {0})")]
    AlreadyActive(ConnectionState),
}
