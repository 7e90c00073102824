//! WebSocket wire protocol for chat connections.
//!
//! Frames are UTF-8 text carrying a JSON object tagged by a `type` field:
//!
//! ```not_rust
//! Inbound:  {"type":"SYSTEM","content":"alice joined the chat!"}
//!           {"type":"CHAT","sender":"bob","content":"hey"}
//! Outbound: {"type":"CHAT","content":"hey","channelId":"42","sender":"bob"}
//! ```
//!
//! Inbound frames may carry extra fields (the server adds `channelId` and
//! `timestamp` to broadcast CHAT frames); those are ignored on decode.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A frame received from the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum InboundFrame {
    /// Server-generated notice (join/leave announcements etc.).
    #[serde(rename = "SYSTEM")]
    System { content: String },

    /// A chat message relayed from a participant.
    #[serde(rename = "CHAT")]
    Chat { sender: String, content: String },
}

/// A frame the client transmits to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum OutboundFrame {
    #[serde(rename = "CHAT")]
    Chat {
        content: String,
        #[serde(rename = "channelId")]
        channel_id: String,
        sender: String,
    },
}

/// Decode failure for an inbound frame.
///
/// Carries the raw text so call sites can log what was dropped.
#[derive(Debug, Error)]
#[error("unrecognized frame: {raw}")]
pub struct FrameError {
    pub raw: String,
}

impl InboundFrame {
    /// Decode one text frame.
    ///
    /// Invalid JSON and unknown `type` tags both fail; the caller is
    /// expected to discard the frame rather than propagate the error.
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        serde_json::from_str(text).map_err(|_| FrameError {
            raw: text.to_string(),
        })
    }
}

impl OutboundFrame {
    /// Encode the frame as JSON text.
    pub fn encode(&self) -> String {
        // Serialization of these shapes cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
