//! Channel directory client.
//!
//! REST collaborator used to list, create, join and leave channels, and to
//! fetch a channel's message history. The realtime connection layer is not
//! involved; directory failures surface directly to the caller.

mod http;

pub use http::HttpChannelDirectory;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// One channel the user is a member of.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub channel_id: String,
    pub channel_name: String,
}

/// One historical message, as returned by the history endpoint.
///
/// `message_id` and `timestamp` are server-assigned; history pages arrive
/// ordered oldest to newest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub message_id: i64,
    pub sender: String,
    pub content: String,
    pub timestamp: String,
}

/// Directory request failures.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server rejected the request with status {0}")]
    Status(u16),

    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

/// Abstract directory surface, mockable in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    /// Channels the user is a member of.
    async fn user_channels(&self, user_id: &str) -> Result<Vec<ChannelSummary>, DirectoryError>;

    /// Message history for one channel, oldest first.
    async fn channel_messages(
        &self,
        channel_id: &str,
    ) -> Result<Vec<MessageRecord>, DirectoryError>;

    async fn create_channel(
        &self,
        user_id: &str,
        channel_name: &str,
    ) -> Result<ChannelSummary, DirectoryError>;

    async fn join_channel(&self, channel_id: &str, user_id: &str) -> Result<(), DirectoryError>;

    async fn leave_channel(&self, channel_id: &str, user_id: &str) -> Result<(), DirectoryError>;
}
