//! Chat view controller.
//!
//! Owns the active channel: its timeline, its connection manager, and the
//! event stream that links the two. History is awaited before the live
//! connection is wired, so live frames only ever append at the tail; a
//! channel switch fully disconnects the previous manager before the new
//! one's events are trusted.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

use simplechat_shared::protocol::OutboundFrame;
use simplechat_shared::time::Clock;

use crate::connection::transport::Connector;
use crate::connection::{
    ConnectionError, ConnectionManager, ConnectionState, ConnectionTarget, OutboundPayload,
};
use crate::directory::{ChannelDirectory, ChannelSummary, DirectoryError};
use crate::session::Session;
use crate::timeline::Timeline;

use super::notify::{NoticeLevel, Notifier};

/// Client-enforced budget from `connect()` to reaching `Connected`.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Events forwarded from connection listeners to the view loop.
#[derive(Debug, PartialEq, Eq)]
pub enum ViewEvent {
    /// The connection reached `Connected`.
    Opened,
    /// A SYSTEM notice arrived.
    Notice(String),
    /// A CHAT message arrived.
    Chat { sender: String, content: String },
    /// The transport failed or was refused.
    ConnectionLost(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("no channel named '{0}' (join or create it first)")]
    UnknownChannel(String),

    #[error("no active channel")]
    NoActiveChannel,

    #[error("timed out waiting for the connection to open")]
    ConnectTimeout,

    #[error("connection refused: {0}")]
    ConnectRefused(String),

    #[error("invalid websocket endpoint: {0}")]
    BadEndpoint(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

struct ActiveChannel {
    summary: ChannelSummary,
    manager: ConnectionManager,
    timeline: Timeline,
    events: mpsc::UnboundedReceiver<ViewEvent>,
}

pub struct ChatController {
    session: Session,
    ws_base: Url,
    directory: Arc<dyn ChannelDirectory>,
    connector: Arc<dyn Connector>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    connect_timeout: Duration,
    active: Option<ActiveChannel>,
}

impl ChatController {
    pub fn new(
        session: Session,
        ws_base: Url,
        directory: Arc<dyn ChannelDirectory>,
        connector: Arc<dyn Connector>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session,
            ws_base,
            directory,
            connector,
            notifier,
            clock,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            active: None,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn active_channel(&self) -> Option<&ChannelSummary> {
        self.active.as_ref().map(|active| &active.summary)
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.active.as_ref().map(|active| &active.timeline)
    }

    /// Connection state of the active channel, if any.
    pub async fn connection_state(&self) -> ConnectionState {
        match &self.active {
            Some(active) => active.manager.state().await,
            None => ConnectionState::Disconnected,
        }
    }

    pub async fn list_channels(&self) -> Result<Vec<ChannelSummary>, AppError> {
        Ok(self.directory.user_channels(&self.session.user_id).await?)
    }

    pub async fn create_channel(&self, name: &str) -> Result<ChannelSummary, AppError> {
        let summary = self
            .directory
            .create_channel(&self.session.user_id, name)
            .await?;
        self.notifier
            .notify(NoticeLevel::Info, &format!("created channel '{name}'"));
        Ok(summary)
    }

    /// Join a channel by id, returning its summary from the refreshed
    /// membership list.
    pub async fn join_channel(&self, channel_id: &str) -> Result<ChannelSummary, AppError> {
        self.directory
            .join_channel(channel_id, &self.session.user_id)
            .await?;
        let channels = self.directory.user_channels(&self.session.user_id).await?;
        channels
            .into_iter()
            .find(|channel| channel.channel_id == channel_id)
            .ok_or_else(|| AppError::UnknownChannel(channel_id.to_string()))
    }

    /// Open a channel by name: resolve it, fetch its history, then wire
    /// the live connection. Any previously active channel is torn down
    /// first so stale listeners cannot cross-talk with the new socket.
    pub async fn open_channel(&mut self, name: &str) -> Result<(), AppError> {
        self.close_channel().await;

        let channels = self.directory.user_channels(&self.session.user_id).await?;
        let summary = channels
            .into_iter()
            .find(|channel| channel.channel_name == name)
            .ok_or_else(|| AppError::UnknownChannel(name.to_string()))?;

        // History first; live frames must only ever append at the tail.
        let history = self.directory.channel_messages(&summary.channel_id).await?;
        let timeline = Timeline::from_history(history);

        let endpoint = self.channel_endpoint(&summary.channel_id)?;
        let target = ConnectionTarget::new(&self.session.username, endpoint);
        let manager = ConnectionManager::new(target, Arc::clone(&self.connector));

        // Listeners go in before connect() so the earliest frame is kept.
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let open_tx = events_tx.clone();
        manager
            .on_open(move || {
                let _ = open_tx.send(ViewEvent::Opened);
            })
            .await;
        let error_tx = events_tx.clone();
        manager
            .on_error(move |error| {
                let _ = error_tx.send(ViewEvent::ConnectionLost(error.to_string()));
            })
            .await;
        let system_tx = events_tx.clone();
        manager
            .on_system_message(move |content| {
                let _ = system_tx.send(ViewEvent::Notice(content.to_string()));
            })
            .await;
        let chat_tx = events_tx;
        manager
            .on_chat_message(move |event| {
                let _ = chat_tx.send(ViewEvent::Chat {
                    sender: event.sender.clone(),
                    content: event.content.clone(),
                });
            })
            .await;

        manager.connect().await?;

        let mut active = ActiveChannel {
            summary,
            manager,
            timeline,
            events: events_rx,
        };
        self.await_open(&mut active).await?;

        self.notifier
            .notify(NoticeLevel::Info, &format!("joined '{name}'"));
        self.active = Some(active);
        Ok(())
    }

    /// Disconnect and drop the active channel, if any. Safe to call when
    /// nothing is open.
    pub async fn close_channel(&mut self) {
        if let Some(active) = self.active.take() {
            active.manager.disconnect().await;
        }
    }

    /// Leave the active channel server-side, then tear down the view.
    pub async fn leave_channel(&mut self) -> Result<(), AppError> {
        let Some(active) = self.active.as_ref() else {
            return Err(AppError::NoActiveChannel);
        };
        let channel_id = active.summary.channel_id.clone();
        let channel_name = active.summary.channel_name.clone();
        self.directory
            .leave_channel(&channel_id, &self.session.user_id)
            .await?;
        self.close_channel().await;
        self.notifier
            .notify(NoticeLevel::Info, &format!("left '{channel_name}'"));
        Ok(())
    }

    /// Send one chat message to the active channel.
    ///
    /// Failures (most commonly `NotConnected`) surface a notice and are
    /// returned; nothing is queued for later.
    pub async fn send_chat(&self, content: &str) -> Result<(), AppError> {
        let Some(active) = self.active.as_ref() else {
            return Err(AppError::NoActiveChannel);
        };
        let frame = OutboundFrame::Chat {
            content: content.to_string(),
            channel_id: active.summary.channel_id.clone(),
            sender: self.session.username.clone(),
        };
        match active.manager.send(OutboundPayload::Frame(frame)).await {
            Ok(()) => Ok(()),
            Err(error) => {
                self.notifier
                    .notify(NoticeLevel::Error, &format!("message not sent: {error}"));
                Err(error.into())
            }
        }
    }

    /// Next live event of the active channel. Pends forever while no
    /// channel is open, so it can sit in a `select!` arm.
    pub async fn next_event(&mut self) -> Option<ViewEvent> {
        match self.active.as_mut() {
            Some(active) => active.events.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Fold one event into the timeline and notify where appropriate.
    pub fn apply_event(&mut self, event: &ViewEvent) {
        match event {
            ViewEvent::Opened => {}
            ViewEvent::Notice(content) => {
                if let Some(active) = self.active.as_mut() {
                    active.timeline.append_notice(content, &*self.clock);
                }
            }
            ViewEvent::Chat { sender, content } => {
                if let Some(active) = self.active.as_mut() {
                    active.timeline.append_chat(sender, content, &*self.clock);
                }
            }
            ViewEvent::ConnectionLost(reason) => {
                self.notifier
                    .notify(NoticeLevel::Warning, &format!("connection lost: {reason}"));
            }
        }
    }

    fn channel_endpoint(&self, channel_id: &str) -> Result<Url, AppError> {
        let raw = format!(
            "{}/{channel_id}",
            self.ws_base.as_str().trim_end_matches('/')
        );
        Url::parse(&raw).map_err(|_| AppError::BadEndpoint(raw))
    }

    /// Wait for the connection to open, within the configured timeout.
    async fn await_open(&self, active: &mut ActiveChannel) -> Result<(), AppError> {
        let ActiveChannel {
            events, timeline, ..
        } = active;
        let outcome = tokio::time::timeout(self.connect_timeout, async {
            loop {
                match events.recv().await {
                    Some(ViewEvent::Opened) => return Ok(()),
                    Some(ViewEvent::ConnectionLost(reason)) => return Err(reason),
                    // Frames cannot precede open, but keep totality anyway.
                    Some(ViewEvent::Notice(content)) => {
                        timeline.append_notice(&content, &*self.clock);
                    }
                    Some(ViewEvent::Chat { sender, content }) => {
                        timeline.append_chat(&sender, &content, &*self.clock);
                    }
                    None => return Err("event channel closed".to_string()),
                }
            }
        })
        .await;

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => {
                self.notifier
                    .notify(NoticeLevel::Error, &format!("could not connect: {reason}"));
                Err(AppError::ConnectRefused(reason))
            }
            Err(_elapsed) => {
                active.manager.disconnect().await;
                self.notifier.notify(
                    NoticeLevel::Warning,
                    "timed out waiting for the connection to open",
                );
                Err(AppError::ConnectTimeout)
            }
        }
    }
}
