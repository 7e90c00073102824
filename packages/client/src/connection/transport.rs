//! Transport seam between the connection manager and the wire.
//!
//! The manager only ever sees [`Transport`] and [`Connector`]; the
//! production implementation rides tokio-tungstenite, tests substitute a
//! scripted fake.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};
use url::Url;

/// Transport-level failures.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The WebSocket handshake never completed (DNS, refused, TLS, HTTP).
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The established connection failed mid-flight.
    #[error("transport failure: {0}")]
    Io(String),
}

/// One observation from an established transport.
#[derive(Debug)]
pub enum TransportEvent {
    /// A UTF-8 text frame, delivered in arrival order.
    Text(String),
    /// Orderly close from the peer (or end of stream).
    Closed,
    /// Read failure; the transport is unusable afterwards.
    Failed(TransportError),
}

/// An established, exclusively-owned connection.
#[async_trait]
pub trait Transport: Send {
    /// Wait for the next event. Cancel-safe.
    async fn next_event(&mut self) -> TransportEvent;

    /// Transmit one text frame immediately.
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Close gracefully. Errors during close are ignored.
    async fn close(&mut self);
}

/// Opens transports for a connection manager.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>, TransportError>;
}

/// Production connector backed by tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>, TransportError> {
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;
        Ok(Box::new(WsTransport { stream }))
    }
}

struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn next_event(&mut self) -> TransportEvent {
        loop {
            match self.stream.next().await {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    return TransportEvent::Text(text.to_string());
                }
                Some(Ok(tungstenite::Message::Binary(data))) => {
                    tracing::debug!("dropping unexpected {}-byte binary frame", data.len());
                }
                Some(Ok(tungstenite::Message::Close(_))) | None => return TransportEvent::Closed,
                // ping/pong are answered by tungstenite itself
                Some(Ok(_)) => {}
                Some(Err(e)) => return TransportEvent::Failed(TransportError::Io(e.to_string())),
            }
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(tungstenite::Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}
