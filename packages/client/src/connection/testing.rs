//! Scripted transport doubles for connection tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use url::Url;

use super::ConnectionState;
use super::manager::ConnectionManager;
use super::transport::{Connector, Transport, TransportError, TransportEvent};

const WAIT_BUDGET: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Handles the test keeps to drive and observe one scripted transport.
pub(crate) struct FakeWire {
    /// Feed inbound transport events (frames, close, failure).
    pub events: mpsc::UnboundedSender<TransportEvent>,
    /// Observe text the manager transmitted.
    pub sent: mpsc::UnboundedReceiver<String>,
    /// Number of times the transport was closed.
    pub closed: Arc<AtomicUsize>,
}

struct FakeTransport {
    events: mpsc::UnboundedReceiver<TransportEvent>,
    sent: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl Transport for FakeTransport {
    async fn next_event(&mut self) -> TransportEvent {
        match self.events.recv().await {
            Some(event) => event,
            // the test dropped its FakeWire; treat it as a peer close
            None => TransportEvent::Closed,
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sent
            .send(text)
            .map_err(|_| TransportError::Io("sink gone".to_string()))
    }

    async fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct ScriptedConnect {
    gate: Option<oneshot::Receiver<()>>,
    result: Result<Box<dyn Transport>, TransportError>,
}

/// Connector whose connection attempts are scripted by the test, in order.
pub(crate) struct FakeConnector {
    scripts: StdMutex<VecDeque<ScriptedConnect>>,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            scripts: StdMutex::new(VecDeque::new()),
        })
    }

    fn wire() -> (Box<dyn Transport>, FakeWire) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicUsize::new(0));
        let transport = FakeTransport {
            events: events_rx,
            sent: sent_tx,
            closed: Arc::clone(&closed),
        };
        (
            Box::new(transport),
            FakeWire {
                events: events_tx,
                sent: sent_rx,
                closed,
            },
        )
    }

    /// Script the next attempt to succeed immediately.
    pub fn script_success(&self) -> FakeWire {
        let (transport, wire) = Self::wire();
        self.scripts.lock().unwrap().push_back(ScriptedConnect {
            gate: None,
            result: Ok(transport),
        });
        wire
    }

    /// Script the next attempt to park until the returned gate fires.
    pub fn script_gated_success(&self) -> (oneshot::Sender<()>, FakeWire) {
        let (gate_tx, gate_rx) = oneshot::channel();
        let (transport, wire) = Self::wire();
        self.scripts.lock().unwrap().push_back(ScriptedConnect {
            gate: Some(gate_rx),
            result: Ok(transport),
        });
        (gate_tx, wire)
    }

    /// Script the next attempt to fail the handshake.
    pub fn script_failure(&self, message: &str) {
        self.scripts.lock().unwrap().push_back(ScriptedConnect {
            gate: None,
            result: Err(TransportError::Handshake(message.to_string())),
        });
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, _url: &Url) -> Result<Box<dyn Transport>, TransportError> {
        let script = self.scripts.lock().unwrap().pop_front();
        let Some(script) = script else {
            return Err(TransportError::Handshake(
                "no scripted connection".to_string(),
            ));
        };
        if let Some(gate) = script.gate {
            // a dropped gate also releases the handshake
            let _ = gate.await;
        }
        script.result
    }
}

/// Poll until the manager reaches the expected state, within a budget.
pub(crate) async fn wait_for_state(manager: &ConnectionManager, expected: ConnectionState) {
    let result = tokio::time::timeout(WAIT_BUDGET, async {
        loop {
            if manager.state().await == expected {
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for state {expected}");
}

/// Poll until the condition holds, within a budget.
pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
    let result = tokio::time::timeout(WAIT_BUDGET, async {
        loop {
            if condition() {
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for condition");
}
