//! The connection manager: state machine, frame dispatch, send path.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use url::Url;

use simplechat_shared::protocol::InboundFrame;

use super::registry::{ListenerRegistry, ListenerToken};
use super::transport::{Connector, TransportError, TransportEvent};
use super::{ChatEvent, ConnectionError, ConnectionState, ConnectionTarget, OutboundPayload};

/// Manages one logical chat connection.
///
/// Construction never connects; callers register listeners first, then
/// call [`connect`](Self::connect), so the earliest server frame cannot be
/// lost to an empty registry. A single spawned I/O task owns the transport
/// and is the only frame dispatcher, which gives the ordering guarantee:
/// frames are dispatched in arrival order and one frame's listeners finish
/// before the next frame is read.
pub struct ConnectionManager {
    target: ConnectionTarget,
    connector: Arc<dyn Connector>,
    lifecycle: Arc<Mutex<Lifecycle>>,
    listeners: Arc<Mutex<ListenerRegistry>>,
}

struct Lifecycle {
    state: ConnectionState,
    /// Bumped on every connect/disconnect; transport events carrying a
    /// stale epoch belong to a released connection and are ignored.
    epoch: u64,
    outbound: Option<mpsc::UnboundedSender<String>>,
}

impl ConnectionManager {
    pub fn new(target: ConnectionTarget, connector: Arc<dyn Connector>) -> Self {
        Self {
            target,
            connector,
            lifecycle: Arc::new(Mutex::new(Lifecycle {
                state: ConnectionState::Disconnected,
                epoch: 0,
                outbound: None,
            })),
            listeners: Arc::new(Mutex::new(ListenerRegistry::new())),
        }
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ConnectionState {
        self.lifecycle.lock().await.state
    }

    /// Open the connection.
    ///
    /// Transitions to `Connecting` and returns immediately; completion is
    /// signalled through the open/error listeners. Fails with
    /// [`ConnectionError::AlreadyActive`] unless the state is
    /// `Disconnected`.
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        let epoch = {
            let mut lifecycle = self.lifecycle.lock().await;
            if !lifecycle.state.can_connect() {
                return Err(ConnectionError::AlreadyActive(lifecycle.state));
            }
            lifecycle.state = ConnectionState::Connecting;
            lifecycle.epoch += 1;
            lifecycle.epoch
        };

        tokio::spawn(run_connection(
            Arc::clone(&self.connector),
            self.target.handshake_url(),
            epoch,
            Arc::clone(&self.lifecycle),
            Arc::clone(&self.listeners),
        ));
        Ok(())
    }

    /// Release the connection. Idempotent: disconnecting an already-closed
    /// or never-opened connection is a no-op.
    pub async fn disconnect(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.state == ConnectionState::Disconnected && lifecycle.outbound.is_none() {
            return;
        }
        // In-flight events of the released connection become stale.
        lifecycle.epoch += 1;
        lifecycle.state = ConnectionState::Disconnected;
        // Dropping the sender tells the I/O task to close the transport.
        lifecycle.outbound = None;
    }

    /// Transmit one payload. Fails fast with
    /// [`ConnectionError::NotConnected`] outside the `Connected` state;
    /// at-most-once, nothing is queued or retried.
    pub async fn send(&self, payload: OutboundPayload) -> Result<(), ConnectionError> {
        let lifecycle = self.lifecycle.lock().await;
        if !lifecycle.state.can_send() {
            return Err(ConnectionError::NotConnected(lifecycle.state));
        }
        let Some(outbound) = lifecycle.outbound.as_ref() else {
            return Err(ConnectionError::NotConnected(ConnectionState::Disconnected));
        };
        outbound
            .send(payload.into_text())
            .map_err(|_| ConnectionError::NotConnected(ConnectionState::Disconnected))
    }

    /// Register a listener for the transport-open event.
    ///
    /// Listeners run on the connection's I/O task; keep them short.
    pub async fn on_open(&self, listener: impl FnMut() + Send + 'static) -> ListenerToken {
        self.listeners.lock().await.add_open(Box::new(listener))
    }

    /// Register a listener for transport-level errors.
    pub async fn on_error(
        &self,
        listener: impl FnMut(&TransportError) + Send + 'static,
    ) -> ListenerToken {
        self.listeners.lock().await.add_error(Box::new(listener))
    }

    /// Register a listener for SYSTEM notices.
    pub async fn on_system_message(
        &self,
        listener: impl FnMut(&str) + Send + 'static,
    ) -> ListenerToken {
        self.listeners.lock().await.add_system(Box::new(listener))
    }

    /// Register a listener for CHAT messages.
    pub async fn on_chat_message(
        &self,
        listener: impl FnMut(&ChatEvent) + Send + 'static,
    ) -> ListenerToken {
        self.listeners.lock().await.add_chat(Box::new(listener))
    }

    /// Unregister a previously registered listener.
    pub async fn remove_listener(&self, token: ListenerToken) -> bool {
        self.listeners.lock().await.remove(token)
    }
}

/// What the I/O loop should do next.
enum IoDirective {
    Incoming(TransportEvent),
    Outgoing(Option<String>),
}

async fn run_connection(
    connector: Arc<dyn Connector>,
    url: Url,
    epoch: u64,
    lifecycle: Arc<Mutex<Lifecycle>>,
    listeners: Arc<Mutex<ListenerRegistry>>,
) {
    let mut transport = match connector.connect(&url).await {
        Ok(transport) => transport,
        Err(error) => {
            tracing::warn!("connection to {} failed: {}", url, error);
            if settle_disconnected(&lifecycle, epoch).await {
                listeners.lock().await.notify_error(&error);
            }
            return;
        }
    };

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    {
        let mut lc = lifecycle.lock().await;
        if lc.epoch != epoch {
            // disconnect() won the race during the handshake
            transport.close().await;
            return;
        }
        lc.state = ConnectionState::Connected;
        lc.outbound = Some(outbound_tx);
    }
    tracing::info!("connected to {}", url);
    listeners.lock().await.notify_open();

    loop {
        let directive = tokio::select! {
            event = transport.next_event() => IoDirective::Incoming(event),
            outgoing = outbound_rx.recv() => IoDirective::Outgoing(outgoing),
        };

        match directive {
            IoDirective::Incoming(TransportEvent::Text(text)) => {
                dispatch_frame(&listeners, &text).await;
            }
            IoDirective::Incoming(TransportEvent::Closed) => {
                tracing::info!("server closed the connection");
                settle_disconnected(&lifecycle, epoch).await;
                break;
            }
            IoDirective::Incoming(TransportEvent::Failed(error)) => {
                tracing::warn!("transport failure: {}", error);
                if settle_disconnected(&lifecycle, epoch).await {
                    listeners.lock().await.notify_error(&error);
                }
                break;
            }
            IoDirective::Outgoing(Some(text)) => {
                if let Err(error) = transport.send_text(text).await {
                    tracing::warn!("send failed: {}", error);
                    if settle_disconnected(&lifecycle, epoch).await {
                        listeners.lock().await.notify_error(&error);
                    }
                    break;
                }
            }
            // disconnect() dropped the sender; close gracefully
            IoDirective::Outgoing(None) => {
                transport.close().await;
                break;
            }
        }
    }
}

/// Mark the connection disconnected unless a newer connect/disconnect
/// already superseded this one. Returns whether the settle applied.
async fn settle_disconnected(lifecycle: &Arc<Mutex<Lifecycle>>, epoch: u64) -> bool {
    let mut lc = lifecycle.lock().await;
    if lc.epoch != epoch {
        return false;
    }
    lc.state = ConnectionState::Disconnected;
    lc.outbound = None;
    true
}

async fn dispatch_frame(listeners: &Arc<Mutex<ListenerRegistry>>, text: &str) {
    match InboundFrame::decode(text) {
        Ok(InboundFrame::System { content }) => {
            listeners.lock().await.notify_system(&content);
        }
        Ok(InboundFrame::Chat { sender, content }) => {
            let event = ChatEvent { sender, content };
            listeners.lock().await.notify_chat(&event);
        }
        // Malformed frames are logged and dropped; listeners never see them.
        Err(error) => tracing::debug!("{}", error),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    use url::Url;

    use simplechat_shared::protocol::OutboundFrame;

    use super::super::testing::{FakeConnector, wait_for_state, wait_until};
    use super::super::transport::TransportEvent;
    use super::*;

    fn manager_with(connector: &Arc<FakeConnector>) -> ConnectionManager {
        let endpoint = Url::parse("ws://test/chat/42").unwrap();
        let target = ConnectionTarget::new("alice", endpoint);
        ConnectionManager::new(target, Arc::clone(connector) as Arc<dyn Connector>)
    }

    fn chat_frame(sender: &str, content: &str) -> TransportEvent {
        TransportEvent::Text(format!(
            r#"{{"type":"CHAT","sender":"{sender}","content":"{content}"}}"#
        ))
    }

    #[tokio::test]
    async fn test_connect_transitions_through_connecting_to_connected() {
        // given: a handshake that completes only when the test releases it
        let connector = FakeConnector::new();
        let (gate, wire) = connector.script_gated_success();
        let manager = manager_with(&connector);
        let opened = Arc::new(AtomicUsize::new(0));
        let opened_count = Arc::clone(&opened);
        manager
            .on_open(move || {
                opened_count.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        // when:
        manager.connect().await.unwrap();

        // then: connecting until the handshake completes
        assert_eq!(manager.state().await, ConnectionState::Connecting);
        assert_eq!(opened.load(Ordering::SeqCst), 0);

        gate.send(()).unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;
        wait_until(|| opened.load(Ordering::SeqCst) == 1).await;
        drop(wire);
    }

    #[tokio::test]
    async fn test_connect_failure_fires_error_and_settles_disconnected() {
        // given:
        let connector = FakeConnector::new();
        connector.script_failure("connection refused");
        let manager = manager_with(&connector);
        let errors = Arc::new(StdMutex::new(Vec::new()));
        let error_log = Arc::clone(&errors);
        manager
            .on_error(move |e| {
                error_log.lock().unwrap().push(e.to_string());
            })
            .await;

        // when:
        manager.connect().await.unwrap();

        // then:
        wait_until(|| !errors.lock().unwrap().is_empty()).await;
        assert_eq!(manager.state().await, ConnectionState::Disconnected);
        assert!(errors.lock().unwrap()[0].contains("connection refused"));
    }

    #[tokio::test]
    async fn test_double_connect_is_rejected() {
        // given: a connection stuck in the handshake
        let connector = FakeConnector::new();
        let (_gate, _wire) = connector.script_gated_success();
        let manager = manager_with(&connector);
        manager.connect().await.unwrap();

        // when: connecting again while Connecting
        let result = manager.connect().await;

        // then:
        assert!(matches!(
            result,
            Err(ConnectionError::AlreadyActive(ConnectionState::Connecting))
        ));
    }

    #[tokio::test]
    async fn test_double_connect_rejected_while_connected() {
        // given:
        let connector = FakeConnector::new();
        let _wire = connector.script_success();
        let manager = manager_with(&connector);
        manager.connect().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;

        // when:
        let result = manager.connect().await;

        // then:
        assert!(matches!(
            result,
            Err(ConnectionError::AlreadyActive(ConnectionState::Connected))
        ));
    }

    #[tokio::test]
    async fn test_send_fails_fast_unless_connected() {
        // given: a manager that never leaves Connecting
        let connector = FakeConnector::new();
        let (_gate, mut wire) = connector.script_gated_success();
        let manager = manager_with(&connector);

        // when/then: Disconnected
        let result = manager.send(OutboundPayload::Raw("hi".to_string())).await;
        assert!(matches!(
            result,
            Err(ConnectionError::NotConnected(ConnectionState::Disconnected))
        ));

        // when/then: Connecting
        manager.connect().await.unwrap();
        let result = manager.send(OutboundPayload::Raw("hi".to_string())).await;
        assert!(matches!(
            result,
            Err(ConnectionError::NotConnected(ConnectionState::Connecting))
        ));

        // and nothing was transmitted
        assert!(wire.sent.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_raw_passes_through_and_frame_is_encoded() {
        // given:
        let connector = FakeConnector::new();
        let mut wire = connector.script_success();
        let manager = manager_with(&connector);
        manager.connect().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;

        // when:
        manager
            .send(OutboundPayload::Raw("yo".to_string()))
            .await
            .unwrap();
        manager
            .send(OutboundPayload::Frame(OutboundFrame::Chat {
                content: "hey".to_string(),
                channel_id: "42".to_string(),
                sender: "alice".to_string(),
            }))
            .await
            .unwrap();

        // then:
        let first = wire.sent.recv().await.unwrap();
        assert_eq!(first, "yo");
        let second = wire.sent.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&second).unwrap();
        assert_eq!(value["type"], "CHAT");
        assert_eq!(value["channelId"], "42");
        assert_eq!(value["sender"], "alice");
    }

    #[tokio::test]
    async fn test_frames_dispatch_in_arrival_order() {
        // given:
        let connector = FakeConnector::new();
        let wire = connector.script_success();
        let manager = manager_with(&connector);
        let received = Arc::new(StdMutex::new(Vec::new()));
        let chat_log = Arc::clone(&received);
        manager
            .on_chat_message(move |e| {
                chat_log.lock().unwrap().push(e.content.clone());
            })
            .await;
        manager.connect().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;

        // when: F1, F2, F3 delivered in that order
        wire.events.send(chat_frame("bob", "f1")).unwrap();
        wire.events.send(chat_frame("bob", "f2")).unwrap();
        wire.events.send(chat_frame("bob", "f3")).unwrap();

        // then: observed in the same order
        wait_until(|| received.lock().unwrap().len() == 3).await;
        assert_eq!(*received.lock().unwrap(), vec!["f1", "f2", "f3"]);
    }

    #[tokio::test]
    async fn test_malformed_frame_is_isolated() {
        // given:
        let connector = FakeConnector::new();
        let wire = connector.script_success();
        let manager = manager_with(&connector);
        let received = Arc::new(StdMutex::new(Vec::new()));
        let chat_log = Arc::clone(&received);
        manager
            .on_chat_message(move |e| {
                chat_log.lock().unwrap().push(e.content.clone());
            })
            .await;
        manager.connect().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;

        // when: a non-JSON frame, an unknown tag, then a well-formed CHAT
        wire.events
            .send(TransportEvent::Text("not json".to_string()))
            .unwrap();
        wire.events
            .send(TransportEvent::Text(
                r#"{"type":"PRESENCE","content":"x"}"#.to_string(),
            ))
            .unwrap();
        wire.events.send(chat_frame("bob", "hey")).unwrap();

        // then: exactly one chat-listener invocation
        wait_until(|| received.lock().unwrap().len() == 1).await;
        assert_eq!(*received.lock().unwrap(), vec!["hey"]);
        assert_eq!(manager.state().await, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_system_and_chat_frames_route_to_their_listeners() {
        // given:
        let connector = FakeConnector::new();
        let wire = connector.script_success();
        let manager = manager_with(&connector);
        let log = Arc::new(StdMutex::new(Vec::new()));
        let system_log = Arc::clone(&log);
        manager
            .on_system_message(move |content| {
                system_log.lock().unwrap().push(format!("system:{content}"));
            })
            .await;
        let chat_log = Arc::clone(&log);
        manager
            .on_chat_message(move |e| {
                chat_log
                    .lock()
                    .unwrap()
                    .push(format!("chat:{}:{}", e.sender, e.content));
            })
            .await;
        manager.connect().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;

        // when:
        wire.events
            .send(TransportEvent::Text(
                r#"{"type":"SYSTEM","content":"bob joined the chat!"}"#.to_string(),
            ))
            .unwrap();
        wire.events.send(chat_frame("bob", "hey")).unwrap();

        // then:
        wait_until(|| log.lock().unwrap().len() == 2).await;
        assert_eq!(
            *log.lock().unwrap(),
            vec!["system:bob joined the chat!", "chat:bob:hey"]
        );
    }

    #[tokio::test]
    async fn test_listener_fanout_in_registration_order() {
        // given: two chat listeners
        let connector = FakeConnector::new();
        let wire = connector.script_success();
        let manager = manager_with(&connector);
        let log = Arc::new(StdMutex::new(Vec::new()));
        for name in ["first", "second"] {
            let fanout_log = Arc::clone(&log);
            manager
                .on_chat_message(move |e| {
                    fanout_log
                        .lock()
                        .unwrap()
                        .push(format!("{name}:{}", e.content));
                })
                .await;
        }
        manager.connect().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;

        // when: one CHAT frame
        wire.events.send(chat_frame("bob", "hey")).unwrap();

        // then: both invoked exactly once, in registration order
        wait_until(|| log.lock().unwrap().len() == 2).await;
        assert_eq!(*log.lock().unwrap(), vec!["first:hey", "second:hey"]);
    }

    #[tokio::test]
    async fn test_removed_listener_no_longer_fires() {
        // given:
        let connector = FakeConnector::new();
        let wire = connector.script_success();
        let manager = manager_with(&connector);
        let log = Arc::new(StdMutex::new(Vec::new()));
        let removed_log = Arc::clone(&log);
        let token = manager
            .on_chat_message(move |e| {
                removed_log.lock().unwrap().push(e.content.clone());
            })
            .await;
        let kept_log = Arc::clone(&log);
        manager
            .on_system_message(move |content| {
                kept_log.lock().unwrap().push(content.to_string());
            })
            .await;
        manager.connect().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;

        // when:
        assert!(manager.remove_listener(token).await);
        wire.events.send(chat_frame("bob", "dropped")).unwrap();
        wire.events
            .send(TransportEvent::Text(
                r#"{"type":"SYSTEM","content":"still here"}"#.to_string(),
            ))
            .unwrap();

        // then: only the surviving listener observed anything
        wait_until(|| !log.lock().unwrap().is_empty()).await;
        assert_eq!(*log.lock().unwrap(), vec!["still here"]);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        // given: a manager that never connected
        let connector = FakeConnector::new();
        let manager = manager_with(&connector);

        // when:
        manager.disconnect().await;
        manager.disconnect().await;

        // then:
        assert_eq!(manager.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_disconnect_closes_transport_exactly_once() {
        // given:
        let connector = FakeConnector::new();
        let wire = connector.script_success();
        let manager = manager_with(&connector);
        manager.connect().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;

        // when:
        manager.disconnect().await;
        manager.disconnect().await;

        // then:
        assert_eq!(manager.state().await, ConnectionState::Disconnected);
        wait_until(|| wire.closed.load(Ordering::SeqCst) == 1).await;
        assert_eq!(wire.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transport_close_settles_disconnected() {
        // given:
        let connector = FakeConnector::new();
        let wire = connector.script_success();
        let manager = manager_with(&connector);
        manager.connect().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;

        // when: the server closes
        wire.events.send(TransportEvent::Closed).unwrap();

        // then:
        wait_for_state(&manager, ConnectionState::Disconnected).await;
    }

    #[tokio::test]
    async fn test_transport_failure_fires_error_listeners() {
        // given:
        let connector = FakeConnector::new();
        let wire = connector.script_success();
        let manager = manager_with(&connector);
        let errors = Arc::new(StdMutex::new(Vec::new()));
        let error_log = Arc::clone(&errors);
        manager
            .on_error(move |e| {
                error_log.lock().unwrap().push(e.to_string());
            })
            .await;
        manager.connect().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;

        // when:
        wire.events
            .send(TransportEvent::Failed(TransportError::Io(
                "reset by peer".to_string(),
            )))
            .unwrap();

        // then:
        wait_for_state(&manager, ConnectionState::Disconnected).await;
        wait_until(|| !errors.lock().unwrap().is_empty()).await;
        assert!(errors.lock().unwrap()[0].contains("reset by peer"));
    }

    #[tokio::test]
    async fn test_disconnect_during_handshake_discards_stale_open() {
        // given: a gated handshake
        let connector = FakeConnector::new();
        let (gate, wire) = connector.script_gated_success();
        let manager = manager_with(&connector);
        let opened = Arc::new(AtomicUsize::new(0));
        let opened_count = Arc::clone(&opened);
        manager
            .on_open(move || {
                opened_count.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        manager.connect().await.unwrap();

        // when: disconnect before the handshake completes, then release it
        manager.disconnect().await;
        gate.send(()).unwrap();

        // then: the stale transport is closed, open never fires
        wait_until(|| wire.closed.load(Ordering::SeqCst) == 1).await;
        assert_eq!(manager.state().await, ConnectionState::Disconnected);
        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reconnect_after_disconnect_takes_over_cleanly() {
        // given: a first session that was torn down
        let connector = FakeConnector::new();
        let _first = connector.script_success();
        let second = connector.script_success();
        let manager = manager_with(&connector);
        let received = Arc::new(StdMutex::new(Vec::new()));
        let chat_log = Arc::clone(&received);
        manager
            .on_chat_message(move |e| {
                chat_log.lock().unwrap().push(e.content.clone());
            })
            .await;
        manager.connect().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;
        manager.disconnect().await;

        // when: a fresh connect on the same instance
        manager.connect().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;
        second.events.send(chat_frame("bob", "again")).unwrap();

        // then:
        wait_until(|| !received.lock().unwrap().is_empty()).await;
        assert_eq!(*received.lock().unwrap(), vec!["again"]);
    }

    /// The full end-to-end scenario from the design notes: connect, open,
    /// inbound chat, raw send, disconnect.
    #[tokio::test]
    async fn test_full_session_scenario() {
        // given:
        let connector = FakeConnector::new();
        let mut wire = connector.script_success();
        let manager = manager_with(&connector);
        let opened = Arc::new(AtomicUsize::new(0));
        let opened_count = Arc::clone(&opened);
        manager
            .on_open(move || {
                opened_count.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        let received = Arc::new(StdMutex::new(Vec::new()));
        let chat_log = Arc::clone(&received);
        manager
            .on_chat_message(move |e| {
                chat_log
                    .lock()
                    .unwrap()
                    .push((e.sender.clone(), e.content.clone()));
            })
            .await;

        // when/then: connect and reach Connected, open fires once
        manager.connect().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;
        wait_until(|| opened.load(Ordering::SeqCst) == 1).await;

        // inbound chat frame reaches the chat listener
        wire.events.send(chat_frame("bob", "hey")).unwrap();
        wait_until(|| !received.lock().unwrap().is_empty()).await;
        assert_eq!(
            *received.lock().unwrap(),
            vec![("bob".to_string(), "hey".to_string())]
        );

        // raw send reaches the transport verbatim
        manager
            .send(OutboundPayload::Raw("yo".to_string()))
            .await
            .unwrap();
        assert_eq!(wire.sent.recv().await.unwrap(), "yo");

        // disconnect settles and closes exactly once
        manager.disconnect().await;
        assert_eq!(manager.state().await, ConnectionState::Disconnected);
        wait_until(|| wire.closed.load(Ordering::SeqCst) == 1).await;
        assert_eq!(opened.load(Ordering::SeqCst), 1);
    }
}
