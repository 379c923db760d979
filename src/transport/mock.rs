//! Scripted in-memory transport for unit tests.
//!
//! The mock hub stands in for the network: tests inspect every connect
//! call, feed lifecycle events to each constructed transport instance,
//! and observe what the session transmitted, all without sockets.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::codec::WirePayload;
use crate::error::{Error, Result};

use super::{Connector, Transport, TransportEvent};

// ============================================================================
// MockHub
// ============================================================================

/// Records every connect call and hands out per-instance handles.
pub(crate) struct MockHub {
    inner: Mutex<HubInner>,
}

struct HubInner {
    connects: Vec<ConnectRecord>,
    handles: Vec<Arc<MockHandle>>,
    fail_next: bool,
}

/// One recorded `Connector::connect` invocation.
#[derive(Debug, Clone)]
pub(crate) struct ConnectRecord {
    pub url: String,
    pub protocols: Vec<String>,
}

impl MockHub {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(HubInner {
                connects: Vec::new(),
                handles: Vec::new(),
                fail_next: false,
            }),
        })
    }

    /// Creates a connector backed by this hub.
    pub(crate) fn connector(self: &Arc<Self>) -> MockConnector {
        MockConnector {
            hub: Arc::clone(self),
        }
    }

    /// Makes the next connect call fail with a connection error.
    pub(crate) fn fail_next_connect(&self) {
        self.inner.lock().fail_next = true;
    }

    pub(crate) fn connect_count(&self) -> usize {
        self.inner.lock().connects.len()
    }

    pub(crate) fn connect_record(&self, index: usize) -> ConnectRecord {
        self.inner.lock().connects[index].clone()
    }

    /// Handle for the `index`-th constructed transport.
    pub(crate) fn handle(&self, index: usize) -> Arc<MockHandle> {
        Arc::clone(&self.inner.lock().handles[index])
    }

    /// Yields to the scheduler until `predicate` holds.
    ///
    /// Bounded so a broken test fails instead of hanging.
    pub(crate) async fn wait_until(&self, predicate: impl Fn(&Self) -> bool) {
        for _ in 0..10_000 {
            if predicate(self) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("mock hub condition not reached");
    }
}

// ============================================================================
// MockHandle
// ============================================================================

/// Test-side handle to one constructed transport instance.
pub(crate) struct MockHandle {
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    sent: Mutex<Vec<WirePayload>>,
    closed_with: Mutex<Option<u16>>,
    fail_sends: AtomicBool,
}

impl MockHandle {
    /// Makes every subsequent `send` on this instance fail.
    pub(crate) fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Emits the handshake-completed event.
    pub(crate) fn emit_open(&self) {
        let _ = self.events_tx.send(TransportEvent::Opened);
    }

    /// Emits an inbound payload.
    pub(crate) fn emit_message(&self, payload: WirePayload) {
        let _ = self.events_tx.send(TransportEvent::Message(payload));
    }

    /// Emits a close event with the given code.
    pub(crate) fn emit_close(&self, code: u16) {
        let _ = self.events_tx.send(TransportEvent::Closed { code });
    }

    /// Emits a transport error event.
    pub(crate) fn emit_error(&self, error: Error) {
        let _ = self.events_tx.send(TransportEvent::Error(error));
    }

    /// Everything the session transmitted through this instance.
    pub(crate) fn sent(&self) -> Vec<WirePayload> {
        self.sent.lock().clone()
    }

    /// Close code the session passed to `close`, if any.
    pub(crate) fn closed_with(&self) -> Option<u16> {
        *self.closed_with.lock()
    }
}

// ============================================================================
// MockConnector
// ============================================================================

pub(crate) struct MockConnector {
    hub: Arc<MockHub>,
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    fn connect(&mut self, url: &str, protocols: &[String]) -> Result<MockTransport> {
        let mut inner = self.hub.inner.lock();

        if inner.fail_next {
            inner.fail_next = false;
            return Err(Error::connection("mock connect failure"));
        }

        inner.connects.push(ConnectRecord {
            url: url.to_owned(),
            protocols: protocols.to_vec(),
        });

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let handle = Arc::new(MockHandle {
            events_tx,
            sent: Mutex::new(Vec::new()),
            closed_with: Mutex::new(None),
            fail_sends: AtomicBool::new(false),
        });
        inner.handles.push(Arc::clone(&handle));

        Ok(MockTransport { handle, events_rx })
    }
}

// ============================================================================
// MockTransport
// ============================================================================

pub(crate) struct MockTransport {
    handle: Arc<MockHandle>,
    events_rx: mpsc::UnboundedReceiver<TransportEvent>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, payload: WirePayload) -> Result<()> {
        if self.handle.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed);
        }
        self.handle.sent.lock().push(payload);
        Ok(())
    }

    async fn close(&mut self, code: u16) -> Result<()> {
        *self.handle.closed_with.lock() = Some(code);
        // The peer acknowledges the close handshake with the same code.
        self.handle.emit_close(code);
        Ok(())
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events_rx.recv().await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_connects_and_sends() {
        let hub = MockHub::new();
        let mut connector = hub.connector();

        let mut transport = connector
            .connect("ws://mock/1", &["proto-a".to_string()])
            .expect("connect");

        assert_eq!(hub.connect_count(), 1);
        assert_eq!(hub.connect_record(0).url, "ws://mock/1");
        assert_eq!(hub.connect_record(0).protocols, vec!["proto-a"]);

        transport
            .send(WirePayload::Text("x".into()))
            .await
            .expect("send");
        assert_eq!(hub.handle(0).sent(), vec![WirePayload::Text("x".into())]);
    }

    #[tokio::test]
    async fn test_mock_delivers_scripted_events() {
        let hub = MockHub::new();
        let mut transport = hub.connector().connect("ws://mock", &[]).expect("connect");
        let handle = hub.handle(0);

        handle.emit_open();
        handle.emit_message(WirePayload::Text("in".into()));
        handle.emit_close(1000);

        assert!(matches!(
            transport.next_event().await,
            Some(TransportEvent::Opened)
        ));
        assert!(matches!(
            transport.next_event().await,
            Some(TransportEvent::Message(_))
        ));
        assert!(matches!(
            transport.next_event().await,
            Some(TransportEvent::Closed { code: 1000 })
        ));
    }

    #[tokio::test]
    async fn test_mock_fail_next_connect() {
        let hub = MockHub::new();
        let mut connector = hub.connector();

        hub.fail_next_connect();
        assert!(connector.connect("ws://mock", &[]).is_err());
        // Only the failure was consumed; the next connect succeeds.
        assert!(connector.connect("ws://mock", &[]).is_ok());
        assert_eq!(hub.connect_count(), 1);
    }
}
