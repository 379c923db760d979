//! Session event loop.
//!
//! A spawned task owns all mutable session state and reacts to exactly one
//! source at a time: caller commands, events from the live transport,
//! message-only events from a superseded transport while it drains, the
//! reconnect timer, and the cancellation token. State is only ever mutated
//! between `select!` rounds, so the state machine needs no locking.

// ============================================================================
// Imports
// ============================================================================

use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::time::{Sleep, sleep};
use tracing::{debug, error, trace, warn};

use crate::buffer::OutboundBuffer;
use crate::codec::WirePayload;
use crate::transport::{Connector, Transport, TransportEvent, close_code};

use super::{Command, ConnectionState, SessionConfig};

// ============================================================================
// Tick
// ============================================================================

/// One resolved `select!` round.
enum Tick<P, Out> {
    Command(Option<Command<P, Out>>),
    Live(Option<TransportEvent>),
    Drain(Option<TransportEvent>),
    ReconnectDue,
    Cancelled,
}

/// Next event from an optional transport slot; never resolves when empty.
async fn next_event<T: Transport>(slot: &mut Option<T>) -> Option<TransportEvent> {
    match slot {
        Some(transport) => transport.next_event().await,
        None => std::future::pending().await,
    }
}

/// Completion of the pending reconnect timer; never resolves when unarmed.
async fn timer_elapsed(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(deadline) => deadline.as_mut().await,
        None => std::future::pending().await,
    }
}

// ============================================================================
// SessionActor
// ============================================================================

/// Event loop owning all mutable state of one session.
pub(crate) struct SessionActor<P, In, Out, C: Connector> {
    config: SessionConfig<P, In, Out>,
    connector: C,
    command_rx: mpsc::UnboundedReceiver<Command<P, Out>>,
    open_tx: watch::Sender<bool>,
    state_tx: watch::Sender<ConnectionState>,
    message: Arc<Mutex<Option<In>>>,

    buffer: OutboundBuffer<Out>,
    payload: Option<P>,
    /// Transport whose events drive the state machine.
    live: Option<C::Transport>,
    /// Superseded transport: message events are still decoded until it
    /// terminates, everything else is detached.
    draining: Option<C::Transport>,
    transport_open: bool,
    reconnect_timer: Option<Pin<Box<Sleep>>>,
}

impl<P, In, Out, C: Connector> SessionActor<P, In, Out, C> {
    pub(crate) fn new(
        config: SessionConfig<P, In, Out>,
        connector: C,
        command_rx: mpsc::UnboundedReceiver<Command<P, Out>>,
        open_tx: watch::Sender<bool>,
        state_tx: watch::Sender<ConnectionState>,
        message: Arc<Mutex<Option<In>>>,
    ) -> Self {
        Self {
            config,
            connector,
            command_rx,
            open_tx,
            state_tx,
            message,
            buffer: OutboundBuffer::new(),
            payload: None,
            live: None,
            draining: None,
            transport_open: false,
            reconnect_timer: None,
        }
    }

    // ========================================================================
    // Event Loop
    // ========================================================================

    pub(crate) async fn run(mut self) {
        let cancellation = self.config.cancellation.clone().unwrap_or_default();
        debug!("session event loop started");

        loop {
            let tick = tokio::select! {
                _ = cancellation.cancelled() => Tick::Cancelled,
                command = self.command_rx.recv() => Tick::Command(command),
                event = next_event(&mut self.live) => Tick::Live(event),
                event = next_event(&mut self.draining) => Tick::Drain(event),
                _ = timer_elapsed(&mut self.reconnect_timer) => Tick::ReconnectDue,
            };

            match tick {
                Tick::Command(Some(Command::Open(payload))) => {
                    self.payload = payload;
                    self.start_attempt();
                }
                Tick::Command(Some(Command::Send(message))) => self.dispatch(message).await,
                Tick::Command(Some(Command::Close(code))) => self.close_transport(code).await,
                Tick::Command(Some(Command::Dispose)) => {
                    debug!("dispose requested");
                    break;
                }
                Tick::Command(None) => {
                    debug!("all session handles dropped");
                    break;
                }
                Tick::Live(event) => self.on_live_event(event).await,
                Tick::Drain(event) => self.on_drain_event(event),
                Tick::ReconnectDue => {
                    self.reconnect_timer = None;
                    debug!("reconnect timer fired");
                    self.start_attempt();
                }
                Tick::Cancelled => {
                    debug!("session cancelled");
                    break;
                }
            }
        }

        // Terminal: stop reacting. No close handshake is awaited.
        self.reconnect_timer = None;
        self.live = None;
        self.draining = None;
        self.transport_open = false;
        self.set_open(false);
        self.transition(ConnectionState::Closed);
        debug!("session event loop terminated");
    }

    // ========================================================================
    // Connection Attempts
    // ========================================================================

    /// Starts a connection attempt with the stored payload.
    ///
    /// Any previous live transport is superseded: demoted to the drain
    /// slot so its in-flight messages are still decoded while its other
    /// events can no longer drive transitions.
    fn start_attempt(&mut self) {
        if let Some(old) = self.live.take() {
            self.draining = Some(old);
        }
        self.reconnect_timer = None;
        self.transport_open = false;
        self.set_open(false);

        let url = self.config.url.resolve(self.payload.as_ref());
        match self.connector.connect(&url, &self.config.protocols) {
            Ok(transport) => {
                debug!(%url, "connection attempt started");
                self.live = Some(transport);
                self.transition(ConnectionState::Connecting);
            }
            Err(err) => {
                // Construction failure takes the same path as an abnormal
                // close, so the reconnect policy is still consulted.
                warn!(%url, error = %err, "transport construction failed");
                self.handle_closed(close_code::ABNORMAL);
            }
        }
    }

    /// Routes a close with `code` through the reconnect policy.
    fn handle_closed(&mut self, code: u16) {
        self.transport_open = false;
        self.set_open(false);

        match self.config.reconnect.delay_after(code) {
            Some(delay) => {
                debug!(code, delay_ms = delay.as_millis() as u64, "reconnect scheduled");
                // Re-arming replaces any pending timer: last close wins.
                self.reconnect_timer = Some(Box::pin(sleep(delay)));
                self.transition(ConnectionState::ReconnectScheduled);
            }
            None => {
                debug!(code, "connection closed");
                self.reconnect_timer = None;
                self.transition(ConnectionState::Closed);
            }
        }
    }

    // ========================================================================
    // Transport Events
    // ========================================================================

    async fn on_live_event(&mut self, event: Option<TransportEvent>) {
        match event {
            Some(TransportEvent::Opened) => {
                self.transport_open = true;
                self.set_open(true);
                self.transition(ConnectionState::Open);
                self.flush_buffer().await;
            }
            Some(TransportEvent::Message(payload)) => {
                self.decode_inbound(&payload);
                // Idempotent refresh of the open flag.
                self.set_open(self.transport_open);
            }
            Some(TransportEvent::Closed { code }) => {
                self.live = None;
                self.handle_closed(code);
            }
            Some(TransportEvent::Error(err)) => {
                warn!(error = %err, "transport failed");
                self.live = None;
                self.handle_closed(close_code::ABNORMAL);
            }
            None => {
                self.live = None;
                self.handle_closed(close_code::ABNORMAL);
            }
        }
    }

    /// Events from a superseded transport: in-flight messages are still
    /// decoded, everything else is detached from the state machine.
    fn on_drain_event(&mut self, event: Option<TransportEvent>) {
        match event {
            Some(TransportEvent::Message(payload)) => self.decode_inbound(&payload),
            Some(TransportEvent::Opened) => {}
            Some(TransportEvent::Closed { .. }) | Some(TransportEvent::Error(_)) | None => {
                trace!("superseded transport terminated");
                self.draining = None;
            }
        }
    }

    fn decode_inbound(&mut self, payload: &WirePayload) {
        match self.config.codec.decode(payload) {
            Ok(message) => {
                *self.message.lock() = Some(message);
            }
            Err(err) => {
                error!(error = %err, "failed to decode inbound message");
                if let Some(report) = &self.config.on_decode_error {
                    report(payload, &err);
                }
            }
        }
    }

    // ========================================================================
    // Outbound Path
    // ========================================================================

    /// Transmits immediately when open, otherwise buffers until the next
    /// transition into `Open`.
    async fn dispatch(&mut self, message: Out) {
        if self.transport_open && self.live.is_some() {
            self.transmit(message).await;
        } else {
            self.buffer.push(message);
            trace!(buffered = self.buffer.len(), "message buffered until open");
        }
    }

    async fn transmit(&mut self, message: Out) {
        let Some(transport) = self.live.as_mut() else {
            self.buffer.push(message);
            return;
        };

        match self.config.codec.encode(&message) {
            Ok(payload) => {
                if let Err(err) = transport.send(payload).await {
                    // The transport is going down; its close event will
                    // follow. Remaining flush items re-buffer.
                    warn!(error = %err, "transport send failed, message dropped");
                    self.transport_open = false;
                    self.set_open(false);
                }
            }
            Err(err) => {
                error!(error = %err, "failed to encode outbound message");
            }
        }
    }

    /// Drains one buffer pass in FIFO order.
    ///
    /// Messages re-buffered while the pass is transmitted (transport
    /// dropped mid-flush) belong to the next pass.
    async fn flush_buffer(&mut self) {
        let pass = self.buffer.take_pass();
        if pass.is_empty() {
            return;
        }

        debug!(count = pass.len(), "flushing buffered messages");
        for message in pass {
            if self.transport_open && self.live.is_some() {
                self.transmit(message).await;
            } else {
                self.buffer.push(message);
            }
        }
    }

    async fn close_transport(&mut self, code: Option<u16>) {
        let code = code.unwrap_or(self.config.default_close_code);
        if let Some(transport) = self.live.as_mut() {
            debug!(code, "closing transport");
            if let Err(err) = transport.close(code).await {
                warn!(error = %err, "transport close failed");
            }
        }
        // State transitions ride on the resulting close event.
    }

    // ========================================================================
    // Observable State
    // ========================================================================

    fn transition(&mut self, next: ConnectionState) {
        let previous = *self.state_tx.borrow();
        if previous != next {
            debug!(from = %previous, to = %next, "connection state changed");
            let _ = self.state_tx.send_replace(next);
        }
    }

    fn set_open(&mut self, open: bool) {
        self.open_tx.send_if_modified(|current| {
            if *current == open {
                false
            } else {
                *current = open;
                true
            }
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
