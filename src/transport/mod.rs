//! Transport layer.
//!
//! A transport is one underlying duplex connection instance (open, close,
//! send, message semantics — analogous to a single WebSocket connection).
//! The session never talks to a socket directly; it consumes the
//! [`Transport`] trait and constructs instances through a [`Connector`]
//! (transport factory capability), so tests can substitute a scripted
//! in-memory transport.
//!
//! # Event Model
//!
//! The four assignable callback slots of a browser-style socket
//! (`onopen`, `onmessage`, `onclose`, `onerror`) are rendered as a single
//! pulled event source: [`Transport::next_event`] yields
//! [`TransportEvent`]s until the transport terminates.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `ws` | WebSocket transport over tokio-tungstenite |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket transport implementation.
pub mod ws;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use ws::{WsConnector, WsTransport};

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::codec::WirePayload;
use crate::error::{Error, Result};

// ============================================================================
// Close Codes
// ============================================================================

/// Well-known WebSocket close codes used by the session manager.
pub mod close_code {
    /// Normal closure (1000). Default code for caller-initiated close.
    pub const NORMAL: u16 = 1000;

    /// Going away (1001). In the default skip set: never reconnect.
    pub const GOING_AWAY: u16 = 1001;

    /// No status received (1005). In the default skip set: never reconnect.
    pub const NO_STATUS: u16 = 1005;

    /// Abnormal closure (1006). Also used for construction failures, which
    /// are routed through the close-handling path.
    pub const ABNORMAL: u16 = 1006;
}

// ============================================================================
// TransportEvent
// ============================================================================

/// Lifecycle event emitted by a transport instance.
#[derive(Debug)]
pub enum TransportEvent {
    /// The connection handshake completed; the transport can now send.
    Opened,

    /// An inbound wire payload arrived.
    Message(WirePayload),

    /// The connection closed with the given close code.
    Closed {
        /// Transport close code (1005 when the peer sent no status).
        code: u16,
    },

    /// The transport failed. Terminal for this instance; the session
    /// treats it like an abnormal close.
    Error(Error),
}

// ============================================================================
// Transport
// ============================================================================

/// One underlying duplex connection instance.
///
/// Exclusively owned by the session for the duration of one connection
/// attempt. A fresh instance is constructed for every (re)connect.
#[async_trait]
pub trait Transport: Send {
    /// Transmits a wire payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the transport is not open,
    /// or the underlying I/O error.
    async fn send(&mut self, payload: WirePayload) -> Result<()>;

    /// Initiates the close handshake with the given close code.
    ///
    /// The resulting [`TransportEvent::Closed`] is still delivered through
    /// [`Transport::next_event`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the transport is not open.
    async fn close(&mut self, code: u16) -> Result<()>;

    /// Waits for the next lifecycle event.
    ///
    /// Returns `None` once the transport has terminated and no further
    /// events will be produced.
    async fn next_event(&mut self) -> Option<TransportEvent>;
}

// ============================================================================
// Connector
// ============================================================================

/// Transport factory capability.
///
/// Given a resolved URL and the requested subprotocols, synchronously
/// constructs a new [`Transport`]. Construction failures are fatal for the
/// current attempt; the session routes them through the same path as an
/// abnormal close, so the reconnect policy still applies.
pub trait Connector: Send + 'static {
    /// Transport type produced by this connector.
    type Transport: Transport + 'static;

    /// Constructs a new transport instance.
    ///
    /// The instance performs its handshake lazily and emits
    /// [`TransportEvent::Opened`] once the connection is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] or [`Error::Connection`] when the
    /// transport cannot be constructed.
    fn connect(&mut self, url: &str, protocols: &[String]) -> Result<Self::Transport>;
}
