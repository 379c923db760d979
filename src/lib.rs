//! Resilient WebSocket session management.
//!
//! This library wraps a raw duplex message connection (WebSocket) with
//! automatic reconnection, outbound message buffering, and observable
//! connection state.
//!
//! # Architecture
//!
//! A [`Session`] is a cheap, cloneable handle; all connection state lives
//! in an internal event-loop task:
//!
//! ```text
//! ┌──────────────┐  commands   ┌───────────────────┐  connect   ┌────────────┐
//! │  Session     │────────────►│  event loop       │───────────►│  Connector │
//! │  (handle)    │             │                   │            └─────┬──────┘
//! │              │◄────────────│  state machine    │◄─────────────────┘
//! └──────────────┘  watch /    │  reconnect timer  │  events    (one Transport
//!                   last msg   │  outbound buffer  │             per attempt)
//!                              └───────────────────┘
//! ```
//!
//! Key design principles:
//!
//! - One live transport instance per attempt; reconnection supersedes the
//!   previous instance without relying on its final events
//! - Messages sent while disconnected are buffered and flushed in order
//!   on (re)connection
//! - Serialize/deserialize are injected function slots ([`Codec`]), not
//!   a built-in wire protocol
//! - Decode failures are reported, never thrown into the transport layer
//!
//! # Quick Start
//!
//! ```no_run
//! use serde_json::{Value, json};
//! use ws_session::{ReconnectConfig, Result, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config: SessionConfig<(), Value, Value> =
//!         SessionConfig::new("ws://127.0.0.1:9001")
//!             .reconnect(ReconnectConfig::enabled());
//!
//!     let session = Session::new(config);
//!     session.open(())?;
//!
//!     // Buffered until the connection opens, then flushed in order.
//!     session.send(json!({ "kind": "subscribe", "channel": "ticker" }))?;
//!
//!     // Observe the connection state without polling.
//!     let mut open = session.watch_open();
//!     open.changed().await.ok();
//!     println!("open: {}", *open.borrow());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`buffer`] | FIFO outbound message buffer |
//! | [`codec`] | Pluggable serialize/deserialize slots |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`reconnect`] | Reconnect policy |
//! | [`session`] | Connection session: config, handle, state machine |
//! | [`transport`] | Transport trait and WebSocket implementation |

// ============================================================================
// Modules
// ============================================================================

/// FIFO outbound message buffer.
///
/// Holds messages sent while the connection is not open; drained in
/// passes on every transition into the open state.
pub mod buffer;

/// Pluggable serialize/deserialize function slots.
///
/// Use [`Codec::json`] for the default JSON codec, or inject custom
/// encode/decode functions.
pub mod codec;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Reconnect policy.
///
/// Pure decision logic from close codes to reconnect delays.
pub mod reconnect;

/// Connection session.
///
/// [`Session`] is the caller-facing handle; the state machine runs in an
/// internal event-loop task.
pub mod session;

/// Transport layer.
///
/// The [`Transport`]/[`Connector`] seam plus the tokio-tungstenite
/// WebSocket implementation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Session types
pub use session::{ConnectionState, DecodeErrorHandler, Session, SessionConfig, UrlProvider};

// Codec types
pub use codec::{Codec, DecodeFn, EncodeFn, WirePayload};

// Buffer types
pub use buffer::OutboundBuffer;

// Reconnect types
pub use reconnect::{DEFAULT_RECONNECT_TIMEOUT, DEFAULT_SKIP_CODES, ReconnectConfig};

// Transport types
pub use transport::{Connector, Transport, TransportEvent, WsConnector, WsTransport, close_code};

// Error types
pub use error::{Error, Result};
