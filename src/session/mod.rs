//! Connection session: configuration and the caller-facing handle.
//!
//! A [`Session`] owns the lifecycle of one logical connection intent. It
//! wraps a transport instance with automatic reconnection, outbound
//! buffering, and observable connection state. The heavy lifting happens
//! in an internal event-loop task (see `actor`); the handle itself is
//! cheap to clone and never blocks.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::{Value, json};
//! use ws_session::{ReconnectConfig, Result, Session, SessionConfig};
//!
//! # async fn example() -> Result<()> {
//! let config: SessionConfig<(), Value, Value> =
//!     SessionConfig::new("ws://127.0.0.1:9001").reconnect(ReconnectConfig::enabled());
//!
//! let session = Session::new(config);
//! session.open(())?;
//! // Queued until the connection opens, then flushed in order.
//! session.send(json!({ "kind": "hello" }))?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod actor;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::codec::{Codec, WirePayload};
use crate::error::{Error, Result};
use crate::reconnect::ReconnectConfig;
use crate::transport::{Connector, WsConnector, close_code};

use actor::SessionActor;

// ============================================================================
// ConnectionState
// ============================================================================

/// Session-wide connection state.
///
/// Exactly one value at any time, derived from transport events; never set
/// directly by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport, no pending reconnect.
    Closed,
    /// A transport instance exists but its handshake has not completed.
    Connecting,
    /// The transport is open; sends transmit immediately.
    Open,
    /// The connection dropped and a reconnect timer is armed.
    ReconnectScheduled,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::ReconnectScheduled => write!(f, "reconnect-scheduled"),
        }
    }
}

// ============================================================================
// UrlProvider
// ============================================================================

/// Connection URL source: a fixed string or a resolver over the payload.
///
/// The resolver receives the payload supplied to the most recent `open`
/// call (or `None`), on every attempt including reconnects.
pub enum UrlProvider<P> {
    /// Same URL for every attempt.
    Fixed(String),
    /// URL derived from the connection payload.
    Resolver(Box<dyn Fn(Option<&P>) -> String + Send>),
}

impl<P> UrlProvider<P> {
    /// Creates a payload-derived URL provider.
    pub fn resolver(resolve: impl Fn(Option<&P>) -> String + Send + 'static) -> Self {
        Self::Resolver(Box::new(resolve))
    }

    /// Resolves the URL for one connection attempt.
    pub(crate) fn resolve(&self, payload: Option<&P>) -> String {
        match self {
            Self::Fixed(url) => url.clone(),
            Self::Resolver(resolve) => resolve(payload),
        }
    }
}

impl<P> From<String> for UrlProvider<P> {
    #[inline]
    fn from(url: String) -> Self {
        Self::Fixed(url)
    }
}

impl<P> From<&str> for UrlProvider<P> {
    #[inline]
    fn from(url: &str) -> Self {
        Self::Fixed(url.to_owned())
    }
}

impl<P> fmt::Debug for UrlProvider<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(url) => f.debug_tuple("Fixed").field(url).finish(),
            Self::Resolver(_) => f.debug_tuple("Resolver").finish_non_exhaustive(),
        }
    }
}

// ============================================================================
// SessionConfig
// ============================================================================

/// Callback receiving `(offending payload, error)` for each decode failure.
pub type DecodeErrorHandler = Box<dyn Fn(&WirePayload, &Error) + Send>;

/// Configuration for a [`Session`].
///
/// `P` is the connection payload type, `In` the inbound message type and
/// `Out` the outbound message type.
pub struct SessionConfig<P, In, Out> {
    pub(crate) url: UrlProvider<P>,
    pub(crate) protocols: Vec<String>,
    pub(crate) default_close_code: u16,
    pub(crate) codec: Codec<In, Out>,
    pub(crate) reconnect: ReconnectConfig,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) on_decode_error: Option<DecodeErrorHandler>,
}

impl<P, In, Out> SessionConfig<P, In, Out>
where
    In: DeserializeOwned,
    Out: Serialize,
{
    /// Creates a configuration with the default JSON codec.
    #[must_use]
    pub fn new(url: impl Into<UrlProvider<P>>) -> Self {
        Self::with_codec(url, Codec::json())
    }
}

impl<P, In, Out> SessionConfig<P, In, Out> {
    /// Creates a configuration with a custom codec.
    #[must_use]
    pub fn with_codec(url: impl Into<UrlProvider<P>>, codec: Codec<In, Out>) -> Self {
        Self {
            url: url.into(),
            protocols: Vec::new(),
            default_close_code: close_code::NORMAL,
            codec,
            reconnect: ReconnectConfig::default(),
            cancellation: None,
            on_decode_error: None,
        }
    }

    /// Sets the WebSocket subprotocols requested on every attempt.
    #[inline]
    #[must_use]
    pub fn protocols(mut self, protocols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the close code used when `close` is called without one.
    #[inline]
    #[must_use]
    pub fn default_close_code(mut self, code: u16) -> Self {
        self.default_close_code = code;
        self
    }

    /// Sets the reconnection policy.
    #[inline]
    #[must_use]
    pub fn reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Attaches an external cancellation token.
    ///
    /// Cancellation is "stop reacting": the pending reconnect timer is
    /// cancelled and the transports are dropped, but no close handshake is
    /// awaited.
    #[inline]
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Sets the decode-failure reporting collaborator.
    ///
    /// Decode failures are always logged as well.
    #[must_use]
    pub fn on_decode_error(mut self, report: impl Fn(&WirePayload, &Error) + Send + 'static) -> Self {
        self.on_decode_error = Some(Box::new(report));
        self
    }
}

impl<P, In, Out> fmt::Debug for SessionConfig<P, In, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("url", &self.url)
            .field("protocols", &self.protocols)
            .field("default_close_code", &self.default_close_code)
            .field("reconnect", &self.reconnect)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Command
// ============================================================================

/// Caller commands submitted to the event loop.
pub(crate) enum Command<P, Out> {
    /// Store a new payload and start a connection attempt.
    Open(Option<P>),
    /// Transmit immediately or buffer until open.
    Send(Out),
    /// Close the live transport with the given or default code.
    Close(Option<u16>),
    /// Terminal shutdown.
    Dispose,
}

// ============================================================================
// Session
// ============================================================================

/// Handle to a connection session.
///
/// Cloneable and shareable across tasks; all operations are non-blocking.
/// Dropping every handle disposes the session.
pub struct Session<P, In, Out> {
    command_tx: mpsc::UnboundedSender<Command<P, Out>>,
    open_rx: watch::Receiver<bool>,
    state_rx: watch::Receiver<ConnectionState>,
    message: Arc<Mutex<Option<In>>>,
}

impl<P, In, Out> Clone for Session<P, In, Out> {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            open_rx: self.open_rx.clone(),
            state_rx: self.state_rx.clone(),
            message: Arc::clone(&self.message),
        }
    }
}

impl<P, In, Out> Session<P, In, Out>
where
    P: Send + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    /// Creates a session over the WebSocket transport.
    ///
    /// Spawns the event-loop task internally; the connection is not
    /// attempted until [`Session::open`] is called.
    #[must_use]
    pub fn new(config: SessionConfig<P, In, Out>) -> Self {
        Self::with_connector(config, WsConnector::new())
    }

    /// Creates a session over a custom transport factory.
    #[must_use]
    pub fn with_connector<C>(config: SessionConfig<P, In, Out>, connector: C) -> Self
    where
        C: Connector,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (open_tx, open_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Closed);
        let message = Arc::new(Mutex::new(None));

        let actor = SessionActor::new(
            config,
            connector,
            command_rx,
            open_tx,
            state_tx,
            Arc::clone(&message),
        );
        tokio::spawn(actor.run());

        Self {
            command_tx,
            open_rx,
            state_rx,
            message,
        }
    }
}

impl<P, In, Out> Session<P, In, Out> {
    /// Stores `payload` and starts a connection attempt.
    ///
    /// The payload is threaded through every reconnect until the next
    /// `open` call replaces it. Calling `open` while connected supersedes
    /// the current transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionDisposed`] if the session has been disposed.
    pub fn open(&self, payload: impl Into<Option<P>>) -> Result<()> {
        self.submit(Command::Open(payload.into()))
    }

    /// Sends a message, or buffers it until the connection opens.
    ///
    /// Buffered messages are flushed in send-call order on (re)connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionDisposed`] if the session has been disposed.
    pub fn send(&self, message: Out) -> Result<()> {
        self.submit(Command::Send(message))
    }

    /// Closes the live transport.
    ///
    /// Uses the configured default close code when `code` is `None`. Does
    /// not clear the outbound buffer; the resulting close event still
    /// consults the reconnect policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionDisposed`] if the session has been disposed.
    pub fn close(&self, code: impl Into<Option<u16>>) -> Result<()> {
        self.submit(Command::Close(code.into()))
    }

    /// Disposes the session. Terminal.
    ///
    /// Cancels any pending reconnect timer and drops the transports.
    /// Subsequent commands return [`Error::SessionDisposed`].
    pub fn dispose(&self) {
        let _ = self.command_tx.send(Command::Dispose);
    }

    /// Returns `true` if the transport is currently open.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.open_rx.borrow()
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Subscribes to open-flag changes.
    #[inline]
    #[must_use]
    pub fn watch_open(&self) -> watch::Receiver<bool> {
        self.open_rx.clone()
    }

    /// Subscribes to connection-state changes.
    #[inline]
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    fn submit(&self, command: Command<P, Out>) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| Error::SessionDisposed)
    }
}

impl<P, In, Out> Session<P, In, Out>
where
    In: Clone,
{
    /// Returns the most recently decoded inbound message, if any.
    ///
    /// Only the latest message is retained; history is not kept. A decode
    /// failure leaves the previous value in place.
    #[must_use]
    pub fn last_message(&self) -> Option<In> {
        self.message.lock().clone()
    }
}
