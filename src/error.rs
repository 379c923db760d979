//! Error types for the session manager.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use ws_session::{Result, Error};
//!
//! fn example(session: &Session<(), Value, Value>) -> Result<()> {
//!     session.open(None)?;
//!     session.send(serde_json::json!({ "hello": true }))?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | Codec | [`Error::Encode`], [`Error::Decode`] |
//! | Lifecycle | [`Error::SessionDisposed`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when session configuration is invalid (e.g. a URL that
    /// does not parse, or a non-WebSocket scheme).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport construction or I/O failed.
    ///
    /// Fatal for the current connection attempt. The session routes this
    /// through the same path as a close event, so the reconnect policy is
    /// still consulted.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Transport is not open.
    ///
    /// Returned when an operation requires an open transport.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Codec Errors
    // ========================================================================
    /// Failed to encode an outbound message.
    #[error("Encode error: {message}")]
    Encode {
        /// Description of the encode failure.
        message: String,
    },

    /// Failed to decode an inbound wire payload.
    ///
    /// Recoverable: the previous inbound value is retained and the failure
    /// is reported, never propagated into the transport layer.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Session has been disposed.
    ///
    /// Returned when a command is submitted after `dispose`.
    #[error("Session disposed")]
    SessionDisposed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an encode error.
    #[inline]
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("bad url");
        assert_eq!(err.to_string(), "Configuration error: bad url");

        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");

        let err = Error::ConnectionClosed;
        assert_eq!(err.to_string(), "Connection closed");

        let err = Error::SessionDisposed;
        assert_eq!(err.to_string(), "Session disposed");
    }

    #[test]
    fn test_codec_error_display() {
        let err = Error::decode("unexpected token");
        assert_eq!(err.to_string(), "Decode error: unexpected token");

        let err = Error::encode("unserializable");
        assert_eq!(err.to_string(), "Encode error: unserializable");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
