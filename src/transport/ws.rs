//! WebSocket transport over tokio-tungstenite.
//!
//! [`WsConnector`] validates the URL and builds the client request
//! synchronously; the returned [`WsTransport`] performs the TCP +
//! WebSocket handshake lazily, emitting [`TransportEvent::Opened`] once
//! the connection is usable. A handshake failure surfaces as a
//! [`TransportEvent::Error`], which the session routes through the same
//! path as an abnormal close.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::pin::Pin;
use std::result::Result as StdResult;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Response;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};
use url::Url;

use async_trait::async_trait;

use crate::codec::WirePayload;
use crate::error::{Error, Result};

use super::{Connector, Transport, TransportEvent, close_code};

// ============================================================================
// Types
// ============================================================================

/// Underlying stream type produced by the handshake.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// In-flight handshake future.
type ConnectFuture =
    Pin<Box<dyn Future<Output = StdResult<(WsStream, Response), WsError>> + Send>>;

// ============================================================================
// WsConnector
// ============================================================================

/// Transport factory producing [`WsTransport`] instances.
#[derive(Debug, Default)]
pub struct WsConnector;

impl WsConnector {
    /// Creates a new connector.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WsConnector {
    type Transport = WsTransport;

    fn connect(&mut self, url: &str, protocols: &[String]) -> Result<WsTransport> {
        let parsed =
            Url::parse(url).map_err(|e| Error::config(format!("invalid URL {url:?}: {e}")))?;

        match parsed.scheme() {
            "ws" | "wss" => {}
            scheme => {
                return Err(Error::config(format!(
                    "unsupported URL scheme {scheme:?} (expected ws or wss)"
                )));
            }
        }

        let mut request = parsed
            .as_str()
            .into_client_request()
            .map_err(|e| Error::config(format!("invalid client request: {e}")))?;

        if !protocols.is_empty() {
            let joined = protocols.join(", ");
            let value = HeaderValue::from_str(&joined)
                .map_err(|e| Error::config(format!("invalid subprotocol list {joined:?}: {e}")))?;
            request.headers_mut().insert("Sec-WebSocket-Protocol", value);
        }

        debug!(%url, "constructing WebSocket transport");

        Ok(WsTransport {
            state: WsState::Connecting(Box::pin(connect_async(request))),
        })
    }
}

// ============================================================================
// WsTransport
// ============================================================================

/// Handshake/stream state of one WebSocket connection.
enum WsState {
    /// Handshake in progress; driven by `next_event`.
    Connecting(ConnectFuture),
    /// Handshake complete, frames flowing.
    Open(WsStream),
    /// Closed or failed; no further events.
    Terminated,
}

/// One WebSocket connection instance.
///
/// Constructed by [`WsConnector::connect`]. The handshake is driven by
/// [`Transport::next_event`], so construction itself never blocks.
pub struct WsTransport {
    state: WsState,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, payload: WirePayload) -> Result<()> {
        match &mut self.state {
            WsState::Open(stream) => {
                let message = match payload {
                    WirePayload::Text(text) => Message::Text(text.into()),
                    WirePayload::Binary(bytes) => Message::Binary(bytes.into()),
                };
                stream.send(message).await?;
                Ok(())
            }
            _ => Err(Error::ConnectionClosed),
        }
    }

    async fn close(&mut self, code: u16) -> Result<()> {
        match &mut self.state {
            WsState::Open(stream) => {
                let frame = CloseFrame {
                    code: CloseCode::from(code),
                    reason: "".into(),
                };
                stream.close(Some(frame)).await?;
                Ok(())
            }
            _ => Err(Error::ConnectionClosed),
        }
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        loop {
            match &mut self.state {
                WsState::Connecting(handshake) => match handshake.as_mut().await {
                    Ok((stream, _response)) => {
                        debug!("WebSocket handshake completed");
                        self.state = WsState::Open(stream);
                        return Some(TransportEvent::Opened);
                    }
                    Err(e) => {
                        self.state = WsState::Terminated;
                        return Some(TransportEvent::Error(Error::WebSocket(e)));
                    }
                },

                WsState::Open(stream) => match stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        trace!(len = text.len(), "text frame received");
                        return Some(TransportEvent::Message(WirePayload::Text(
                            text.as_str().to_owned(),
                        )));
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        trace!(len = bytes.len(), "binary frame received");
                        return Some(TransportEvent::Message(WirePayload::Binary(bytes.to_vec())));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame
                            .map(|f| u16::from(f.code))
                            .unwrap_or(close_code::NO_STATUS);
                        debug!(code, "WebSocket closed by remote");
                        self.state = WsState::Terminated;
                        return Some(TransportEvent::Closed { code });
                    }
                    // Ping/Pong are answered by tungstenite internally.
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        self.state = WsState::Terminated;
                        return Some(TransportEvent::Error(Error::WebSocket(e)));
                    }
                    None => {
                        debug!("WebSocket stream ended without close frame");
                        self.state = WsState::Terminated;
                        return Some(TransportEvent::Closed {
                            code: close_code::ABNORMAL,
                        });
                    }
                },

                WsState::Terminated => return None,
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
