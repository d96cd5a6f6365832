//! Connection establishment.
//!
//! The socket manager never talks to a WebSocket library directly. It asks a
//! [`Connector`] for a [`Connection`] and pumps text frames through it, so
//! tests can drive the manager with an in-memory connection.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::transport::error::{TransportError, TransportResult};

/// Opens stream connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection to `url`.
    async fn connect(&self, url: &str) -> TransportResult<Box<dyn Connection>>;
}

/// One open, bidirectional text stream.
///
/// `recv` must be cancel safe: the manager polls it inside `select!`.
#[async_trait]
pub trait Connection: Send {
    /// Next inbound text frame.
    ///
    /// Returns `None` once the peer closed the connection. An `Err` reports
    /// a failure on the connection; the following call returns `None`.
    async fn recv(&mut self) -> Option<TransportResult<String>>;

    /// Write one text frame.
    async fn send_text(&mut self, text: String) -> TransportResult<()>;

    /// Close the connection. Errors are ignored.
    async fn close(&mut self);
}

/// Production connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> TransportResult<Box<dyn Connection>> {
        let (stream, response) =
            tokio_tungstenite::connect_async(url)
                .await
                .map_err(|e| TransportError::Connect {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        tracing::debug!(url, status = %response.status(), "websocket handshake complete");
        Ok(Box::new(WsConnection {
            stream,
            failed: false,
        }))
    }
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    failed: bool,
}

#[async_trait]
impl Connection for WsConnection {
    async fn recv(&mut self) -> Option<TransportResult<String>> {
        if self.failed {
            return None;
        }

        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => tracing::debug!("ignoring non UTF-8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "server closed the stream");
                    return None;
                }
                // Ping/pong is answered by tungstenite itself.
                Ok(_) => {}
                Err(e) => {
                    self.failed = true;
                    return Some(Err(TransportError::Protocol(e.to_string())));
                }
            }
        }
    }

    async fn send_text(&mut self, text: String) -> TransportResult<()> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::trace!(error = %e, "close handshake failed");
        }
    }
}
