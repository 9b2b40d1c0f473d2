use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use tracing::debug;

use crate::error::{BridgeError, BridgeResult};

/// Duplex call-audio stream carrying JSON envelopes
#[async_trait]
pub trait MediaTransport: Send {
    /// Next text envelope, or `None` once the platform has closed the stream
    async fn next_message(&mut self) -> Option<BridgeResult<String>>;

    async fn close(&mut self) -> BridgeResult<()>;
}

/// Media stream served over an axum WebSocket
pub struct WebSocketTransport {
    socket: WebSocket,
    closed: bool,
}

impl WebSocketTransport {
    pub fn new(socket: WebSocket) -> Self {
        Self {
            socket,
            closed: false,
        }
    }

    /// Whether a Close frame has been seen or sent
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl MediaTransport for WebSocketTransport {
    async fn next_message(&mut self) -> Option<BridgeResult<String>> {
        loop {
            match self.socket.recv().await {
                None => return None,
                Some(Err(e)) => return Some(Err(BridgeError::Receive(e.to_string()))),
                Some(Ok(Message::Text(text))) => return Some(Ok(text)),
                // Envelopes are JSON text; non-UTF-8 bytes surface as a decode failure upstream
                Some(Ok(Message::Binary(bytes))) => {
                    return Some(Ok(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!("Media stream closed by peer: {:?}", frame);
                    self.closed = true;
                    return None;
                }
                Some(Ok(_)) => continue,
            }
        }
    }

    async fn close(&mut self) -> BridgeResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.socket
            .send(Message::Close(None))
            .await
            .map_err(|e| BridgeError::Send(e.to_string()))
    }
}
