//! `FrameTransport` over an axum websocket.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use rs_04_shell_relay::{FrameTransport, RelayError};

/// Text frames stay text; anything not UTF-8 goes out as binary.
pub struct WsTransport {
    socket: WebSocket,
}

impl WsTransport {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }

    /// Send a close frame, ignoring a peer that is already gone.
    pub async fn close(mut self) {
        let _ = self.socket.send(Message::Close(None)).await;
    }
}

#[async_trait]
impl FrameTransport for WsTransport {
    async fn recv_frame(&mut self) -> Option<Result<Bytes, RelayError>> {
        loop {
            match self.socket.recv().await? {
                Ok(Message::Text(text)) => return Some(Ok(Bytes::from(text))),
                Ok(Message::Binary(data)) => return Some(Ok(Bytes::from(data))),
                Ok(Message::Close(_)) => return None,
                // Pings are answered by axum
                Ok(Message::Ping(_) | Message::Pong(_)) => continue,
                Err(e) => return Some(Err(RelayError::Transport(e.to_string()))),
            }
        }
    }

    async fn send_frame(&mut self, frame: Bytes) -> Result<(), RelayError> {
        let message = match String::from_utf8(frame.to_vec()) {
            Ok(text) => Message::Text(text),
            Err(e) => Message::Binary(e.into_bytes()),
        };
        self.socket
            .send(message)
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))
    }
}
