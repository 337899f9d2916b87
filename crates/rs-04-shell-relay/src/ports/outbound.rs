//! # Outbound Ports (Driven Ports)
//!
//! The relay loops move frames between a session pipe and one of these.
//! The gateway wraps an axum websocket; tests use in-memory channels.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::RelayError;

/// A bidirectional frame stream.
#[async_trait]
pub trait FrameTransport: Send {
    /// Next payload frame.
    ///
    /// `None` means the peer closed cleanly. Must be cancel-safe: the relay
    /// drops a pending call when the session changes.
    async fn recv_frame(&mut self) -> Option<Result<Bytes, RelayError>>;

    async fn send_frame(&mut self, frame: Bytes) -> Result<(), RelayError>;
}
