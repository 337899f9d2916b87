//! In-memory transports and fixtures for relay tests.

use async_trait::async_trait;
use bytes::Bytes;
use shared_types::{Image, Roster, Team};
use tokio::sync::mpsc;

use crate::domain::errors::RelayError;
use crate::ports::outbound::FrameTransport;

/// Teams `t1` (alias `red-rovers`) and `t2`; images `web01`, `db01`.
pub fn test_roster() -> Roster {
    let team = |id: &str, alias: &str| Team {
        id: id.to_string(),
        alias: alias.to_string(),
        email: format!("{id}@range.test"),
    };
    let image = |name: &str, index: usize| Image {
        name: name.to_string(),
        color: String::new(),
        index,
    };
    Roster::new(
        vec![team("t1", "red-rovers"), team("t2", "blue-jays")],
        vec![image("web01", 0), image("db01", 1)],
    )
    .expect("test roster is valid")
}

/// Relay side of an in-memory socket.
pub struct ChannelTransport {
    incoming: mpsc::UnboundedReceiver<Result<Bytes, RelayError>>,
    outgoing: mpsc::UnboundedSender<Bytes>,
}

/// Test side of an in-memory socket. Dropping it closes the transport.
pub struct TransportHandle {
    to_relay: mpsc::UnboundedSender<Result<Bytes, RelayError>>,
    from_relay: mpsc::UnboundedReceiver<Bytes>,
}

/// A connected transport/handle pair.
pub fn channel_transport() -> (ChannelTransport, TransportHandle) {
    let (to_relay, incoming) = mpsc::unbounded_channel();
    let (outgoing, from_relay) = mpsc::unbounded_channel();
    (
        ChannelTransport { incoming, outgoing },
        TransportHandle {
            to_relay,
            from_relay,
        },
    )
}

impl TransportHandle {
    pub fn send_text(&self, text: &str) {
        let _ = self.to_relay.send(Ok(Bytes::copy_from_slice(text.as_bytes())));
    }

    /// Make the relay's next read fail.
    pub fn fail(&self, reason: &str) {
        let _ = self.to_relay.send(Err(RelayError::Transport(reason.to_string())));
    }

    pub async fn recv_text(&mut self) -> Option<String> {
        let frame = self.from_relay.recv().await?;
        Some(String::from_utf8_lossy(&frame).into_owned())
    }

    pub fn try_recv_text(&mut self) -> Option<String> {
        let frame = self.from_relay.try_recv().ok()?;
        Some(String::from_utf8_lossy(&frame).into_owned())
    }
}

#[async_trait]
impl FrameTransport for ChannelTransport {
    async fn recv_frame(&mut self) -> Option<Result<Bytes, RelayError>> {
        self.incoming.recv().await
    }

    async fn send_frame(&mut self, frame: Bytes) -> Result<(), RelayError> {
        self.outgoing
            .send(frame)
            .map_err(|_| RelayError::Transport("peer dropped".to_string()))
    }
}
