//! # Relay Loops
//!
//! Four tasks run per session, one per websocket:
//!
//! | Task | From | To |
//! |------|------|----|
//! | `operator_input` | operator socket | input pipe (newline-terminated) |
//! | `operator_output` | output pipe | operator socket |
//! | `target_input` | input pipe | target socket |
//! | `target_output` | target socket | output pipe |
//!
//! A task ends on a transport error, an `exit` payload, or the session
//! closing. On the way out it closes the session and pushes `exit` towards
//! its far side so the paired task unblocks and the peer sees it.
//!
//! `target_output` survives one read error per streak: it rebuilds the pipes
//! and keeps reading. A second consecutive error ends the session; any good
//! frame restores the budget.

use bytes::Bytes;
use range_telemetry::{metric_inc, SHELL_RECONNECTS};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::errors::RelayError;
use crate::domain::session::{is_exit, Pipe, Session, SessionStatus, EXIT_FRAME};
use crate::ports::outbound::FrameTransport;

/// Why a relay task stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEnd {
    /// An `exit` payload passed through this task.
    Exit,
    /// The transport closed cleanly.
    PeerClosed,
    /// Another task closed the session.
    SessionClosed,
    Failed(RelayError),
}

/// Operator keystrokes into the input pipe.
pub async fn operator_input<T>(session: &Session, transport: &mut T) -> RelayEnd
where
    T: FrameTransport + ?Sized,
{
    inbound(session, transport, Pipe::Input, true, false).await
}

/// Output pipe to the operator. The first frame marks the target connected.
pub async fn operator_output<T>(session: &Session, transport: &mut T) -> RelayEnd
where
    T: FrameTransport + ?Sized,
{
    outbound(session, transport, Pipe::Output, true).await
}

/// Input pipe to the agent.
pub async fn target_input<T>(session: &Session, transport: &mut T) -> RelayEnd
where
    T: FrameTransport + ?Sized,
{
    outbound(session, transport, Pipe::Input, false).await
}

/// Agent output into the output pipe, with reconnect-once.
pub async fn target_output<T>(session: &Session, transport: &mut T) -> RelayEnd
where
    T: FrameTransport + ?Sized,
{
    inbound(session, transport, Pipe::Output, false, true).await
}

/// Resolves once the session closes or its pipes move past `generation`.
async fn closed_or_rebuilt(status: &mut watch::Receiver<SessionStatus>, generation: u64) {
    let _ = status
        .wait_for(|s| s.state.is_closed() || s.generation != generation)
        .await;
}

/// Transport → pipe.
async fn inbound<T>(
    session: &Session,
    transport: &mut T,
    pipe: Pipe,
    newline: bool,
    reconnect: bool,
) -> RelayEnd
where
    T: FrameTransport + ?Sized,
{
    let mut status = session.subscribe();
    let mut budget = reconnect;

    let end = loop {
        if status.borrow_and_update().state.is_closed() {
            break RelayEnd::SessionClosed;
        }

        let next = tokio::select! {
            next = transport.recv_frame() => next,
            changed = status.changed() => {
                if changed.is_err() {
                    break RelayEnd::SessionClosed;
                }
                continue;
            }
        };

        let frame = match next {
            None => break RelayEnd::PeerClosed,
            Some(Err(err)) if budget => {
                budget = false;
                let generation = status.borrow().generation;
                if session.rebuild_pipes(generation) {
                    metric_inc!(SHELL_RECONNECTS);
                    warn!(
                        key = %session.key(),
                        error = %err,
                        generation = generation + 1,
                        "Target read failed, rebuilt shell pipes"
                    );
                }
                continue;
            }
            Some(Err(err)) => break RelayEnd::Failed(err),
            Some(Ok(frame)) => frame,
        };
        budget = reconnect;

        let exit = is_exit(&frame);
        let payload = if newline {
            Bytes::from([&frame[..], &b"\n"[..]].concat())
        } else {
            frame
        };

        let generation = status.borrow().generation;
        let pipes = session.pipes();
        tokio::select! {
            sent = pipes.sender(pipe).send(payload) => {
                if sent.is_err() {
                    break RelayEnd::SessionClosed;
                }
            }
            // A rebuild discards queued frames; this one goes with them.
            _ = closed_or_rebuilt(&mut status, generation) => continue,
        }

        if exit {
            break RelayEnd::Exit;
        }
    };

    if end != RelayEnd::Exit {
        session.offer(pipe, Bytes::from_static(EXIT_FRAME));
    }
    session.close();
    debug!(key = %session.key(), ?pipe, ?end, "Inbound relay finished");
    end
}

/// Pipe → transport.
async fn outbound<T>(
    session: &Session,
    transport: &mut T,
    pipe: Pipe,
    clears_awaiting: bool,
) -> RelayEnd
where
    T: FrameTransport + ?Sized,
{
    let mut status = session.subscribe();
    let mut sent_exit = false;

    let end = loop {
        if status.borrow_and_update().state.is_closed() {
            break RelayEnd::SessionClosed;
        }

        let pipes = session.pipes();
        let next = {
            let mut rx = tokio::select! {
                guard = pipes.receiver(pipe).lock() => guard,
                changed = status.changed() => {
                    if changed.is_err() {
                        break RelayEnd::SessionClosed;
                    }
                    continue;
                }
            };
            tokio::select! {
                frame = rx.recv() => frame,
                changed = status.changed() => {
                    if changed.is_err() {
                        break RelayEnd::SessionClosed;
                    }
                    continue;
                }
            }
        };

        // Every sender lives in the pipe set we hold.
        let Some(frame) = next else {
            break RelayEnd::PeerClosed;
        };

        if clears_awaiting && session.mark_target_connected() {
            info!(key = %session.key(), "Target connected to shell");
        }

        let exit = is_exit(&frame);
        if let Err(err) = transport.send_frame(frame).await {
            break RelayEnd::Failed(err);
        }
        if exit {
            sent_exit = true;
            break RelayEnd::Exit;
        }
    };

    session.close();

    if !matches!(end, RelayEnd::Failed(_)) && !sent_exit {
        let pipes = session.pipes();
        if let Ok(mut rx) = pipes.receiver(pipe).try_lock() {
            while let Ok(frame) = rx.try_recv() {
                let exit = is_exit(&frame);
                if transport.send_frame(frame).await.is_err() || exit {
                    sent_exit = true;
                    break;
                }
            }
        }
        if !sent_exit {
            let _ = transport.send_frame(Bytes::from_static(EXIT_FRAME)).await;
        }
    }

    debug!(key = %session.key(), ?pipe, ?end, "Outbound relay finished");
    end
}
