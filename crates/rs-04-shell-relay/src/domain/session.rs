//! # Shell Session
//!
//! One session per (team, image). State lives in a `watch` channel so every
//! transition is a compare-and-swap closure run under the channel's lock, and
//! every relay task parked on the session wakes when it changes.
//!
//! ```text
//! Absent ──lookup──► Pending ──attach──► Active{awaiting_target}
//!                                              │ first target frame
//!                                              ▼
//!                                        Active{ready}
//!        any relay task ends ──────────────────┴──► Closed
//! ```
//!
//! Closed is terminal. The registry treats a Closed session as absent and
//! creates a fresh one under the same key.
//!
//! The pipes (operator→target input, target→operator output) are bounded
//! channels. A target reconnect swaps them for fresh ones and bumps the
//! generation; the swap only succeeds for the caller that observed the
//! current generation.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use range_telemetry::SHELL_SESSIONS_ACTIVE;
use tokio::sync::{mpsc, watch, Mutex};

/// Frame that tells the far side the session is over.
pub const EXIT_FRAME: &[u8] = b"exit";

/// True when `frame` is an exit command, ignoring surrounding whitespace.
pub fn is_exit(frame: &[u8]) -> bool {
    std::str::from_utf8(frame).map(str::trim) == Ok("exit")
}

/// Canonical team id plus image name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub team: String,
    pub image: String,
}

impl SessionKey {
    pub fn new(team: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            image: image.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.team, self.image)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, no operator yet.
    Pending,
    /// Operator attached; `awaiting_target` until the agent's first output.
    Active { awaiting_target: bool },
    Closed,
}

impl SessionState {
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

/// Snapshot published on the session's watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    /// Bumped on every pipe rebuild.
    pub generation: u64,
}

/// Which pipe a relay task works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipe {
    /// Operator keystrokes towards the target.
    Input,
    /// Target output towards the operator.
    Output,
}

/// One generation of the session's channels.
pub(crate) struct PipeSet {
    input_tx: mpsc::Sender<Bytes>,
    input_rx: Mutex<mpsc::Receiver<Bytes>>,
    output_tx: mpsc::Sender<Bytes>,
    output_rx: Mutex<mpsc::Receiver<Bytes>>,
}

impl PipeSet {
    fn new(capacity: usize) -> Self {
        let (input_tx, input_rx) = mpsc::channel(capacity);
        let (output_tx, output_rx) = mpsc::channel(capacity);
        Self {
            input_tx,
            input_rx: Mutex::new(input_rx),
            output_tx,
            output_rx: Mutex::new(output_rx),
        }
    }

    pub(crate) fn sender(&self, pipe: Pipe) -> &mpsc::Sender<Bytes> {
        match pipe {
            Pipe::Input => &self.input_tx,
            Pipe::Output => &self.output_tx,
        }
    }

    pub(crate) fn receiver(&self, pipe: Pipe) -> &Mutex<mpsc::Receiver<Bytes>> {
        match pipe {
            Pipe::Input => &self.input_rx,
            Pipe::Output => &self.output_rx,
        }
    }
}

/// A relay session between one operator and one agent.
pub struct Session {
    key: SessionKey,
    capacity: usize,
    status: watch::Sender<SessionStatus>,
    pipes: RwLock<Arc<PipeSet>>,
}

impl Session {
    /// New Pending session with fresh pipes of `capacity` frames each.
    pub fn new(key: SessionKey, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (status, _) = watch::channel(SessionStatus {
            state: SessionState::Pending,
            generation: 0,
        });
        Self {
            key,
            capacity,
            status,
            pipes: RwLock::new(Arc::new(PipeSet::new(capacity))),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn state(&self) -> SessionState {
        self.status.borrow().state
    }

    pub fn generation(&self) -> u64 {
        self.status.borrow().generation
    }

    /// Receiver woken on every state change or pipe rebuild.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Pending → Active{awaiting_target: true}.
    ///
    /// Returns `false` if the session was not Pending.
    pub fn activate(&self) -> bool {
        let won = self.status.send_if_modified(|s| {
            if s.state != SessionState::Pending {
                return false;
            }
            s.state = SessionState::Active {
                awaiting_target: true,
            };
            true
        });
        if won {
            SHELL_SESSIONS_ACTIVE.inc();
        }
        won
    }

    /// Clear `awaiting_target` after the agent's first output frame.
    pub fn mark_target_connected(&self) -> bool {
        self.status.send_if_modified(|s| {
            if s.state
                != (SessionState::Active {
                    awaiting_target: true,
                })
            {
                return false;
            }
            s.state = SessionState::Active {
                awaiting_target: false,
            };
            true
        })
    }

    /// Move to Closed. Returns `false` if already Closed.
    pub fn close(&self) -> bool {
        let mut was_active = false;
        let closed = self.status.send_if_modified(|s| {
            if s.state.is_closed() {
                return false;
            }
            was_active = s.state.is_active();
            s.state = SessionState::Closed;
            true
        });
        if was_active {
            SHELL_SESSIONS_ACTIVE.dec();
        }
        closed
    }

    /// Replace the pipes with fresh channels if the generation is still
    /// `expected` and the session is not Closed.
    ///
    /// Of several concurrent callers observing the same generation, exactly
    /// one gets `true`.
    pub fn rebuild_pipes(&self, expected: u64) -> bool {
        self.status.send_if_modified(|s| {
            if s.state.is_closed() || s.generation != expected {
                return false;
            }
            *self.pipes.write() = Arc::new(PipeSet::new(self.capacity));
            s.generation += 1;
            true
        })
    }

    /// Current pipe generation.
    pub(crate) fn pipes(&self) -> Arc<PipeSet> {
        self.pipes.read().clone()
    }

    /// Queue a frame without waiting. Dropped if the pipe is full.
    pub fn offer(&self, pipe: Pipe, frame: Bytes) -> bool {
        self.pipes().sender(pipe).try_send(frame).is_ok()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.key)
            .field("status", &*self.status.borrow())
            .finish()
    }
}
