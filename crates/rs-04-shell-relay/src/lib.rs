//! # Shell Relay (rs-04)
//!
//! Bridges an operator's browser terminal to a shell on a competition image.
//! The operator and the agent each open two websockets (input and output);
//! the relay pairs them through a per-(team, image) session.
//!
//! ## Session Invariants
//!
//! | ID | Invariant |
//! |----|-----------|
//! | 1 | At most one operator is attached to a live session |
//! | 2 | Closed is terminal; the registry replaces a Closed session |
//! | 3 | A stale session handle cannot change a newer session's state |
//! | 4 | Pipe rebuilds are generation-guarded; concurrent rebuilds yield one winner |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Session state machine, pipes and errors
//! - `ports/` - `FrameTransport`, the websocket seam
//! - `registry.rs` - Roster-validated session lookup
//! - `relay.rs` - The four relay loops

#![warn(clippy::all)]

pub mod domain;
pub mod ports;
pub mod registry;
pub mod relay;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use domain::errors::{RelayError, ShellError};
pub use domain::session::{is_exit, Pipe, Session, SessionKey, SessionState, SessionStatus, EXIT_FRAME};
pub use ports::outbound::FrameTransport;
pub use registry::{ShellRegistry, DEFAULT_CHANNEL_CAPACITY};
pub use relay::{operator_input, operator_output, target_input, target_output, RelayEnd};
