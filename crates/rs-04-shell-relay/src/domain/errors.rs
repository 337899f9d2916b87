//! Shell relay error types.

use thiserror::Error;

/// Errors from session lookup and attachment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Unknown image: {0}")]
    UnknownImage(String),

    /// Another operator already holds the session.
    #[error("Shell for {team}/{image} already in use")]
    AlreadyInUse { team: String, image: String },
}

/// Errors on one side of a relay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The websocket (or test transport) failed.
    #[error("Transport error: {0}")]
    Transport(String),
}
