//! # Error Types
//!
//! Roster construction errors.

use thiserror::Error;

/// Errors raised while validating the competition roster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// A team has an empty id.
    #[error("Team at position {position} has an empty id")]
    EmptyTeamId { position: usize },

    /// A team has an empty alias.
    #[error("Team {id} has an empty alias")]
    EmptyTeamAlias { id: String },

    /// A team id or alias collides with another team's id or alias.
    #[error("Duplicate team identifier: {0}")]
    DuplicateTeam(String),

    /// An image has an empty name.
    #[error("Image at position {position} has an empty name")]
    EmptyImageName { position: usize },

    /// Two images share a name.
    #[error("Duplicate image name: {0}")]
    DuplicateImage(String),

    /// An identifier contains characters outside `[A-Za-z0-9_-]`.
    #[error("Identifier {0:?} contains invalid characters")]
    InvalidIdentifier(String),
}
