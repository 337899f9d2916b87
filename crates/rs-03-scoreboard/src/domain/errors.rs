//! Scoreboard error types.

use rs_01_score_store::StoreError;
use thiserror::Error;

/// Errors from scoreboard queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreboardError {
    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Unknown image: {0}")]
    UnknownImage(String),

    /// Team exists but has never reported.
    #[error("No data for team {0}")]
    NoData(String),

    /// A `record<N>` selection does not name an existing record.
    #[error("Invalid record selection: {0}")]
    InvalidRecord(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ScoreboardError {
    /// True when the caller asked for something that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownTeam(_) | Self::UnknownImage(_) | Self::NoData(_)
        )
    }
}
