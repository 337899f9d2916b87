//! # Outbound Ports (Driven Ports)
//!
//! Interfaces the persistence backend implements. Production backends wrap a
//! document store; `InMemoryScoreStore` is the default and the test double.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{Announcement, CompletionRecord, ScoreEntry};

use crate::domain::errors::StoreError;

/// Score history plus the latest-per-(team, image) projection.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Append one accepted entry to history.
    async fn append(&self, entry: &ScoreEntry) -> Result<(), StoreError>;

    /// Most recent history entry for (team, image), if any.
    async fn latest(&self, team: &str, image: &str) -> Result<Option<ScoreEntry>, StoreError>;

    /// Replace the projection row for (team, image).
    ///
    /// An entry older than the stored row is ignored.
    async fn upsert_best(&self, entry: &ScoreEntry) -> Result<(), StoreError>;

    /// Every projection row.
    async fn latest_per_team_image(&self) -> Result<Vec<ScoreEntry>, StoreError>;

    /// Chronological history for a team, optionally restricted to one image.
    async fn history(&self, team: &str, image: Option<&str>)
        -> Result<Vec<ScoreEntry>, StoreError>;

    /// History folded into one row per (team, image).
    async fn aggregate(&self) -> Result<Vec<ScoreEntry>, StoreError>;

    /// Drop every history entry and projection row for `team`.
    ///
    /// Returns the number of history entries removed.
    async fn purge_team(&self, team: &str) -> Result<usize, StoreError>;
}

/// First-completion markers.
#[async_trait]
pub trait CompletionStore: Send + Sync {
    async fn completion_exists(&self, image_key: &str) -> Result<bool, StoreError>;

    /// Insert if no record exists for `record.image`.
    ///
    /// Returns `true` only for the caller whose insert won. Must be atomic:
    /// concurrent callers for the same key see exactly one `true`.
    async fn insert_completion(&self, record: CompletionRecord) -> Result<bool, StoreError>;

    async fn completions(&self) -> Result<Vec<CompletionRecord>, StoreError>;

    /// Drop every completion record won by `team`, freeing those keys.
    async fn purge_team(&self, team: &str) -> Result<usize, StoreError>;
}

/// Scoreboard announcements.
#[async_trait]
pub trait AnnouncementStore: Send + Sync {
    async fn insert_announcement(&self, announcement: Announcement) -> Result<(), StoreError>;

    /// All announcements, newest first.
    async fn announcements(&self) -> Result<Vec<Announcement>, StoreError>;
}

/// Handles to every collection, usually backed by one store.
#[derive(Clone)]
pub struct Stores {
    pub scores: Arc<dyn ScoreStore>,
    pub completions: Arc<dyn CompletionStore>,
    pub announcements: Arc<dyn AnnouncementStore>,
}

impl Stores {
    /// Share one backend across all three ports.
    pub fn shared<B>(backend: Arc<B>) -> Self
    where
        B: ScoreStore + CompletionStore + AnnouncementStore + 'static,
    {
        Self {
            scores: backend.clone(),
            completions: backend.clone(),
            announcements: backend,
        }
    }
}
