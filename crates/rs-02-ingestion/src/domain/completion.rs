//! # Completion Policy
//!
//! Decides when an entry counts as complete and which completion keys it
//! competes for. The atomic first-to-complete race itself runs against the
//! `CompletionStore` in the ingestion service.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use shared_types::{Announcement, CompletionRecord, ScoreEntry, VulnLedger};

/// Team id whose telegrams never complete anything (agent self-tests).
pub const DEFAULT_SENTINEL_TEAM: &str = "testing_id";

/// Suffix appended to the image name for the alternate track.
pub const DEFAULT_ALTERNATE_SUFFIX: &str = "-alt";

#[derive(Debug, Clone)]
pub struct CompletionPolicy {
    sentinel_teams: HashSet<String>,
    alternate_track_teams: HashSet<String>,
    alternate_suffix: String,
    offset: FixedOffset,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self {
            sentinel_teams: HashSet::from([DEFAULT_SENTINEL_TEAM.to_string()]),
            alternate_track_teams: HashSet::new(),
            alternate_suffix: DEFAULT_ALTERNATE_SUFFIX.to_string(),
            offset: Utc.fix(),
        }
    }
}

impl CompletionPolicy {
    pub fn new(
        sentinel_teams: impl IntoIterator<Item = String>,
        alternate_track_teams: impl IntoIterator<Item = String>,
        alternate_suffix: impl Into<String>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            sentinel_teams: sentinel_teams.into_iter().collect(),
            alternate_track_teams: alternate_track_teams.into_iter().collect(),
            alternate_suffix: alternate_suffix.into(),
            offset,
        }
    }

    pub fn is_sentinel(&self, team: &str) -> bool {
        self.sentinel_teams.contains(team)
    }

    /// Teams whose data is test traffic.
    pub fn sentinel_teams(&self) -> impl Iterator<Item = &str> {
        self.sentinel_teams.iter().map(String::as_str)
    }

    /// Competition display zone.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Completion time for a new entry.
    ///
    /// Perfect, non-sentinel entries carry the previous completion time
    /// forward, or start it at `now`. Everything else clears it.
    pub fn completion_time(
        &self,
        team: &str,
        ledger: &VulnLedger,
        prev: Option<&ScoreEntry>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<FixedOffset>> {
        if !ledger.is_perfect() || self.is_sentinel(team) {
            return None;
        }
        Some(
            prev.and_then(|p| p.completion_time)
                .unwrap_or_else(|| now.with_timezone(&self.offset)),
        )
    }

    /// Keys `team` competes for when completing `image`.
    pub fn completion_keys(&self, team: &str, image: &str) -> Vec<String> {
        let mut keys = vec![image.to_string()];
        if self.alternate_track_teams.contains(team) {
            keys.push(format!("{image}{}", self.alternate_suffix));
        }
        keys
    }
}

/// Announcement for a winning completion record.
pub fn announcement_for(
    record: &CompletionRecord,
    event: &str,
    now: DateTime<FixedOffset>,
) -> Announcement {
    Announcement {
        time: now,
        title: format!("{} completed {}", record.alias, record.image),
        body: format!(
            "{} is the first team to fix every vulnerability on {} in {}.",
            record.alias, record.image, event
        ),
    }
}

/// Notifier text for a winning completion record.
pub fn notification_for(record: &CompletionRecord) -> String {
    format!("{} was the first to complete {}!", record.alias, record.image)
}
