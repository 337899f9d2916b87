//! # Time Accounting
//!
//! | Quantity | Rule |
//! |----------|------|
//! | elapsed | `prev.elapsed + gap`, always |
//! | play | `prev.play + gap` when `gap < idle_threshold`, else `prev.play` |
//!
//! `gap = now - prev.time`; a negative gap (clock skew) counts as zero.
//! The first telegram for a (team, image) starts both clocks at zero.

use std::time::Duration;

use chrono::{DateTime, Utc};
use shared_types::ScoreEntry;

/// Gaps at or beyond this are idle time.
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAccount {
    pub play_time: Duration,
    pub elapsed_time: Duration,
}

/// Compute play and elapsed time for a telegram received at `now`.
pub fn account(
    now: DateTime<Utc>,
    prev: Option<&ScoreEntry>,
    idle_threshold: Duration,
) -> TimeAccount {
    let Some(prev) = prev else {
        return TimeAccount {
            play_time: Duration::ZERO,
            elapsed_time: Duration::ZERO,
        };
    };

    let gap = (now - prev.time).to_std().unwrap_or(Duration::ZERO);
    let play_time = if gap < idle_threshold {
        prev.play_time + gap
    } else {
        prev.play_time
    };

    TimeAccount {
        play_time,
        elapsed_time: prev.elapsed_time + gap,
    }
}
