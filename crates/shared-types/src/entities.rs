//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Roster**: `Team`, `Image`
//! - **Scoring**: `ScoreEntry`, `VulnLedger`, `VulnItem`
//! - **Events**: `CompletionRecord`, `Announcement`

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// CLUSTER A: THE ROSTER
// =============================================================================

/// A competing team. Immutable for the whole competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Unique id used by agents and URLs.
    pub id: String,
    /// Unique display alias; agents may submit this instead of the id.
    pub alias: String,
    /// Contact address.
    #[serde(default)]
    pub email: String,
}

/// One scored target host image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Unique image name.
    pub name: String,
    /// Chart color.
    #[serde(default)]
    pub color: String,
    /// Ordinal position on the scoreboard.
    #[serde(default)]
    pub index: usize,
}

// =============================================================================
// CLUSTER B: SCORING
// =============================================================================

/// One scored (or penalized) line of a vulnerability ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnItem {
    /// Human-readable vulnerability label.
    pub text: String,
    /// Signed point value; negative values are penalties.
    pub points: i64,
}

/// Itemized breakdown backing a claimed score.
///
/// Invariant (enforced at ingestion): `point_sum() == Some(ScoreEntry::points)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnLedger {
    pub vulns_scored: u32,
    pub vulns_total: u32,
    pub items: Vec<VulnItem>,
}

impl VulnLedger {
    /// Sum of every item's points, `None` if the sum leaves the i64 range.
    pub fn point_sum(&self) -> Option<i64> {
        self.items
            .iter()
            .try_fold(0i64, |acc, item| acc.checked_add(item.points))
    }

    /// Number of penalty items.
    pub fn penalty_count(&self) -> u32 {
        self.items.iter().filter(|i| i.points < 0).count() as u32
    }

    /// All vulnerabilities on the image are fixed.
    pub fn is_perfect(&self) -> bool {
        self.vulns_scored >= self.vulns_total
    }
}

/// One accepted telegram. Appended to history and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Server receive time.
    pub time: DateTime<Utc>,
    /// Team id (never the alias).
    pub team: String,
    /// Image name.
    pub image: String,
    pub vulns: VulnLedger,
    pub points: i64,
    pub penalties: u32,
    #[serde(with = "duration_secs")]
    pub play_time: Duration,
    pub play_time_str: String,
    #[serde(with = "duration_secs")]
    pub elapsed_time: Duration,
    pub elapsed_time_str: String,
    /// Set while the entry is perfect; carried forward from the first
    /// perfect entry.
    pub completion_time: Option<DateTime<FixedOffset>>,
}

/// Render a duration as zero-padded `HH:MM:SS`, flooring to whole seconds.
///
/// Hours widen past two digits rather than wrapping.
pub fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

// =============================================================================
// CLUSTER C: EVENTS
// =============================================================================

/// Marker that the first perfect score for `image` has been announced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Image name, suffixed for the alternate track.
    pub image: String,
    pub team: String,
    pub alias: String,
}

/// Scoreboard announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub time: DateTime<FixedOffset>,
    pub title: String,
    pub body: String,
}

/// Serde adapter storing a `Duration` as whole seconds.
pub mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
