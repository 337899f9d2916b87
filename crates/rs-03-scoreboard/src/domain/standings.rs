//! # Standings
//!
//! One row per team, built from the latest-per-(team, image) projection.
//! Score is the sum of each image's latest points; play time is the sum of
//! each image's play time. Rows order by score descending, ties broken by
//! lower play time.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use shared_types::{format_clock, Roster, ScoreEntry};

/// A scoreboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamStanding {
    pub team: String,
    pub alias: String,
    pub email: String,
    pub image_count: usize,
    pub score: i64,
    #[serde(with = "shared_types::entities::duration_secs")]
    pub play_time: Duration,
    pub play_time_str: String,
}

/// Group projection rows by team and rank them.
///
/// Teams missing from the roster keep their id as alias.
pub fn rank(rows: &[ScoreEntry], roster: &Roster) -> Vec<TeamStanding> {
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, (usize, i64, Duration)> = HashMap::new();

    for row in rows {
        let slot = totals.entry(row.team.as_str()).or_insert_with(|| {
            order.push(row.team.as_str());
            (0, 0, Duration::ZERO)
        });
        slot.0 += 1;
        slot.1 = slot.1.saturating_add(row.points);
        slot.2 += row.play_time;
    }

    let mut standings: Vec<TeamStanding> = order
        .into_iter()
        .map(|id| {
            let (image_count, score, play_time) = totals[id];
            let (alias, email) = match roster.team(id) {
                Some(team) => (team.alias.clone(), team.email.clone()),
                None => (id.to_string(), String::new()),
            };
            TeamStanding {
                team: id.to_string(),
                alias,
                email,
                image_count,
                score,
                play_time,
                play_time_str: format_clock(play_time),
            }
        })
        .collect();

    standings.sort_by(|a, b| b.score.cmp(&a.score).then(a.play_time.cmp(&b.play_time)));
    standings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use shared_types::{Team, VulnLedger};

    fn row(team: &str, image: &str, points: i64, play_secs: u64) -> ScoreEntry {
        ScoreEntry {
            time: DateTime::<Utc>::from_timestamp(1_709_380_800, 0).unwrap(),
            team: team.into(),
            image: image.into(),
            vulns: VulnLedger::default(),
            points,
            penalties: 0,
            play_time: Duration::from_secs(play_secs),
            play_time_str: String::new(),
            elapsed_time: Duration::ZERO,
            elapsed_time_str: String::new(),
            completion_time: None,
        }
    }

    fn roster() -> Roster {
        let team = |id: &str, alias: &str| Team {
            id: id.into(),
            alias: alias.into(),
            email: format!("{id}@range.test"),
        };
        Roster::new(vec![team("t1", "red"), team("t2", "blue")], vec![]).unwrap()
    }

    #[test]
    fn test_sums_across_images() {
        let rows = vec![
            row("t1", "web01", 40, 600),
            row("t1", "db01", 25, 300),
            row("t2", "web01", 50, 100),
        ];
        let standings = rank(&rows, &roster());

        assert_eq!(standings[0].team, "t1");
        assert_eq!(standings[0].score, 65);
        assert_eq!(standings[0].image_count, 2);
        assert_eq!(standings[0].play_time, Duration::from_secs(900));
        assert_eq!(standings[0].play_time_str, "00:15:00");
        assert_eq!(standings[0].alias, "red");
        assert_eq!(standings[1].team, "t2");
    }

    #[test]
    fn test_ties_prefer_less_play_time() {
        let rows = vec![row("t1", "web01", 30, 900), row("t2", "web01", 30, 600)];
        let standings = rank(&rows, &roster());
        let order: Vec<_> = standings.iter().map(|s| s.team.as_str()).collect();
        assert_eq!(order, ["t2", "t1"]);
    }

    #[test]
    fn test_unrostered_team_keeps_id() {
        let standings = rank(&[row("ghost", "web01", 5, 0)], &roster());
        assert_eq!(standings[0].alias, "ghost");
        assert!(standings[0].email.is_empty());
    }

    #[test]
    fn test_penalties_can_drive_score_negative() {
        let standings = rank(&[row("t1", "web01", -4, 60)], &roster());
        assert_eq!(standings[0].score, -4);
    }
}
