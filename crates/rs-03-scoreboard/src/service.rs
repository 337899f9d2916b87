//! Scoreboard queries against the score store.

use std::collections::HashMap;
use std::sync::Arc;

use rs_01_score_store::ScoreStore;
use serde::Serialize;
use shared_types::{Image, Roster, ScoreEntry, Team};
use tracing::debug;

use crate::domain::errors::ScoreboardError;
use crate::domain::standings::{rank, TeamStanding};
use crate::domain::timeline::{build_timeline, select_records, Timeline};

/// Everything the team page shows.
#[derive(Debug, Clone, Serialize)]
pub struct TeamDetail {
    pub team: Team,
    pub standing: TeamStanding,
    /// Latest projection row per image, in roster order.
    pub latest: Vec<ScoreEntry>,
    pub timeline: Timeline,
}

/// Read-only views over scores.
pub struct ScoreboardService {
    scores: Arc<dyn ScoreStore>,
    roster: Arc<Roster>,
}

impl ScoreboardService {
    pub fn new(scores: Arc<dyn ScoreStore>, roster: Arc<Roster>) -> Self {
        Self { scores, roster }
    }

    /// Overall standings across all images, folded from history.
    pub async fn scoreboard(&self) -> Result<Vec<TeamStanding>, ScoreboardError> {
        let rows = self.scores.aggregate().await?;
        Ok(rank(&rows, &self.roster))
    }

    /// Standings restricted to one image.
    pub async fn image_board(&self, image: &str) -> Result<Vec<TeamStanding>, ScoreboardError> {
        let image = self.lookup_image(image)?;
        let rows: Vec<ScoreEntry> = self
            .scores
            .aggregate()
            .await?
            .into_iter()
            .filter(|row| row.image == image.name)
            .collect();
        Ok(rank(&rows, &self.roster))
    }

    /// Team page: standing, latest rows and per-minute timeline.
    ///
    /// `team` may be an id or an alias. `overrides` maps chart position to
    /// the record index to select.
    pub async fn team_detail(
        &self,
        team: &str,
        image: Option<&str>,
        overrides: &HashMap<usize, usize>,
    ) -> Result<TeamDetail, ScoreboardError> {
        let team = self
            .roster
            .resolve_team(team)
            .cloned()
            .ok_or_else(|| ScoreboardError::UnknownTeam(team.to_string()))?;
        let images: Vec<Image> = match image {
            Some(name) => vec![self.lookup_image(name)?.clone()],
            None => self.roster.images().to_vec(),
        };

        let latest: Vec<ScoreEntry> = self
            .scores
            .latest_per_team_image()
            .await?
            .into_iter()
            .filter(|row| row.team == team.id && images.iter().any(|i| i.name == row.image))
            .collect();
        let standing = rank(&latest, &self.roster)
            .into_iter()
            .next()
            .ok_or_else(|| ScoreboardError::NoData(team.id.clone()))?;

        let history = self.scores.history(&team.id, image).await?;
        let mut timeline = build_timeline(&history, &images);
        select_records(&mut timeline.series, overrides)?;
        debug!(
            team = %team.id,
            records = history.len(),
            minutes = timeline.labels.len(),
            "Built team timeline"
        );

        let mut latest = latest;
        latest.sort_by_key(|row| {
            images
                .iter()
                .position(|i| i.name == row.image)
                .unwrap_or(usize::MAX)
        });

        Ok(TeamDetail {
            team,
            standing,
            latest,
            timeline,
        })
    }

    fn lookup_image(&self, name: &str) -> Result<&Image, ScoreboardError> {
        self.roster
            .image(name)
            .ok_or_else(|| ScoreboardError::UnknownImage(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use rs_01_score_store::InMemoryScoreStore;
    use shared_types::VulnLedger;
    use std::time::Duration;

    const T0: i64 = 1_709_380_800;

    fn entry(team: &str, image: &str, offset: i64, points: i64) -> ScoreEntry {
        ScoreEntry {
            time: DateTime::<Utc>::from_timestamp(T0 + offset, 0).unwrap(),
            team: team.into(),
            image: image.into(),
            vulns: VulnLedger::default(),
            points,
            penalties: 0,
            play_time: Duration::from_secs(offset as u64),
            play_time_str: String::new(),
            elapsed_time: Duration::from_secs(offset as u64),
            elapsed_time_str: String::new(),
            completion_time: None,
        }
    }

    fn roster() -> Arc<Roster> {
        let team = |id: &str, alias: &str| Team {
            id: id.into(),
            alias: alias.into(),
            email: String::new(),
        };
        let image = |name: &str, index| Image {
            name: name.into(),
            color: String::new(),
            index,
        };
        Arc::new(
            Roster::new(
                vec![team("t1", "red"), team("t2", "blue")],
                vec![image("web01", 0), image("db01", 1)],
            )
            .unwrap(),
        )
    }

    async fn seeded() -> ScoreboardService {
        let store = Arc::new(InMemoryScoreStore::new());
        for e in [
            entry("t1", "web01", 0, 10),
            entry("t1", "web01", 120, 30),
            entry("t1", "db01", 60, 5),
            entry("t2", "web01", 30, 20),
        ] {
            store.append(&e).await.unwrap();
            store.upsert_best(&e).await.unwrap();
        }
        ScoreboardService::new(store, roster())
    }

    #[tokio::test]
    async fn test_scoreboard_ranks_latest_points() {
        let service = seeded().await;
        let board = service.scoreboard().await.unwrap();
        assert_eq!(board[0].team, "t1");
        assert_eq!(board[0].score, 35);
        assert_eq!(board[1].score, 20);
    }

    #[tokio::test]
    async fn test_scoreboard_folds_history() {
        let store = Arc::new(InMemoryScoreStore::new());
        for e in [entry("t2", "web01", 0, 10), entry("t2", "web01", 90, 40)] {
            store.append(&e).await.unwrap();
        }
        let service = ScoreboardService::new(store, roster());

        let board = service.scoreboard().await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].team, "t2");
        assert_eq!(board[0].score, 40);
    }

    #[tokio::test]
    async fn test_image_board_filters() {
        let service = seeded().await;
        let board = service.image_board("db01").await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].score, 5);
        assert!(matches!(
            service.image_board("mail01").await,
            Err(ScoreboardError::UnknownImage(_))
        ));
    }

    #[tokio::test]
    async fn test_team_detail_by_alias() {
        let service = seeded().await;
        let detail = service
            .team_detail("red", None, &HashMap::new())
            .await
            .unwrap();
        assert_eq!(detail.team.id, "t1");
        assert_eq!(detail.standing.score, 35);
        assert_eq!(detail.latest[0].image, "web01");
        assert_eq!(detail.timeline.series.len(), 2);
        assert_eq!(detail.timeline.series[0].records.len(), 2);
    }

    #[tokio::test]
    async fn test_team_detail_single_image_and_override() {
        let service = seeded().await;
        let detail = service
            .team_detail("t1", Some("web01"), &HashMap::from([(0, 0)]))
            .await
            .unwrap();
        assert_eq!(detail.timeline.series.len(), 1);
        assert_eq!(detail.timeline.series[0].selected().unwrap().points, 10);
        assert_eq!(detail.standing.score, 30);
    }

    #[tokio::test]
    async fn test_team_detail_errors() {
        let service = seeded().await;
        let none = HashMap::new();
        assert!(matches!(
            service.team_detail("nobody", None, &none).await,
            Err(ScoreboardError::UnknownTeam(_))
        ));
        assert!(matches!(
            service.team_detail("t2", Some("db01"), &none).await,
            Err(ScoreboardError::NoData(_))
        ));
        assert!(matches!(
            service
                .team_detail("t1", None, &HashMap::from([(0, 9)]))
                .await,
            Err(ScoreboardError::InvalidRecord(_))
        ));
    }
}
