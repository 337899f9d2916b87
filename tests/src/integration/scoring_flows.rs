//! # Scoring Flows
//!
//! Telegrams submitted through `rs-02-ingestion` and read back through
//! `rs-03-scoreboard`, both sharing one in-memory `rs-01-score-store`.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::TimeDelta;
    use rs_01_score_store::{AnnouncementStore, InMemoryScoreStore, ScoreStore, Stores};
    use rs_02_ingestion::test_utils::{
        test_roster, MockClock, RecordingNotifier, TelegramBuilder, TEST_PASSWORD,
    };
    use rs_02_ingestion::{
        CompletionPolicy, IngestError, IngestionConfig, IngestionService, UpdateDecoder,
    };
    use rs_03_scoreboard::{ScoreboardError, ScoreboardService};
    use shared_crypto::TelegramCipher;

    // =========================================================================
    // FIXTURES
    // =========================================================================

    struct Range {
        ingestion: Arc<IngestionService>,
        scoreboard: ScoreboardService,
        store: Arc<InMemoryScoreStore>,
        clock: Arc<MockClock>,
        notifier: Arc<RecordingNotifier>,
    }

    fn range() -> Range {
        let roster = Arc::new(test_roster());
        let store = Arc::new(InMemoryScoreStore::new());
        let clock = Arc::new(MockClock::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let decoder = UpdateDecoder::new(
            TelegramCipher::from_password(TEST_PASSWORD),
            Arc::clone(&roster),
        );
        let ingestion = Arc::new(IngestionService::new(
            decoder,
            CompletionPolicy::default(),
            IngestionConfig::default(),
            Stores::shared(Arc::clone(&store)),
            notifier.clone(),
            clock.clone(),
        ));
        let scoreboard = ScoreboardService::new(store.clone(), roster);
        Range {
            ingestion,
            scoreboard,
            store,
            clock,
            notifier,
        }
    }

    fn full_marks(team: &str, image: &str) -> String {
        TelegramBuilder::new(team, image)
            .item("sqli", 60)
            .item("xss", 40)
            .build()
    }

    // =========================================================================
    // INGESTION → SCOREBOARD
    // =========================================================================

    #[tokio::test]
    async fn test_accepted_telegram_appears_on_every_board() {
        let r = range();
        r.ingestion.submit(&full_marks("t1", "web01")).await.unwrap();

        let board = r.scoreboard.scoreboard().await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].team, "t1");
        assert_eq!(board[0].score, 100);
        assert_eq!(board[0].image_count, 1);

        let web = r.scoreboard.image_board("web01").await.unwrap();
        assert_eq!(web.len(), 1);
        assert!(r.scoreboard.image_board("db01").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tampered_telegram_leaves_no_trace() {
        let r = range();
        let tampered = TelegramBuilder::new("t1", "web01")
            .item("sqli", 60)
            .item("xss", 30)
            .claim(100)
            .build();

        let err = r.ingestion.submit(&tampered).await.unwrap_err();
        assert!(matches!(err, IngestError::TamperDetected { .. }));
        assert_eq!(r.store.history_len(), 0);
        assert!(r.scoreboard.scoreboard().await.unwrap().is_empty());
        assert_eq!(
            r.scoreboard
                .team_detail("t1", None, &HashMap::new())
                .await
                .unwrap_err(),
            ScoreboardError::NoData("t1".to_string())
        );
    }

    #[tokio::test]
    async fn test_ties_break_on_play_time() {
        let r = range();
        r.ingestion.submit(&full_marks("t1", "web01")).await.unwrap();
        r.ingestion.submit(&full_marks("t2", "web01")).await.unwrap();
        r.clock.advance(TimeDelta::minutes(2));
        r.ingestion.submit(&full_marks("t2", "web01")).await.unwrap();

        let board = r.scoreboard.scoreboard().await.unwrap();
        let order: Vec<_> = board.iter().map(|s| s.team.as_str()).collect();
        assert_eq!(order, ["t1", "t2"]);
        assert_eq!(board[1].play_time, Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_team_detail_by_alias_carries_history() {
        let r = range();
        let partial = TelegramBuilder::new("red-rovers", "web01")
            .item("sqli", 60)
            .build();
        r.ingestion.submit(&partial).await.unwrap();
        r.clock.advance(TimeDelta::minutes(1));
        r.ingestion.submit(&full_marks("t1", "web01")).await.unwrap();

        let detail = r
            .scoreboard
            .team_detail("red-rovers", Some("web01"), &HashMap::new())
            .await
            .unwrap();
        assert_eq!(detail.team.id, "t1");
        assert_eq!(detail.standing.score, 100);
        assert_eq!(detail.latest.len(), 1);
        assert_eq!(detail.timeline.series.len(), 1);
        assert_eq!(detail.timeline.series[0].records.len(), 2);
        assert_eq!(r.store.history("t1", None).await.unwrap().len(), 2);
    }

    // =========================================================================
    // COMPLETION
    // =========================================================================

    #[tokio::test]
    async fn test_completion_announced_once_across_teams() {
        let r = range();
        let perfect = |team: &str| {
            TelegramBuilder::new(team, "web01")
                .item("sqli", 25)
                .vulns(1, 1)
                .build()
        };

        r.ingestion.submit(&perfect("t1")).await.unwrap();
        r.clock.advance(TimeDelta::minutes(1));
        r.ingestion.submit(&perfect("t2")).await.unwrap();
        r.ingestion.submit(&perfect("t1")).await.unwrap();

        let announcements = r.store.announcements().await.unwrap();
        assert_eq!(announcements.len(), 1);
        assert_eq!(r.notifier.sent().len(), 1);
        assert!(r.notifier.sent()[0].contains("red-rovers"));
    }
}
