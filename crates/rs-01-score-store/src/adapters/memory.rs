//! In-memory persistence backend.
//!
//! History lives behind a `parking_lot::RwLock`; the projection, the
//! last-appended index and the completion markers are `DashMap`s so that
//! per-key updates are a single shard-locked entry operation.

#[cfg(any(test, feature = "test-utils"))]
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use shared_types::{Announcement, CompletionRecord, ScoreEntry};
use tracing::debug;

use crate::domain::errors::StoreError;
use crate::domain::projection::fold_history;
use crate::ports::outbound::{AnnouncementStore, CompletionStore, ScoreStore};

/// Process-local store. Contents do not survive a restart.
#[derive(Default)]
pub struct InMemoryScoreStore {
    history: RwLock<Vec<ScoreEntry>>,
    /// Last appended entry per (team, image).
    last: DashMap<(String, String), ScoreEntry>,
    best: DashMap<(String, String), ScoreEntry>,
    completions: DashMap<String, CompletionRecord>,
    announcements: RwLock<Vec<Announcement>>,
    #[cfg(any(test, feature = "test-utils"))]
    fail_writes: AtomicBool,
}

impl InMemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of history entries.
    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }

    /// Make every subsequent write fail with `StoreError::Unavailable`.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    #[cfg(any(test, feature = "test-utils"))]
    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write failure injected".into()));
        }
        Ok(())
    }

    #[cfg(not(any(test, feature = "test-utils")))]
    fn check_writable(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl ScoreStore for InMemoryScoreStore {
    async fn append(&self, entry: &ScoreEntry) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut history = self.history.write();
        history.push(entry.clone());
        self.last
            .insert((entry.team.clone(), entry.image.clone()), entry.clone());
        drop(history);
        debug!(team = %entry.team, image = %entry.image, "history entry appended");
        Ok(())
    }

    async fn latest(&self, team: &str, image: &str) -> Result<Option<ScoreEntry>, StoreError> {
        Ok(self
            .last
            .get(&(team.to_string(), image.to_string()))
            .map(|r| r.value().clone()))
    }

    async fn upsert_best(&self, entry: &ScoreEntry) -> Result<(), StoreError> {
        self.check_writable()?;
        match self.best.entry((entry.team.clone(), entry.image.clone())) {
            Entry::Occupied(mut slot) => {
                if entry.time >= slot.get().time {
                    slot.insert(entry.clone());
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
            }
        }
        Ok(())
    }

    async fn latest_per_team_image(&self) -> Result<Vec<ScoreEntry>, StoreError> {
        Ok(self.best.iter().map(|r| r.value().clone()).collect())
    }

    async fn history(
        &self,
        team: &str,
        image: Option<&str>,
    ) -> Result<Vec<ScoreEntry>, StoreError> {
        Ok(self
            .history
            .read()
            .iter()
            .filter(|e| e.team == team && image.map_or(true, |i| e.image == i))
            .cloned()
            .collect())
    }

    async fn aggregate(&self) -> Result<Vec<ScoreEntry>, StoreError> {
        Ok(fold_history(&self.history.read()))
    }

    async fn purge_team(&self, team: &str) -> Result<usize, StoreError> {
        self.check_writable()?;
        let mut history = self.history.write();
        let before = history.len();
        history.retain(|e| e.team != team);
        self.last.retain(|(t, _), _| t != team);
        self.best.retain(|(t, _), _| t != team);
        Ok(before - history.len())
    }
}

#[async_trait]
impl CompletionStore for InMemoryScoreStore {
    async fn completion_exists(&self, image_key: &str) -> Result<bool, StoreError> {
        Ok(self.completions.contains_key(image_key))
    }

    async fn insert_completion(&self, record: CompletionRecord) -> Result<bool, StoreError> {
        self.check_writable()?;
        match self.completions.entry(record.image.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    async fn completions(&self) -> Result<Vec<CompletionRecord>, StoreError> {
        Ok(self.completions.iter().map(|r| r.value().clone()).collect())
    }

    async fn purge_team(&self, team: &str) -> Result<usize, StoreError> {
        self.check_writable()?;
        let before = self.completions.len();
        self.completions.retain(|_, record| record.team != team);
        Ok(before - self.completions.len())
    }
}

#[async_trait]
impl AnnouncementStore for InMemoryScoreStore {
    async fn insert_announcement(&self, announcement: Announcement) -> Result<(), StoreError> {
        self.check_writable()?;
        self.announcements.write().push(announcement);
        Ok(())
    }

    async fn announcements(&self) -> Result<Vec<Announcement>, StoreError> {
        let mut all = self.announcements.read().clone();
        all.sort_by(|a, b| b.time.cmp(&a.time));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, Utc};
    use shared_types::VulnLedger;
    use std::sync::Arc;
    use std::time::Duration;

    fn entry(team: &str, image: &str, secs: i64, points: i64) -> ScoreEntry {
        ScoreEntry {
            time: DateTime::<Utc>::from_timestamp(secs, 0).unwrap(),
            team: team.into(),
            image: image.into(),
            vulns: VulnLedger::default(),
            points,
            penalties: 0,
            play_time: Duration::ZERO,
            play_time_str: "00:00:00".into(),
            elapsed_time: Duration::ZERO,
            elapsed_time_str: "00:00:00".into(),
            completion_time: None,
        }
    }

    fn completion(image: &str, team: &str) -> CompletionRecord {
        CompletionRecord {
            image: image.into(),
            team: team.into(),
            alias: team.to_uppercase(),
        }
    }

    #[tokio::test]
    async fn test_latest_returns_last_appended() {
        let store = InMemoryScoreStore::new();
        store.append(&entry("t1", "web01", 10, 1)).await.unwrap();
        store.append(&entry("t1", "web01", 20, 2)).await.unwrap();
        store.append(&entry("t1", "db01", 30, 3)).await.unwrap();

        let latest = store.latest("t1", "web01").await.unwrap().unwrap();
        assert_eq!(latest.points, 2);
        assert!(store.latest("t2", "web01").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_follows_append_order() {
        let store = InMemoryScoreStore::new();
        for i in 0..100 {
            store.append(&entry("t2", "db01", 1_000 + i, i)).await.unwrap();
        }
        store.append(&entry("t1", "web01", 50, 7)).await.unwrap();
        store.append(&entry("t1", "web01", 40, 8)).await.unwrap();

        assert_eq!(store.latest("t1", "web01").await.unwrap().unwrap().points, 8);
        assert_eq!(store.latest("t2", "db01").await.unwrap().unwrap().points, 99);
    }

    #[tokio::test]
    async fn test_history_filters_by_image() {
        let store = InMemoryScoreStore::new();
        store.append(&entry("t1", "web01", 10, 1)).await.unwrap();
        store.append(&entry("t1", "db01", 20, 2)).await.unwrap();
        store.append(&entry("t2", "web01", 30, 3)).await.unwrap();

        assert_eq!(store.history("t1", None).await.unwrap().len(), 2);
        assert_eq!(store.history("t1", Some("db01")).await.unwrap().len(), 1);
        assert_eq!(store.history_len(), 3);
    }

    #[tokio::test]
    async fn test_upsert_ignores_older_entries() {
        let store = InMemoryScoreStore::new();
        store.upsert_best(&entry("t1", "web01", 20, 5)).await.unwrap();
        store.upsert_best(&entry("t1", "web01", 10, 1)).await.unwrap();
        store.upsert_best(&entry("t1", "web01", 30, 9)).await.unwrap();

        let rows = store.latest_per_team_image().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].points, 9);
    }

    #[tokio::test]
    async fn test_insert_completion_only_first_wins() {
        let store = InMemoryScoreStore::new();
        assert!(store.insert_completion(completion("web01", "t1")).await.unwrap());
        assert!(!store.insert_completion(completion("web01", "t2")).await.unwrap());
        assert!(store.completion_exists("web01").await.unwrap());
        assert!(!store.completion_exists("web01-alt").await.unwrap());

        let all = store.completions().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].team, "t1");
    }

    #[tokio::test]
    async fn test_concurrent_completion_inserts_single_winner() {
        let store = Arc::new(InMemoryScoreStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .insert_completion(completion("web01", &format!("t{i}")))
                    .await
                    .unwrap()
            }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_announcements_newest_first() {
        let store = InMemoryScoreStore::new();
        let tz = FixedOffset::east_opt(0).unwrap();
        for (secs, title) in [(10, "first"), (30, "third"), (20, "second")] {
            store
                .insert_announcement(Announcement {
                    time: DateTime::from_timestamp(secs, 0).unwrap().with_timezone(&tz),
                    title: title.into(),
                    body: String::new(),
                })
                .await
                .unwrap();
        }
        let titles: Vec<_> = store
            .announcements()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let store = InMemoryScoreStore::new();
        store.set_fail_writes(true);
        let err = store.append(&entry("t1", "web01", 1, 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.history_len(), 0);
    }

    #[tokio::test]
    async fn test_purge_team_removes_only_that_team() {
        let store = InMemoryScoreStore::new();
        for e in [
            entry("testing_id", "web01", 10, 5),
            entry("testing_id", "db01", 20, 6),
            entry("t1", "web01", 30, 7),
        ] {
            store.append(&e).await.unwrap();
            store.upsert_best(&e).await.unwrap();
        }
        store
            .insert_completion(completion("web01", "testing_id"))
            .await
            .unwrap();
        store.insert_completion(completion("db01", "t1")).await.unwrap();

        assert_eq!(ScoreStore::purge_team(&store, "testing_id").await.unwrap(), 2);
        assert_eq!(CompletionStore::purge_team(&store, "testing_id").await.unwrap(), 1);

        assert_eq!(store.history_len(), 1);
        assert!(store.latest("testing_id", "web01").await.unwrap().is_none());
        let rows = store.latest_per_team_image().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team, "t1");
        assert!(!store.completion_exists("web01").await.unwrap());
        assert!(store.completion_exists("db01").await.unwrap());
    }

    #[tokio::test]
    async fn test_aggregate_folds_history() {
        let store = InMemoryScoreStore::new();
        store.append(&entry("t1", "web01", 10, 1)).await.unwrap();
        store.append(&entry("t1", "web01", 20, 4)).await.unwrap();
        let rows = store.aggregate().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].points, 4);
    }
}
