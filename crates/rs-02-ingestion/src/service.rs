//! # Ingestion Service
//!
//! Application service wiring the decoder, ledger parser, time accounting and
//! completion trigger to the store ports.
//!
//! ```text
//! submission ─→ decode ─→ ledger (sum check) ─→ latest(team, image)
//!                                                   │
//!            append + upsert ←─ completion time ←─ accounting
//!                  │
//!                  └─→ first-completion race ─→ announcement + notify
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use range_telemetry::{
    metric_inc, HistogramTimer, COMPLETIONS_ANNOUNCED, COMPLETION_SIDE_EFFECT_FAILURES,
    INGEST_DURATION, TAMPER_DETECTED, TELEGRAMS_ACCEPTED, TELEGRAMS_REJECTED,
};
use rs_01_score_store::Stores;
use serde::Serialize;
use shared_types::{
    format_clock, Announcement, CompletionRecord, Image, Roster, ScoreEntry, Team,
};
use tracing::{debug, info, warn};

use crate::domain::accounting::{account, DEFAULT_IDLE_THRESHOLD};
use crate::domain::completion::{announcement_for, notification_for, CompletionPolicy};
use crate::domain::decoder::UpdateDecoder;
use crate::domain::errors::IngestError;
use crate::domain::ledger::parse_ledger;
use crate::domain::status::{AgentStatus, PlayTimeCutoff, StatusBoard};
use crate::ports::outbound::{Clock, Notifier};

/// Tunables for the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// Event name used in announcements.
    pub event: String,
    pub idle_threshold: Duration,
    pub cutoff: PlayTimeCutoff,
    /// Whether telegrams are accepted at startup.
    pub accepting: bool,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            event: "Range".to_string(),
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            cutoff: PlayTimeCutoff::default(),
            accepting: true,
        }
    }
}

/// What a sentinel purge removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub scores: usize,
    pub completions: usize,
}

pub struct IngestionService {
    decoder: UpdateDecoder,
    policy: CompletionPolicy,
    config: IngestionConfig,
    stores: Stores,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    status: Arc<StatusBoard>,
    accepting: AtomicBool,
}

impl IngestionService {
    pub fn new(
        decoder: UpdateDecoder,
        policy: CompletionPolicy,
        config: IngestionConfig,
        stores: Stores,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let accepting = AtomicBool::new(config.accepting);
        Self {
            decoder,
            policy,
            config,
            stores,
            notifier,
            clock,
            status: Arc::new(StatusBoard::new()),
            accepting,
        }
    }

    pub fn roster(&self) -> &Roster {
        self.decoder.roster()
    }

    pub fn policy(&self) -> &CompletionPolicy {
        &self.policy
    }

    /// Shared directive board; the shell relay posts `Shell` here.
    pub fn status_board(&self) -> Arc<StatusBoard> {
        Arc::clone(&self.status)
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    pub fn set_accepting(&self, accepting: bool) {
        let was = self.accepting.swap(accepting, Ordering::SeqCst);
        if was != accepting {
            info!(accepting, "score acceptance toggled");
        }
    }

    /// Process one submission end to end.
    pub async fn submit(&self, submission: &str) -> Result<ScoreEntry, IngestError> {
        let _timer = HistogramTimer::new(&INGEST_DURATION);
        let result = self.ingest(submission).await;
        match &result {
            Ok(entry) => {
                metric_inc!(TELEGRAMS_ACCEPTED);
                info!(
                    team = %entry.team,
                    image = %entry.image,
                    points = entry.points,
                    play_time = %entry.play_time_str,
                    "telegram accepted"
                );
            }
            Err(err) => {
                metric_inc!(TELEGRAMS_REJECTED, &[err.reason()]);
                if err.is_client_fault() {
                    debug!(error = %err, "telegram rejected");
                } else {
                    warn!(error = %err, "telegram not processed");
                }
            }
        }
        result
    }

    async fn ingest(&self, submission: &str) -> Result<ScoreEntry, IngestError> {
        if !self.is_accepting() {
            return Err(IngestError::ScoringDisabled);
        }

        let update = self.decoder.decode(submission)?;
        let vulns = match parse_ledger(self.decoder.cipher(), &update.vulns_payload, update.score) {
            Err(IngestError::TamperDetected { claimed, computed }) => {
                metric_inc!(TAMPER_DETECTED);
                warn!(
                    team = %update.team.id,
                    image = %update.image.name,
                    claimed,
                    computed,
                    "tamper detected: vuln points don't add up"
                );
                return Err(IngestError::TamperDetected { claimed, computed });
            }
            other => other?,
        };

        let now = self.clock.now();
        let prev = self
            .stores
            .scores
            .latest(&update.team.id, &update.image.name)
            .await?;
        let times = account(now, prev.as_ref(), self.config.idle_threshold);
        let completion_time =
            self.policy
                .completion_time(&update.team.id, &vulns, prev.as_ref(), now);

        let entry = ScoreEntry {
            time: now,
            team: update.team.id.clone(),
            image: update.image.name.clone(),
            penalties: vulns.penalty_count(),
            vulns,
            points: update.score,
            play_time: times.play_time,
            play_time_str: format_clock(times.play_time),
            elapsed_time: times.elapsed_time,
            elapsed_time_str: format_clock(times.elapsed_time),
            completion_time,
        };

        self.stores.scores.append(&entry).await?;
        self.stores.scores.upsert_best(&entry).await?;

        if entry.completion_time.is_some() {
            self.claim_completions(&update.team, &update.image).await?;
        }
        Ok(entry)
    }

    /// Race for every completion key this team competes for on `image`.
    async fn claim_completions(&self, team: &Team, image: &Image) -> Result<(), IngestError> {
        for key in self.policy.completion_keys(&team.id, &image.name) {
            if self.stores.completions.completion_exists(&key).await? {
                continue;
            }
            let record = CompletionRecord {
                image: key,
                team: team.id.clone(),
                alias: team.alias.clone(),
            };
            if !self
                .stores
                .completions
                .insert_completion(record.clone())
                .await?
            {
                // Lost the race to a concurrent telegram.
                continue;
            }

            metric_inc!(COMPLETIONS_ANNOUNCED);
            info!(team = %team.id, image = %record.image, "first completion");

            // The completion is already recorded, so later failures are
            // logged and counted rather than failing the telegram.
            let now = self.clock.now().with_timezone(&self.policy.offset());
            if let Err(e) = self
                .stores
                .announcements
                .insert_announcement(announcement_for(&record, &self.config.event, now))
                .await
            {
                metric_inc!(COMPLETION_SIDE_EFFECT_FAILURES, &["announcement"]);
                warn!(error = %e, image = %record.image, "completion announcement write failed");
            }

            if let Err(e) = self.notifier.send(&notification_for(&record)).await {
                metric_inc!(COMPLETION_SIDE_EFFECT_FAILURES, &["notification"]);
                warn!(error = %e, image = %record.image, "completion notification failed");
            }
        }
        Ok(())
    }

    /// Post an operator-written announcement, stamped in the competition zone.
    ///
    /// The notifier is told as well; its failure is only logged.
    pub async fn announce(&self, title: &str, body: &str) -> Result<Announcement, IngestError> {
        let announcement = Announcement {
            time: self.clock.now().with_timezone(&self.policy.offset()),
            title: title.to_string(),
            body: body.to_string(),
        };
        self.stores
            .announcements
            .insert_announcement(announcement.clone())
            .await?;
        info!(title = %announcement.title, "announcement posted");

        if let Err(e) = self.notifier.send(&format!("**{title}**\n{body}")).await {
            warn!(error = %e, "announcement notification failed");
        }
        Ok(announcement)
    }

    /// Remove scores and completions recorded for the sentinel teams.
    pub async fn purge_sentinel_data(&self) -> Result<PurgeReport, IngestError> {
        let mut report = PurgeReport::default();
        for team in self.policy.sentinel_teams() {
            report.scores += self.stores.scores.purge_team(team).await?;
            report.completions += self.stores.completions.purge_team(team).await?;
        }
        info!(
            scores = report.scores,
            completions = report.completions,
            "sentinel team data purged"
        );
        Ok(report)
    }

    /// Reply for an agent status poll.
    ///
    /// Precedence: play-time kill switch, scoring paused, queued directive,
    /// then `Ok`.
    pub async fn agent_status(&self, team: &str, image: &str) -> Result<AgentStatus, IngestError> {
        let team = self
            .roster()
            .resolve_team(team)
            .ok_or_else(|| IngestError::UnknownTeam(team.to_string()))?
            .id
            .clone();
        if self.roster().image(image).is_none() {
            return Err(IngestError::UnknownImage(image.to_string()));
        }

        if self.config.cutoff.limit.is_some() {
            if let Some(latest) = self.stores.scores.latest(&team, image).await? {
                if self.config.cutoff.exceeded(latest.play_time) {
                    return Ok(AgentStatus::Die);
                }
            }
        }

        if !self.is_accepting() {
            return Ok(AgentStatus::Disabled);
        }

        Ok(self.status.take(&team, image).unwrap_or(AgentStatus::Ok))
    }
}
