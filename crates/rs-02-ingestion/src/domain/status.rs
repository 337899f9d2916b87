//! Agent status polling.
//!
//! Agents poll `/status/{team}/{image}` between telegrams. The reply is a
//! play-time kill switch, a scoring-paused notice, a one-shot directive
//! queued by the server (for example "open a shell"), or `OK`.

use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;

/// Reply token understood by scoring agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentStatus {
    Ok,
    /// Play-time limit exceeded; agent should stop the image.
    Die,
    /// Scoring paused.
    Disabled,
    /// An operator is waiting; agent should open its shell connections.
    Shell,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Die => "DIE",
            Self::Disabled => "DISABLED",
            Self::Shell => "SHELL",
        }
    }
}

/// Play-time cutoff enforced through the status endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayTimeCutoff {
    pub limit: Option<Duration>,
    pub enforce: bool,
}

impl PlayTimeCutoff {
    /// True when the cutoff is enforced and `play_time` is strictly past it.
    pub fn exceeded(&self, play_time: Duration) -> bool {
        self.enforce && self.limit.is_some_and(|limit| play_time > limit)
    }
}

/// One-shot directives keyed by (team id, image).
#[derive(Debug, Default)]
pub struct StatusBoard {
    directives: DashMap<(String, String), AgentStatus>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a directive, replacing any undelivered one.
    pub fn post(&self, team: &str, image: &str, status: AgentStatus) {
        self.directives
            .insert((team.to_string(), image.to_string()), status);
    }

    /// Remove and return the pending directive, if any.
    pub fn take(&self, team: &str, image: &str) -> Option<AgentStatus> {
        self.directives
            .remove(&(team.to_string(), image.to_string()))
            .map(|(_, status)| status)
    }

    pub fn pending(&self) -> usize {
        self.directives.len()
    }
}
