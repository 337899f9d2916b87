//! Gateway configuration with validation.
//!
//! Loaded from a TOML file; every section falls back to its defaults.
//!
//! ```toml
//! [http]
//! port = 8080
//!
//! [competition]
//! event = "Spring Range"
//! password = "change-me"
//! utc_offset_minutes = -300
//!
//! [[teams]]
//! id = "t1"
//! alias = "red-rovers"
//!
//! [[images]]
//! name = "web01"
//! color = "#e6194b"
//!
//! [scoring]
//! idle_threshold = "5m"
//! play_time_limit = "6h"
//! enforce_play_time = true
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use axum::http::HeaderValue;
use chrono::FixedOffset;
use rs_02_ingestion::{
    CompletionPolicy, IngestionConfig, PlayTimeCutoff, DEFAULT_ALTERNATE_SUFFIX,
    DEFAULT_IDLE_THRESHOLD, DEFAULT_SENTINEL_TEAM,
};
use rs_04_shell_relay::DEFAULT_CHANNEL_CAPACITY;
use serde::{Deserialize, Serialize};
use shared_types::{Image, Roster, RosterError, Team};

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Event name, shared password and local time zone
    pub competition: CompetitionConfig,
    pub teams: Vec<Team>,
    /// Images in scoreboard order; `index` is assigned from position
    pub images: Vec<Image>,
    /// Time accounting and completion rules
    pub scoring: ScoringConfig,
    pub shell: ShellConfig,
    pub admin: AdminConfig,
    pub cors: CorsConfig,
}

impl GatewayConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.competition.password.is_empty() {
            return Err(ConfigError::MissingPassword);
        }

        if self.http.port == 0 {
            return Err(ConfigError::Invalid("http.port cannot be 0".into()));
        }

        if self.scoring.idle_threshold.is_zero() {
            return Err(ConfigError::InvalidDuration(
                "scoring.idle_threshold cannot be 0".into(),
            ));
        }

        if self.shell.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "shell.channel_capacity cannot be 0".into(),
            ));
        }

        if !self.cors.allows_any_origin() {
            if let Some(bad) = self
                .cors
                .allowed_origins
                .iter()
                .find(|o| !is_origin(o))
            {
                return Err(ConfigError::Invalid(format!(
                    "cors.allowed_origins entry {bad:?} is not a valid origin"
                )));
            }
        }

        self.offset()?;
        self.roster()?;
        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }

    /// Competition time zone.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        let minutes = self.competition.utc_offset_minutes;
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::InvalidOffset(minutes))
    }

    /// Validated roster; image indices follow declaration order.
    pub fn roster(&self) -> Result<Roster, ConfigError> {
        let images = self
            .images
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, image)| Image { index, ..image })
            .collect();
        Ok(Roster::new(self.teams.clone(), images)?)
    }

    pub fn ingestion_config(&self) -> IngestionConfig {
        IngestionConfig {
            event: self.competition.event.clone(),
            idle_threshold: self.scoring.idle_threshold,
            cutoff: PlayTimeCutoff {
                limit: self.scoring.play_time_limit,
                enforce: self.scoring.enforce_play_time,
            },
            accepting: self.scoring.accepting,
        }
    }

    pub fn completion_policy(&self) -> Result<CompletionPolicy, ConfigError> {
        Ok(CompletionPolicy::new(
            self.scoring.sentinel_teams.iter().cloned(),
            self.scoring.alternate_track_teams.iter().cloned(),
            self.scoring.alternate_track_suffix.clone(),
            self.offset()?,
        ))
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitionConfig {
    /// Shown in announcements
    pub event: String,
    /// Shared secret the agents encrypt with
    pub password: String,
    /// Local time zone for completion timestamps
    pub utc_offset_minutes: i32,
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self {
            event: "Range".to_string(),
            password: String::new(),
            utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Gaps at or above this do not count as play time
    #[serde(with = "humantime_serde")]
    pub idle_threshold: Duration,
    /// Play-time budget per (team, image)
    #[serde(with = "humantime_serde::option")]
    pub play_time_limit: Option<Duration>,
    /// Answer `DIE` to agents past the budget
    pub enforce_play_time: bool,
    /// Teams that never trigger completion
    pub sentinel_teams: Vec<String>,
    /// Teams announced under suffixed image keys as well
    pub alternate_track_teams: Vec<String>,
    pub alternate_track_suffix: String,
    /// Accept telegrams at startup
    pub accepting: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            play_time_limit: None,
            enforce_play_time: false,
            sentinel_teams: vec![DEFAULT_SENTINEL_TEAM.to_string()],
            alternate_track_teams: Vec::new(),
            alternate_track_suffix: DEFAULT_ALTERNATE_SUFFIX.to_string(),
            accepting: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Frames buffered per relay pipe
    pub channel_capacity: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Admin surface configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Bind the scoring toggle, manual announcements and the sentinel purge;
    /// only safe behind an authenticating proxy
    #[serde(alias = "enable_scoring_toggle")]
    pub enable_admin_routes: bool,
}

/// Cross-origin access for browser dashboards
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    /// Dashboard origins, or `["*"]` for any
    pub allowed_origins: Vec<String>,
    /// Preflight cache lifetime in seconds
    pub max_age: u64,
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            max_age: 86400,
        }
    }
}

fn is_origin(origin: &str) -> bool {
    (origin.starts_with("https://") || origin.starts_with("http://"))
        && HeaderValue::from_str(origin).is_ok()
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Read(String),
    #[error("cannot parse config: {0}")]
    Parse(String),
    #[error("competition.password must be set")]
    MissingPassword,
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
    #[error("invalid UTC offset: {0} minutes")]
    InvalidOffset(i32),
    #[error("invalid roster: {0}")]
    Roster(#[from] RosterError),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Durations written as `90s`, `250ms`, `5m`, `6h` or bare seconds.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            return ms
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds");
        }
        let (count, unit_secs) = if let Some(secs) = s.strip_suffix('s') {
            (secs, 1)
        } else if let Some(mins) = s.strip_suffix('m') {
            (mins, 60)
        } else if let Some(hours) = s.strip_suffix('h') {
            (hours, 3600)
        } else {
            (s, 1)
        };
        count
            .trim()
            .parse::<u64>()
            .map_err(|_| "invalid duration format")?
            .checked_mul(unit_secs)
            .map(Duration::from_secs)
            .ok_or("duration out of range")
    }

    /// Same format for an optional duration.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match duration {
                Some(d) => serializer.serialize_some(&format!("{}s", d.as_secs())),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| super::parse_duration(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
