//! Test doubles and fixtures for ingestion and downstream crates.
//!
//! Enabled for this crate's tests and, via the `test-utils` feature, for the
//! workspace integration suite.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use parking_lot::Mutex;
use shared_crypto::TelegramCipher;
use shared_types::{Image, Roster, Team, VulnItem, VulnLedger};

use crate::domain::ledger::encode_ledger;
use crate::domain::telegram::Telegram;
use crate::ports::outbound::{Clock, Notifier, NotifyError};

/// Password used by `TelegramBuilder` unless overridden.
pub const TEST_PASSWORD: &str = "range-test-password";

/// Teams `t1` (alias `red-rovers`), `t2` (`blue-jays`), `testing_id`;
/// images `web01`, `db01`.
pub fn test_roster() -> Roster {
    let team = |id: &str, alias: &str| Team {
        id: id.to_string(),
        alias: alias.to_string(),
        email: format!("{id}@range.test"),
    };
    let image = |name: &str, color: &str, index: usize| Image {
        name: name.to_string(),
        color: color.to_string(),
        index,
    };
    Roster::new(
        vec![
            team("t1", "red-rovers"),
            team("t2", "blue-jays"),
            team("testing_id", "testing"),
        ],
        vec![image("web01", "#e6194b", 0), image("db01", "#3cb44b", 1)],
    )
    .expect("test roster is valid")
}

/// Builds sealed, hex-encoded telegrams the way a scoring agent does.
#[derive(Debug, Clone)]
pub struct TelegramBuilder {
    team: String,
    image: String,
    items: Vec<VulnItem>,
    counts: Option<(u32, u32)>,
    claim: Option<i64>,
    password: String,
}

impl TelegramBuilder {
    pub fn new(team: &str, image: &str) -> Self {
        Self {
            team: team.to_string(),
            image: image.to_string(),
            items: Vec::new(),
            counts: None,
            claim: None,
            password: TEST_PASSWORD.to_string(),
        }
    }

    pub fn item(mut self, text: &str, points: i64) -> Self {
        self.items.push(VulnItem {
            text: text.to_string(),
            points,
        });
        self
    }

    /// Override scored/total counts (default: positive items out of 10).
    pub fn vulns(mut self, scored: u32, total: u32) -> Self {
        self.counts = Some((scored, total));
        self
    }

    /// Claim a score different from the item sum.
    pub fn claim(mut self, score: i64) -> Self {
        self.claim = Some(score);
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    pub fn build(&self) -> String {
        let cipher = TelegramCipher::from_password(&self.password);
        let positives = self.items.iter().filter(|i| i.points > 0).count() as u32;
        let (vulns_scored, vulns_total) = self.counts.unwrap_or((positives, 10));
        let ledger = VulnLedger {
            vulns_scored,
            vulns_total,
            items: self.items.clone(),
        };

        let vulns = cipher
            .seal_hex(pad_block(encode_ledger(&ledger)).as_bytes())
            .expect("sealing succeeds");
        let telegram = Telegram {
            team: self.team.clone(),
            image: self.image.clone(),
            score: self.claim
                .unwrap_or_else(|| ledger.point_sum().expect("ledger sum fits in i64")),
            challenge: "none".to_string(),
            vulns,
            time: "1700000000".to_string(),
        };
        cipher
            .seal_hex(pad_block(telegram.encode()).as_bytes())
            .expect("sealing succeeds")
    }
}

/// Space-pad to a 16-byte multiple, as agents do.
fn pad_block(mut plaintext: String) -> String {
    let pad = 16 - plaintext.len() % 16;
    plaintext.extend(std::iter::repeat(' ').take(pad));
    plaintext
}

/// Manually advanced clock.
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock() += by;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::at(
            Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0)
                .single()
                .expect("valid fixed date"),
        )
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Notifier that records every message and can be told to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError("webhook unreachable".to_string()));
        }
        self.sent.lock().push(text.to_string());
        Ok(())
    }
}
