//! # Telegram Grammar
//!
//! Wire contract version 1. A decrypted telegram is a `DELIMITER`-separated
//! token list:
//!
//! ```text
//! team | t1 | image | web01 | score | 100 | challenge | c | vulns | <hex> | time | <ts> | <terminator>
//! ```
//!
//! The first `2 × FIELD_ORDER.len()` tokens are key/value pairs in exactly
//! this order. The trailing terminator absorbs agent-side padding and is
//! ignored, as is anything after it.

use shared_types::is_valid_token;

use crate::domain::errors::IngestError;

/// Token separator shared by the telegram and the vuln sub-payload.
pub const DELIMITER: &str = "|-SP-|";

/// Key order mandated by the wire contract.
pub const FIELD_ORDER: [&str; 6] = ["team", "image", "score", "challenge", "vulns", "time"];

/// Key/value tokens plus the terminator.
pub const MIN_TOKENS: usize = FIELD_ORDER.len() * 2 + 1;

/// A grammatically valid, not yet resolved telegram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    pub team: String,
    pub image: String,
    pub score: i64,
    pub challenge: String,
    /// Still-encrypted vuln sub-payload (hex).
    pub vulns: String,
    /// Agent-reported timestamp. Informational only; the server clock wins.
    pub time: String,
}

impl Telegram {
    /// Tokenize and validate a decrypted telegram.
    pub fn parse(plaintext: &str) -> Result<Self, IngestError> {
        let tokens: Vec<&str> = plaintext.split(DELIMITER).collect();
        if tokens.len() < MIN_TOKENS {
            return Err(IngestError::MalformedUpdate(format!(
                "expected at least {MIN_TOKENS} tokens, got {}",
                tokens.len()
            )));
        }

        let mut values = [""; FIELD_ORDER.len()];
        for (slot, expected) in FIELD_ORDER.iter().enumerate() {
            let key = tokens[slot * 2];
            let value = tokens[slot * 2 + 1];
            if key != *expected {
                return Err(IngestError::MalformedUpdate(format!(
                    "expected key {expected:?} at position {}, found {key:?}",
                    slot * 2
                )));
            }
            if !is_valid_token(value) {
                return Err(IngestError::MalformedUpdate(format!(
                    "field {expected} contains invalid characters"
                )));
            }
            values[slot] = value;
        }

        let [team, image, score, challenge, vulns, time] = values;
        let score = score
            .parse::<i64>()
            .map_err(|_| IngestError::MalformedUpdate(format!("score {score:?} is not an integer")))?;

        Ok(Self {
            team: team.to_string(),
            image: image.to_string(),
            score,
            challenge: challenge.to_string(),
            vulns: vulns.to_string(),
            time: time.to_string(),
        })
    }

    /// Render in wire order with an empty terminator.
    pub fn encode(&self) -> String {
        let score = self.score.to_string();
        let values = [
            self.team.as_str(),
            self.image.as_str(),
            score.as_str(),
            self.challenge.as_str(),
            self.vulns.as_str(),
            self.time.as_str(),
        ];
        let mut out = String::new();
        for (key, value) in FIELD_ORDER.iter().zip(values) {
            out.push_str(key);
            out.push_str(DELIMITER);
            out.push_str(value);
            out.push_str(DELIMITER);
        }
        out
    }
}
