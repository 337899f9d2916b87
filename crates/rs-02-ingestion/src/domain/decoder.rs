//! Secure update decoder: transport string → resolved telegram.

use std::sync::Arc;

use shared_crypto::TelegramCipher;
use shared_types::{is_valid_token, Image, Roster, Team};

use crate::domain::errors::IngestError;
use crate::domain::telegram::Telegram;

/// A decrypted telegram whose team and image exist in the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedUpdate {
    pub team: Team,
    pub image: Image,
    pub score: i64,
    pub challenge: String,
    /// Still-encrypted vuln sub-payload (hex).
    pub vulns_payload: String,
}

/// Decrypts and validates submissions against one roster and password.
pub struct UpdateDecoder {
    cipher: TelegramCipher,
    roster: Arc<Roster>,
}

impl UpdateDecoder {
    pub fn new(cipher: TelegramCipher, roster: Arc<Roster>) -> Self {
        Self { cipher, roster }
    }

    pub fn cipher(&self) -> &TelegramCipher {
        &self.cipher
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Decode one submission.
    ///
    /// Stages fail in order: character class, hex, decryption, grammar,
    /// roster resolution. Never panics on hostile input.
    pub fn decode(&self, submission: &str) -> Result<DecodedUpdate, IngestError> {
        if !is_valid_token(submission) {
            return Err(IngestError::MalformedInput);
        }

        let plaintext = self.cipher.open_hex(submission)?;
        let plaintext = String::from_utf8(plaintext)
            .map_err(|_| IngestError::MalformedUpdate("plaintext is not UTF-8".into()))?;
        let telegram = Telegram::parse(&plaintext)?;

        let team = self
            .roster
            .resolve_team(&telegram.team)
            .ok_or_else(|| IngestError::UnknownTeam(telegram.team.clone()))?;
        let image = self
            .roster
            .image(&telegram.image)
            .ok_or_else(|| IngestError::UnknownImage(telegram.image.clone()))?;

        Ok(DecodedUpdate {
            team: team.clone(),
            image: image.clone(),
            score: telegram.score,
            challenge: telegram.challenge,
            vulns_payload: telegram.vulns,
        })
    }
}
