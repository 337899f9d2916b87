//! Ingestion error types.
//!
//! Every variant except `Persistence` is a client fault and maps to the same
//! generic 400 at the HTTP boundary.

use rs_01_score_store::StoreError;
use shared_crypto::CryptoError;
use thiserror::Error;

/// Why a telegram was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// Empty submission or characters outside `[A-Za-z0-9_-]`.
    #[error("Malformed input")]
    MalformedInput,

    /// Transport string is not hex.
    #[error("Invalid transport encoding")]
    EncodingError,

    /// Envelope failed authentication or was truncated.
    #[error("Decryption failed: {0}")]
    DecryptionError(CryptoError),

    /// Plaintext does not follow the telegram grammar.
    #[error("Malformed update: {0}")]
    MalformedUpdate(String),

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Unknown image: {0}")]
    UnknownImage(String),

    /// Vuln sub-payload header is unusable.
    #[error("Malformed vulnerability ledger: {0}")]
    MalformedVulns(String),

    /// One ledger line could not be parsed.
    #[error("Malformed vulnerability item {item:?}: {reason}")]
    MalformedVulnItem { item: String, reason: String },

    /// Ledger items do not add up to the claimed score.
    #[error("Vuln points don't add up: claimed {claimed}, computed {computed}")]
    TamperDetected { claimed: i64, computed: i64 },

    /// Scoring is paused by an administrator.
    #[error("Scoring is disabled")]
    ScoringDisabled,

    /// Backend failure; not the client's fault.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl IngestError {
    /// Short label for the rejection metric.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MalformedInput => "malformed_input",
            Self::EncodingError => "encoding",
            Self::DecryptionError(_) => "decryption",
            Self::MalformedUpdate(_) => "malformed_update",
            Self::UnknownTeam(_) => "unknown_team",
            Self::UnknownImage(_) => "unknown_image",
            Self::MalformedVulns(_) => "malformed_vulns",
            Self::MalformedVulnItem { .. } => "malformed_vuln_item",
            Self::TamperDetected { .. } => "tamper",
            Self::ScoringDisabled => "disabled",
            Self::Persistence(_) => "persistence",
        }
    }

    /// True for failures caused by the submitted telegram.
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, Self::Persistence(_) | Self::ScoringDisabled)
    }
}

/// Map an envelope failure onto the decoder's error taxonomy.
impl From<CryptoError> for IngestError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidEncoding(_) => Self::EncodingError,
            other => Self::DecryptionError(other),
        }
    }
}
