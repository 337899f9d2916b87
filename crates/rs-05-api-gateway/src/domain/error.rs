//! HTTP error mapping.
//!
//! Ingestion failures collapse into one generic 400 so a client cannot tell
//! a bad key from a bad ledger. Persistence failures are the server's fault
//! and surface as 500 after being logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rs_01_score_store::StoreError;
use rs_02_ingestion::IngestError;
use rs_03_scoreboard::ScoreboardError;
use rs_04_shell_relay::ShellError;
use serde_json::json;
use tracing::error;

use crate::domain::config::ConfigError;

/// Body of every rejected ingestion request.
pub const GENERIC_REJECTION: &str = "Invalid request.";

/// Error returned by HTTP handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 400 with the generic body.
    InvalidRequest,
    /// 400 `{"status":"DISABLED"}`; scoring is paused.
    Disabled,
    /// 404 naming what was missing.
    NotFound(String),
    /// 500; details are logged, never returned.
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest | Self::Disabled => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::InvalidRequest => json!({ "error": GENERIC_REJECTION }),
            Self::Disabled => json!({ "status": "DISABLED" }),
            Self::NotFound(what) => json!({ "error": what }),
            Self::Internal => json!({ "error": "Internal server error." }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::ScoringDisabled => Self::Disabled,
            IngestError::Persistence(e) => e.into(),
            _ => Self::InvalidRequest,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "store failure while serving request");
        Self::Internal
    }
}

impl From<ScoreboardError> for ApiError {
    fn from(err: ScoreboardError) -> Self {
        if err.is_not_found() {
            return Self::NotFound(err.to_string());
        }
        match err {
            ScoreboardError::Store(e) => e.into(),
            _ => Self::InvalidRequest,
        }
    }
}

impl From<ShellError> for ApiError {
    fn from(_: ShellError) -> Self {
        Self::InvalidRequest
    }
}

/// Startup and serving errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server stopped with an I/O error
    #[error("server error: {0}")]
    Serve(String),
}
