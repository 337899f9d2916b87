//! HTTP handlers for agents, dashboards and operators.

use std::collections::HashMap;

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use range_telemetry::encode_metrics;
use rs_02_ingestion::{AgentStatus, PurgeReport};
use serde::Deserialize;
use serde_json::json;
use shared_types::Announcement;
use tracing::error;

use crate::domain::error::ApiError;
use crate::router::AppState;

/// Form body of `POST /update`.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub update: String,
}

/// `POST /update`
pub async fn submit_update(
    State(state): State<AppState>,
    form: Result<Form<UpdateForm>, FormRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Ok(Form(form)) = form else {
        return Err(ApiError::InvalidRequest);
    };
    state.ingestion.submit(&form.update).await?;
    Ok(Json(json!({ "status": "OK" })))
}

/// `GET /status/:id/:image`
pub async fn agent_status(
    State(state): State<AppState>,
    Path((team, image)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let status = state.ingestion.agent_status(&team, &image).await?;
    let code = match status {
        AgentStatus::Disabled => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };
    Ok((code, Json(json!({ "status": status }))).into_response())
}

/// `GET /api/scoreboard`
pub async fn scoreboard(State(state): State<AppState>) -> Result<Response, ApiError> {
    Ok(Json(state.scoreboard.scoreboard().await?).into_response())
}

/// `GET /api/image/:image`
pub async fn image_board(
    State(state): State<AppState>,
    Path(image): Path<String>,
) -> Result<Response, ApiError> {
    Ok(Json(state.scoreboard.image_board(&image).await?).into_response())
}

/// `GET /api/team/:team?image=<name>&record<N>=<index>`
pub async fn team_detail(
    State(state): State<AppState>,
    Path(team): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let overrides = record_overrides(&params)?;
    let image = params.get("image").map(String::as_str);
    let detail = state
        .scoreboard
        .team_detail(&team, image, &overrides)
        .await?;
    Ok(Json(detail).into_response())
}

/// Collect `record<N>=<index>` query parameters.
pub fn record_overrides(
    params: &HashMap<String, String>,
) -> Result<HashMap<usize, usize>, ApiError> {
    params
        .iter()
        .filter_map(|(key, value)| key.strip_prefix("record").map(|n| (n, value)))
        .map(|(position, index)| -> Result<(usize, usize), ApiError> {
            let position: usize = position.parse().map_err(|_| ApiError::InvalidRequest)?;
            let index: usize = index.parse().map_err(|_| ApiError::InvalidRequest)?;
            Ok((position, index))
        })
        .collect()
}

/// `GET /api/announcements`, newest first.
pub async fn announcements(
    State(state): State<AppState>,
) -> Result<Json<Vec<Announcement>>, ApiError> {
    Ok(Json(state.announcements.announcements().await?))
}

/// Body of `POST /api/announcements`.
#[derive(Debug, Deserialize)]
pub struct NewAnnouncement {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// `POST /api/announcements` (admin)
pub async fn post_announcement(
    State(state): State<AppState>,
    Json(new): Json<NewAnnouncement>,
) -> Result<(StatusCode, Json<Announcement>), ApiError> {
    if new.title.trim().is_empty() {
        return Err(ApiError::InvalidRequest);
    }
    let posted = state.ingestion.announce(&new.title, &new.body).await?;
    Ok((StatusCode::CREATED, Json(posted)))
}

/// `DELETE /api/test-data` (admin): purge the sentinel teams.
pub async fn purge_test_data(
    State(state): State<AppState>,
) -> Result<Json<PurgeReport>, ApiError> {
    Ok(Json(state.ingestion.purge_sentinel_data().await?))
}

/// Body of `POST /api/scoring`.
#[derive(Debug, Deserialize)]
pub struct ScoringToggle {
    pub accepting: bool,
}

/// `POST /api/scoring`
pub async fn toggle_scoring(
    State(state): State<AppState>,
    Json(toggle): Json<ScoringToggle>,
) -> Json<serde_json::Value> {
    state.ingestion.set_accepting(toggle.accepting);
    Json(json!({ "accepting": state.ingestion.is_accepting() }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "accepting": state.ingestion.is_accepting(),
        "active_shells": state.shells.active_count(),
    }))
}

/// `GET /metrics` in Prometheus text format.
pub async fn metrics() -> Response {
    match encode_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "metrics encoding failed");
            ApiError::Internal.into_response()
        }
    }
}
