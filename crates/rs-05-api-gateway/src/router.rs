//! Route table and shared handler state.

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use rs_01_score_store::AnnouncementStore;
use rs_02_ingestion::IngestionService;
use rs_03_scoreboard::ScoreboardService;
use rs_04_shell_relay::ShellRegistry;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::domain::config::GatewayConfig;
use crate::middleware::create_cors_layer;
use crate::{rest, ws};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<IngestionService>,
    pub scoreboard: Arc<ScoreboardService>,
    pub shells: Arc<ShellRegistry>,
    pub announcements: Arc<dyn AnnouncementStore>,
}

/// Build the full HTTP and websocket surface.
///
/// Admin routes (`POST /api/scoring`, `POST /api/announcements` and
/// `DELETE /api/test-data`) are only bound when `admin.enable_admin_routes`
/// is set.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let admin = config.admin.enable_admin_routes;

    let mut announcements = get(rest::announcements);
    if admin {
        announcements = announcements.post(rest::post_announcement);
    }

    let mut router = Router::new()
        // Agents
        .route("/update", post(rest::submit_update))
        .route("/status/:id/:image", get(rest::agent_status))
        // Dashboards
        .route("/api/scoreboard", get(rest::scoreboard))
        .route("/api/image/:image", get(rest::image_board))
        .route("/api/team/:team", get(rest::team_detail))
        .route("/api/announcements", announcements)
        // Shell relay
        .route(
            "/shell/:id/:image/operator/input",
            get(ws::handler::operator_input),
        )
        .route(
            "/shell/:id/:image/operator/output",
            get(ws::handler::operator_output),
        )
        .route(
            "/shell/:id/:image/target/input",
            get(ws::handler::target_input),
        )
        .route(
            "/shell/:id/:image/target/output",
            get(ws::handler::target_output),
        )
        // Ops
        .route("/health", get(rest::health))
        .route("/metrics", get(rest::metrics));

    if admin {
        router = router
            .route("/api/scoring", post(rest::toggle_scoring))
            .route("/api/test-data", delete(rest::purge_test_data));
    }

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer(&config.cors, admin));

    router.layer(middleware).with_state(state)
}
