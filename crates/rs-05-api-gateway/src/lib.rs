//! # API Gateway (rs-05)
//!
//! HTTP and websocket surface of the range scoreboard.
//!
//! ## Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | `/update` | Telegram submission (form field `update`) |
//! | GET | `/status/:id/:image` | Agent directive poll |
//! | GET | `/api/scoreboard` | Overall standings |
//! | GET | `/api/image/:image` | Standings for one image |
//! | GET | `/api/team/:team` | Team detail and timeline |
//! | GET | `/api/announcements` | Announcements, newest first |
//! | POST | `/api/announcements` | Manual announcement (admin) |
//! | POST | `/api/scoring` | Pause or resume scoring (admin) |
//! | DELETE | `/api/test-data` | Purge sentinel team data (admin) |
//! | GET | `/shell/:id/:image/{operator,target}/{input,output}` | Shell relay websockets |
//! | GET | `/health`, `/metrics` | Liveness and Prometheus metrics |
//!
//! ## Error Surface
//!
//! Every rejected telegram answers `400 {"error":"Invalid request."}`; the
//! reason is only logged. Store failures answer 500. Admin routes are only
//! bound with `admin.enable_admin_routes`.
//!
//! ## Crate Structure
//!
//! - `domain/` - Configuration and HTTP error mapping
//! - `middleware/` - CORS layer
//! - `rest.rs` - JSON handlers
//! - `ws/` - Websocket transport and shell handlers
//! - `router.rs` - Route table
//! - `service.rs` - Wiring and server lifecycle

#![warn(clippy::all)]

pub mod domain;
pub mod middleware;
pub mod rest;
pub mod router;
pub mod service;
pub mod ws;

pub use domain::config::{
    AdminConfig, CompetitionConfig, ConfigError, CorsConfig, GatewayConfig, HttpConfig,
    ScoringConfig, ShellConfig,
};
pub use domain::error::{ApiError, GatewayError, GENERIC_REJECTION};
pub use router::{build_router, AppState};
pub use service::ApiGatewayService;
