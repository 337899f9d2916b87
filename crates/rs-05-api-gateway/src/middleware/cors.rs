//! CORS for browser dashboards.
//!
//! Dashboards on other origins only read, so preflights admit `GET`/`HEAD`
//! unless the admin routes are bound. Agents and shell clients send no
//! `Origin` header and pass through untouched.

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::domain::config::CorsConfig;

/// Methods a cross-origin page may use.
fn allowed_methods(admin: bool) -> Vec<Method> {
    let mut methods = vec![Method::GET, Method::HEAD];
    if admin {
        methods.extend([Method::POST, Method::DELETE]);
    }
    methods
}

fn allowed_origin(config: &CorsConfig) -> AllowOrigin {
    if config.allows_any_origin() {
        return AllowOrigin::any();
    }
    // Entries were checked by `GatewayConfig::validate`.
    AllowOrigin::list(
        config
            .allowed_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok()),
    )
}

/// CORS layer for the gateway; a no-op layer when disabled.
pub fn create_cors_layer(config: &CorsConfig, admin: bool) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::new();
    }
    CorsLayer::new()
        .allow_origin(allowed_origin(config))
        .allow_methods(allowed_methods(admin))
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.max_age))
}
