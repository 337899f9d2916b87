//! # Gateway Flows
//!
//! A TOML configuration assembled into `ApiGatewayService` and driven over
//! its HTTP router.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use rs_01_score_store::{InMemoryScoreStore, Stores};
    use rs_02_ingestion::test_utils::{
        MockClock, RecordingNotifier, TelegramBuilder, TEST_PASSWORD,
    };
    use rs_02_ingestion::AgentStatus;
    use rs_05_api_gateway::{ApiGatewayService, GatewayConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn config_toml() -> String {
        format!(
            r#"
            [competition]
            event = "Winter Range"
            password = "{TEST_PASSWORD}"

            [[teams]]
            id = "t1"
            alias = "red-rovers"

            [[teams]]
            id = "t2"
            alias = "blue-jays"

            [[images]]
            name = "web01"

            [[images]]
            name = "db01"
            "#
        )
    }

    fn service() -> ApiGatewayService {
        let config = GatewayConfig::from_toml_str(&config_toml()).unwrap();
        ApiGatewayService::new(config).unwrap()
    }

    async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn update(telegram: &str) -> Request<Body> {
        Request::post("/update")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("update={telegram}")))
            .unwrap()
    }

    #[tokio::test]
    async fn test_submission_to_dashboards() {
        let router = service().router();
        let web = TelegramBuilder::new("t1", "web01")
            .item("sqli", 60)
            .item("xss", 40)
            .build();
        let db = TelegramBuilder::new("blue-jays", "db01")
            .item("weak password", 30)
            .build();

        assert_eq!(call(&router, update(&web)).await.0, StatusCode::OK);
        assert_eq!(call(&router, update(&db)).await.0, StatusCode::OK);

        let (_, board) = call(&router, get("/api/scoreboard")).await;
        assert_eq!(board[0]["team"], "t1");
        assert_eq!(board[0]["score"], 100);
        assert_eq!(board[1]["team"], "t2");
        assert_eq!(board[1]["alias"], "blue-jays");

        let (_, db_board) = call(&router, get("/api/image/db01")).await;
        assert_eq!(db_board.as_array().map(Vec::len), Some(1));
        assert_eq!(db_board[0]["score"], 30);
    }

    #[tokio::test]
    async fn test_first_completion_is_announced() {
        let router = service().router();
        let perfect = |team: &str| {
            TelegramBuilder::new(team, "web01")
                .item("sqli", 10)
                .vulns(1, 1)
                .build()
        };

        call(&router, update(&perfect("t2"))).await;
        call(&router, update(&perfect("t1"))).await;

        let (status, announcements) = call(&router, get("/api/announcements")).await;
        assert_eq!(status, StatusCode::OK);
        let announcements = announcements.as_array().cloned().unwrap_or_default();
        assert_eq!(announcements.len(), 1);
        assert!(announcements[0]["body"]
            .as_str()
            .is_some_and(|body| body.contains("blue-jays")));
    }

    #[tokio::test]
    async fn test_shell_directive_delivered_once() {
        let service = service();
        let router = service.router();
        service
            .state()
            .ingestion
            .status_board()
            .post("t1", "web01", AgentStatus::Shell);

        let (status, body) = call(&router, get("/status/t1/web01")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "SHELL" }));

        let (_, body) = call(&router, get("/status/red-rovers/web01")).await;
        assert_eq!(body, json!({ "status": "OK" }));
    }

    #[tokio::test]
    async fn test_store_failure_is_a_server_error() {
        let store = Arc::new(InMemoryScoreStore::new());
        let config = GatewayConfig::from_toml_str(&config_toml()).unwrap();
        let service = ApiGatewayService::with_ports(
            config,
            Stores::shared(Arc::clone(&store)),
            Arc::new(RecordingNotifier::default()),
            Arc::new(MockClock::default()),
        )
        .unwrap();
        store.set_fail_writes(true);

        let telegram = TelegramBuilder::new("t1", "web01").item("sqli", 10).build();
        let (status, body) = call(&service.router(), update(&telegram)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error." }));
    }
}
