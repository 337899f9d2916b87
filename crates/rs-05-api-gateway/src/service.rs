//! Gateway service: wires the crates together and serves HTTP.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use rs_01_score_store::{InMemoryScoreStore, Stores};
use rs_02_ingestion::{
    Clock, IngestionService, LogNotifier, Notifier, SystemClock, UpdateDecoder,
};
use rs_03_scoreboard::ScoreboardService;
use rs_04_shell_relay::ShellRegistry;
use shared_crypto::TelegramCipher;
use tracing::info;

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::router::{build_router, AppState};

/// The assembled application.
pub struct ApiGatewayService {
    config: GatewayConfig,
    state: AppState,
}

impl ApiGatewayService {
    /// Validate `config` and wire the default in-memory backend, log notifier
    /// and system clock.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_ports(
            config,
            Stores::shared(Arc::new(InMemoryScoreStore::new())),
            Arc::new(LogNotifier),
            Arc::new(SystemClock),
        )
    }

    /// Wire explicit store, notifier and clock implementations.
    pub fn with_ports(
        config: GatewayConfig,
        stores: Stores,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;

        let roster = Arc::new(config.roster()?);
        let cipher = TelegramCipher::from_password(&config.competition.password);
        let decoder = UpdateDecoder::new(cipher, Arc::clone(&roster));

        let ingestion = Arc::new(IngestionService::new(
            decoder,
            config.completion_policy()?,
            config.ingestion_config(),
            stores.clone(),
            notifier,
            clock,
        ));
        let scoreboard = Arc::new(ScoreboardService::new(
            Arc::clone(&stores.scores),
            Arc::clone(&roster),
        ));
        let shells = Arc::new(ShellRegistry::new(
            Arc::clone(&roster),
            config.shell.channel_capacity,
        ));

        info!(
            teams = roster.teams().len(),
            images = roster.images().len(),
            event = %config.competition.event,
            "Range scoreboard configured"
        );

        Ok(Self {
            state: AppState {
                ingestion,
                scoreboard,
                shells,
                announcements: stores.announcements,
            },
            config,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = self.config.http_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;
        info!(addr = %addr, "Starting HTTP server");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::Serve(e.to_string()))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
