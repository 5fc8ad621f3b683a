//! API server setup and configuration.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

use crate::api::routes;
use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use crate::service::MonitorService;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Answer cross-origin requests from any origin.
    pub enable_cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8787,
            enable_cors: true,
        }
    }
}

impl From<&MonitorConfig> for ApiServerConfig {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            bind_address: config.bind_address.clone(),
            port: config.port,
            enable_cors: config.enable_cors,
        }
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MonitorService>,
}

impl AppState {
    pub fn new(service: Arc<MonitorService>) -> Self {
        Self { service }
    }
}

/// Assemble routes and middleware. Health checks sit outside the trace layer.
pub(crate) fn build_router(config: &ApiServerConfig, state: AppState) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let router = routes::create_router(state)
        .layer(trace)
        .merge(routes::health_router());

    if config.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

/// API server.
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
    cancel_token: CancellationToken,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        Self {
            config,
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Use an externally owned token for graceful shutdown.
    pub fn with_cancel_token(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    /// Serve until the cancel token fires.
    pub async fn run(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.bind_address, self.config.port)
            .parse()
            .map_err(|e| Error::ApiError(format!("Invalid address: {e}")))?;

        let router = build_router(&self.config, self.state.clone());
        let listener = TcpListener::bind(addr).await?;

        info!(cors = self.config.enable_cors, "API server listening on http://{}", addr);

        let cancel_token = self.cancel_token.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("API server shutting down");
            })
            .await
            .map_err(|e| Error::ApiError(format!("Server error: {e}")))?;

        Ok(())
    }
}
