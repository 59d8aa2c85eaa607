//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request id, tracing, limits, timeout, metrics)
//! - Bind server to listener
//! - Stop accepting on shutdown and drain in-flight requests

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::ai::{AiError, ImproveClient, LlmClient};
use crate::config::MarketConfig;
use crate::http::middleware::track_metrics;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::{chat, improve, prompts, users};
use crate::store::MarketStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: MarketStore,
    pub improve: Arc<ImproveClient>,
    pub llm: Arc<LlmClient>,
    pub config: Arc<MarketConfig>,
}

impl AppState {
    pub fn new(config: &MarketConfig, store: MarketStore) -> Result<Self, AiError> {
        Ok(Self {
            store,
            improve: Arc::new(ImproveClient::new(&config.improve)?),
            llm: Arc::new(LlmClient::new(&config.llm)?),
            config: Arc::new(config.clone()),
        })
    }
}

/// HTTP server for the marketplace API.
pub struct HttpServer {
    router: Router,
    config: MarketConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: MarketConfig, store: MarketStore) -> Result<Self, AiError> {
        let state = AppState::new(&config, store)?;
        Ok(Self::with_state(config, state))
    }

    /// Create a server around prepared state.
    pub fn with_state(config: MarketConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &MarketConfig, state: AppState) -> Router {
        Router::new()
            .route("/api/improve-proxy", post(improve::improve_proxy))
            .route(
                "/api/prompts",
                get(prompts::list_prompts).post(prompts::create_prompt),
            )
            .route("/api/user", get(users::get_users).post(users::create_user))
            .route("/api/chat", post(chat::chat))
            .route("/health", get(health))
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| make_request_span(req)))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// Get the router, e.g. to serve it on a custom listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
