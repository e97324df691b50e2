//! Web layer module
//!
//! HTTP interface for the channel browser: the JSON API under `/api` and
//! the embedded static frontend. Handlers stay thin and delegate to the
//! database and ingestor.

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{config::Config, database::Database, ingestor::ChannelIngestor};

pub mod api;
pub mod handlers;

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: Config, database: Database, ingestor: Arc<ChannelIngestor>) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;

        let app = Self::create_router(AppState {
            database,
            config,
            ingestor,
        });

        Ok(Self { app, addr })
    }

    /// Create the router with all routes and middleware
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/api/channels", get(api::list_channels))
            .route("/api/filters", get(api::get_filters))
            .route("/api/stats", get(api::get_stats))
            .route("/api/refresh", post(api::refresh_channels))
            .route("/api/report", post(api::create_report))
            // Embedded frontend
            .route("/", get(handlers::index))
            .route("/static/*path", get(handlers::serve_static_asset))
            // Middleware (applied in reverse order)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Start the web server
    pub async fn serve(self) -> Result<()> {
        tracing::info!("Listening on http://{}", self.addr);
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, self.app).await?;
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub config: Config,
    pub ingestor: Arc<ChannelIngestor>,
}
