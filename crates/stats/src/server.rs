//! Read-only HTTP status endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use tower_http::trace::TraceLayer;

use crate::store::StatsStore;

/// Small HTTP server exposing liveness and the usage counters
#[derive(Clone)]
pub struct StatusServer {
    stats: StatsStore,
}

impl StatusServer {
    pub fn new(stats: StatsStore) -> Self {
        Self { stats }
    }

    /// Create the axum router with all routes configured
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/health", get(health_check))
            .route("/stats", get(stats))
            .with_state(self.stats.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Start the status server
    ///
    /// # Arguments
    /// * `host` - Host to bind to (e.g., "0.0.0.0")
    /// * `port` - Port to bind to (e.g., 5000)
    pub async fn serve(self, host: &str, port: u16) -> crate::Result<()> {
        let addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("Status server listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

async fn index() -> &'static str {
    "TikTok bot is running"
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn stats(State(stats): State<StatsStore>) -> impl IntoResponse {
    Json(stats.snapshot())
}
