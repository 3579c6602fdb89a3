use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use detector_client::DetectorClient;
use gemini_client::GeminiClient;
use nagarnetra_common::Config;
use nagarnetra_engine::IssueReconciler;
use nagarnetra_store::{IssueStore, PgIssueStore};

mod rest;

/// Uploads above this are rejected before any work happens.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub reconciler: IssueReconciler,
    pub store: Arc<dyn IssueStore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nagarnetra=info".parse()?))
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&config.database_url)
        .await?;
    let pg_store = PgIssueStore::new(pool);
    pg_store.migrate().await?;
    let store: Arc<dyn IssueStore> = Arc::new(pg_store);

    let detector = Arc::new(DetectorClient::new(&config.detector_url));
    let insights = Arc::new(GeminiClient::new(&config.gemini_api_key));
    let reconciler = IssueReconciler::new(detector, insights, store.clone());

    let state = Arc::new(AppState { reconciler, store });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Submission pipeline
        .route("/detect", post(rest::detect))
        // Read API
        .route("/api/issues", get(rest::api_issues))
        .route("/api/issues/{id}", get(rest::api_issue_detail))
        // Text-only triage (no image, no persistence)
        .route("/api/analyze", post(rest::api_analyze))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!(addr, "Nagarnetra API listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
