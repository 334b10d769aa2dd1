mod config;
mod crm_client;
mod db;
mod errors;
mod handlers;
mod ingestion;
mod lead_store;
mod models;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::crm_client::CrmClient;
use crate::db::Database;
use crate::ingestion::IngestionService;
use crate::lead_store::LeadStore;

/// Main entry point for the application.
///
/// Initializes logging, configuration, the database pool, the CRM client,
/// and the HTTP routes with their middleware, then serves until shutdown.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_capture_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize database connection pool and bootstrap the leads table
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    let store = LeadStore::new(db.pool.clone());

    let crm = CrmClient::new(&config).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    if config.crm_token.is_none() || config.crm_tag_id.is_none() {
        tracing::warn!("CRM token or tag id not configured; pushes will be recorded as skipped");
    }

    let ingestion = IngestionService::new(store.clone(), crm);

    let app_state = Arc::new(handlers::AppState {
        store,
        ingestion,
        config: config.clone(),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build the submission route with its protection layers
    let submit_routes = Router::new()
        .route("/submit-email", post(handlers::submit_email))
        .layer(
            ServiceBuilder::new()
                // Lead payloads are tiny; anything larger is abuse
                .layer(RequestBodyLimitLayer::new(64 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses rate limiting so platform probes are never shed
    let app = Router::new()
        .route("/healthz", get(handlers::healthz))
        .merge(submit_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
