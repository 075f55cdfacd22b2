use anyhow::Result;
use std::sync::Arc;

use boqflow_backend::services::{AiClient, CatalogStore, TextExtractor};
use boqflow_backend::{app, config, db, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting boqflow backend"
    );

    // Create database pool and apply the ledger schema
    let pool = db::create_pool(&settings).await?;
    db::apply_schema(&pool).await?;

    // Uploaded documents live on local disk
    tokio::fs::create_dir_all(&settings.uploads_dir).await?;

    // Price catalog store; prime it in the background so the first BOQ
    // request doesn't pay the remote-fetch latency
    let catalog = Arc::new(CatalogStore::new(&settings)?);
    tokio::spawn({
        let catalog = catalog.clone();
        async move {
            let snapshot = catalog.ensure_loaded().await;
            tracing::info!(
                entries = snapshot.entries.len(),
                source = %snapshot.source,
                "Price catalog primed"
            );
        }
    });

    // Text extraction, with whatever OCR the build carries
    let extractor = TextExtractor::detect();

    // AI extraction service is optional; the heuristic parser covers its
    // absence
    let ai_client = match &settings.ai_service_url {
        Some(url) => Some(AiClient::new(
            url,
            &settings.ai_service_token,
            settings.ai_service_timeout_seconds,
        )?),
        None => {
            tracing::info!("AI_SERVICE_URL not set; using the in-process heuristic backend");
            None
        }
    };

    // Optionally check AI service health (non-blocking)
    if let Some(client) = ai_client.clone() {
        tokio::spawn(async move {
            match client.health_check().await {
                Ok(()) => tracing::info!("AI service is healthy"),
                Err(e) => tracing::warn!(error = %e, "AI service health check failed - will retry on first request"),
            }
        });
    }

    // Create application state
    let state = app::AppState::new(pool, settings.clone(), catalog, extractor, ai_client);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
