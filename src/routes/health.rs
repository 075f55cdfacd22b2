use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::db;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    pub database: String,
    pub ai_service: String,
    pub catalog_entries: usize,
}

/// Health check endpoint - public
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let db_ok = db::health_check(&state.db).await;

    let ai_status = match &state.ai_client {
        Some(client) => match client.health_check().await {
            Ok(()) => "ok",
            Err(_) => "error",
        },
        // A deployment without an AI service runs on the heuristic backend
        None => "not_configured",
    };

    let db_status = if db_ok { "ok" } else { "error" };

    // DB is the only critical dependency
    let (status, status_code) = if db_ok {
        if ai_status == "error" {
            ("degraded", StatusCode::OK)
        } else {
            ("healthy", StatusCode::OK)
        }
    } else {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: ServiceHealth {
                database: db_status.to_string(),
                ai_service: ai_status.to_string(),
                catalog_entries: state.catalog.snapshot().entries.len(),
            },
        }),
    )
}
