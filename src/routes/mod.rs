pub mod admin;
pub mod boq;
pub mod catalog;
pub mod health;
pub mod projects;
pub mod submissions;

use axum::{routing::delete, routing::get, routing::post, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Projects
        .route("/projects", post(projects::create_project))
        .route("/projects", get(projects::list_projects))
        .route("/projects/:project_id", get(projects::get_project))
        // Submissions (nested under projects)
        .route(
            "/projects/:project_id/submissions",
            post(submissions::create_submission),
        )
        .route(
            "/projects/:project_id/submissions",
            get(submissions::list_submissions),
        )
        // BOQ generation and history
        .route(
            "/projects/:project_id/submissions/:submission_id/boq",
            post(boq::generate_boq),
        )
        .route("/projects/:project_id/boqs", get(boq::list_boqs))
        .route("/boqs/:artifact_id/download", get(boq::download_boq))
        // Price catalog
        .route("/catalog", post(catalog::upload_catalog))
        .route("/catalog", get(catalog::catalog_status))
        // Admin (token-gated)
        .route(
            "/admin/projects/:project_id",
            delete(admin::purge_project),
        )
        .route("/admin/ledger", delete(admin::purge_ledger))
}
