use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::domain::{CreateProjectRequest, ProjectResponse};
use crate::error::{ApiError, ApiResult};

/// Create a new project
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Created<ProjectResponse>> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Project name must not be empty".to_string()));
    }

    let project = state.ledger.create_project(name, req.description.trim()).await?;
    Ok(Created(ProjectResponse::from(project)))
}

/// List projects, newest first
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Paginated<ProjectResponse>> {
    let total = state.ledger.count_projects().await?;
    let projects = state
        .ledger
        .list_projects(pagination.limit(), pagination.offset())
        .await?;

    let data = projects.into_iter().map(ProjectResponse::from).collect();
    Ok(Paginated::new(data, &pagination, total))
}

/// Get a specific project by ID
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<DataResponse<ProjectResponse>> {
    let project = state
        .ledger
        .get_project(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Project {} not found", project_id)))?;

    Ok(DataResponse::new(ProjectResponse::from(project)))
}
