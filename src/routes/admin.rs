use axum::{
    extract::{Path, State},
    http::HeaderMap,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::NoContent;
use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

const X_ADMIN_TOKEN: &str = "x-admin-token";

/// Delete one project with its submissions and artifacts
pub async fn purge_project(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
) -> ApiResult<NoContent> {
    require_admin(&state, &headers)?;
    state.ledger.purge_project(project_id).await?;
    Ok(NoContent)
}

/// Wipe the entire ledger. Scoped deletion goes through the per-project purge.
pub async fn purge_ledger(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<NoContent> {
    require_admin(&state, &headers)?;
    state.ledger.purge_all().await?;
    Ok(NoContent)
}

/// Constant policy: no configured token means admin routes are disabled
/// outright, not open.
fn require_admin(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    let expected = state
        .settings
        .admin_token
        .as_deref()
        .ok_or_else(|| ApiError::Forbidden("Admin endpoints are disabled".to_string()))?;

    let presented = headers
        .get(X_ADMIN_TOKEN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if presented != expected {
        return Err(ApiError::Forbidden("Invalid admin token".to_string()));
    }

    Ok(())
}
