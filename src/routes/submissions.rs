use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Paginated, PaginationParams};
use crate::app::AppState;
use crate::domain::{ParseOutcome, Role, SubmissionResponse};
use crate::error::{ApiError, ApiResult};
use crate::services::{parser, DocumentKind};

#[derive(Serialize)]
pub struct CreateSubmissionResponse {
    pub data: SubmissionResponse,
    /// Heuristic parse of the uploaded document, for immediate inspection.
    /// Advisory only; BOQ generation re-runs extraction from the stored file.
    pub parse_preview: ParseOutcome,
}

/// Record a role handoff: store the uploaded document, assign the next
/// version number, and return a parse preview.
pub async fn create_submission(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<(axum::http::StatusCode, Json<CreateSubmissionResponse>)> {
    let mut role: Option<Role> = None;
    let mut metadata = String::new();
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "role" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Unreadable role field: {}", e)))?;
                role = Some(Role::parse(&raw).ok_or_else(|| {
                    ApiError::BadRequest(format!(
                        "Unknown role '{}': expected A-D or drafter/reviewer/cost_engineer/scope_provider",
                        raw
                    ))
                })?);
            }
            "metadata" => {
                metadata = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Unreadable metadata field: {}", e)))?;
            }
            "file" => {
                let filename = field
                    .file_name()
                    .map(sanitize_filename)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| ApiError::BadRequest("File field needs a filename".to_string()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Unreadable file field: {}", e)))?;
                file = Some((filename, bytes.to_vec()));
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let role = role.ok_or_else(|| ApiError::BadRequest("Missing 'role' field".to_string()))?;
    let (filename, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;

    // The document is written before the ledger insert; a failed write must
    // never leave a submission row with no stored file behind it.
    let stored_name = format!("{}_{}", Uuid::new_v4(), filename);
    let stored_path = state.settings.uploads_dir.join(&stored_name);
    tokio::fs::write(&stored_path, &bytes)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to store upload: {}", e)))?;

    let submission = match state
        .ledger
        .submit(project_id, role, &stored_name, &metadata)
        .await
    {
        Ok(submission) => submission,
        Err(e) => {
            // ledger rejected the submit; don't leave an orphaned file
            let _ = tokio::fs::remove_file(&stored_path).await;
            return Err(e);
        }
    };

    // Preview on a blocking thread: PDF extraction is CPU-bound
    let extractor = state.extractor.clone();
    let kind = DocumentKind::from_filename(&filename);
    let parse_preview = tokio::task::spawn_blocking(move || {
        let text = extractor.extract(&bytes, kind);
        parser::parse(&text)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("Preview task panicked: {}", e)))?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(CreateSubmissionResponse {
            data: SubmissionResponse::from(submission),
            parse_preview,
        }),
    ))
}

/// List a project's submissions, highest version first
pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Paginated<SubmissionResponse>> {
    if state.ledger.get_project(project_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Project {} not found", project_id)));
    }

    let total = state.ledger.count_submissions(project_id).await?;
    let submissions = state
        .ledger
        .list_submissions(project_id, pagination.limit(), pagination.offset())
        .await?;

    let data = submissions.into_iter().map(SubmissionResponse::from).collect();
    Ok(Paginated::new(data, &pagination, total))
}

/// Basename only, restricted to a safe character set.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
