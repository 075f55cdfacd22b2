use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::domain::{BoqArtifactResponse, BoqTables, LineItem};
use crate::error::{ApiError, ApiResult};
use crate::services::{
    costing, matcher, parser, review, workbook, DocumentKind, HeuristicBackend,
};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerateBoqResponse {
    /// Workbook generated and recorded in the ledger.
    Generated {
        artifact: BoqArtifactResponse,
        tables: BoqTables,
    },
    /// The pipeline could not produce line items; a human takes over from the
    /// raw text. Not an error: the request succeeded with a degraded outcome.
    ManualReview {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        raw_text: Option<String>,
    },
}

/// Run the full pipeline for one stored submission: extract text, obtain line
/// items (AI collaborator when configured, pattern parser otherwise), price,
/// cost, export, record.
pub async fn generate_boq(
    State(state): State<Arc<AppState>>,
    Path((project_id, submission_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<GenerateBoqResponse>> {
    let submission = state
        .ledger
        .get_submission(submission_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Submission {} not found", submission_id)))?;

    if submission.project_id != project_id {
        return Err(ApiError::BadRequest(format!(
            "Submission {} does not belong to project {}",
            submission_id, project_id
        )));
    }

    // `filename` is the on-disk name assigned at submit time
    let stored_path = state.settings.uploads_dir.join(&submission.filename);
    let bytes = tokio::fs::read(&stored_path).await.map_err(|e| {
        ApiError::NotFound(format!(
            "Stored document for submission {} is missing: {}",
            submission_id, e
        ))
    })?;

    let extractor = state.extractor.clone();
    let kind = DocumentKind::from_filename(&submission.filename);
    let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes, kind))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Extraction task panicked: {}", e)))?;

    if text.trim().is_empty() {
        tracing::info!(submission_id = %submission_id, "No text extracted, routing to manual review");
        return Ok(Json(GenerateBoqResponse::ManualReview {
            reason: "extraction_empty".to_string(),
            raw_text: None,
        }));
    }

    let items = extract_items(&state, &text).await;

    if items.is_empty() {
        tracing::info!(submission_id = %submission_id, "No line items obtained, routing to manual review");
        return Ok(Json(GenerateBoqResponse::ManualReview {
            reason: "parser_abstained".to_string(),
            raw_text: Some(parser::bounded_prefix(&text, parser::RAW_TEXT_PREFIX_LIMIT)),
        }));
    }

    let catalog = state.catalog.ensure_loaded().await;
    let matched = matcher::match_items(&items, &catalog.entries);
    let tables = costing::aggregate(&matched, state.settings.labor_rate);

    let blob = workbook::write_workbook(&tables)?;
    let artifact = state.ledger.record_boq(project_id, submission_id, blob).await?;

    tracing::info!(
        artifact_id = %artifact.id,
        submission_id = %submission_id,
        items = items.len(),
        catalog_source = %catalog.source,
        "BOQ generated"
    );

    Ok(Json(GenerateBoqResponse::Generated {
        artifact: BoqArtifactResponse::from(&artifact),
        tables,
    }))
}

async fn extract_items(state: &AppState, text: &str) -> Vec<LineItem> {
    let rounds = state.settings.max_review_rounds;
    match &state.ai_client {
        Some(client) => review::run_extraction(client, text, rounds).await,
        None => review::run_extraction(&HeuristicBackend, text, rounds).await,
    }
}

/// Artifact history for a project, newest first
pub async fn list_boqs(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<DataResponse<Vec<BoqArtifactResponse>>> {
    if state.ledger.get_project(project_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Project {} not found", project_id)));
    }

    let artifacts = state.ledger.list_artifacts(project_id).await?;
    Ok(DataResponse::new(artifacts))
}

/// Stream a recorded workbook back as an attachment
pub async fn download_boq(
    State(state): State<Arc<AppState>>,
    Path(artifact_id): Path<Uuid>,
) -> ApiResult<Response> {
    let artifact = state
        .ledger
        .get_artifact(artifact_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("BOQ artifact {} not found", artifact_id)))?;

    let disposition = format!("attachment; filename=\"boq_{}.xlsx\"", artifact.id);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.data_blob,
    )
        .into_response())
}
