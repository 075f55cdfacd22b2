use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::api::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::domain::CatalogStatus;
use crate::error::{ApiError, ApiResult};

/// Replace the price catalog from an uploaded CSV. The upload becomes the
/// top source tier and refreshes the disk cache.
pub async fn upload_catalog(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<MessageResponse>> {
    let mut bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Unreadable file field: {}", e)))?;
            bytes = Some(data.to_vec());
        }
    }

    let bytes = bytes.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;

    let count = state.catalog.replace_with_upload(&bytes).await;
    if count == 0 {
        return Err(ApiError::BadRequest(
            "CSV yielded no price entries; it needs at least 'description' and 'unit_price' columns"
                .to_string(),
        ));
    }

    Ok(Json(MessageResponse::with_code(
        format!("Price catalog replaced with {} entries", count),
        "CATALOG_REPLACED",
    )))
}

/// Current catalog provenance and a short sample
pub async fn catalog_status(
    State(state): State<Arc<AppState>>,
) -> ApiResult<DataResponse<CatalogStatus>> {
    let snapshot = state.catalog.ensure_loaded().await;

    Ok(DataResponse::new(CatalogStatus {
        entries: snapshot.entries.len(),
        source: snapshot.source.clone(),
        sample: snapshot.entries.iter().take(10).cloned().collect(),
    }))
}
