use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A generated, persisted BOQ workbook. Immutable once written; history is
/// the list of artifact rows for a project.
#[derive(Debug, Clone)]
pub struct BoqArtifact {
    pub id: Uuid,
    pub project_id: Uuid,
    pub submission_id: Uuid,
    pub data_blob: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Response DTO for artifact listings (blob omitted; fetched via download)
#[derive(Debug, Clone, Serialize)]
pub struct BoqArtifactResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub submission_id: Uuid,
    pub size_bytes: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&BoqArtifact> for BoqArtifactResponse {
    fn from(a: &BoqArtifact) -> Self {
        Self {
            id: a.id,
            project_id: a.project_id,
            submission_id: a.submission_id,
            size_bytes: a.data_blob.len(),
            created_at: a.created_at,
        }
    }
}
