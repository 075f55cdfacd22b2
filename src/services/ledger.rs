//! Submission ledger
//!
//! System of record for projects, role-tagged submissions and generated BOQ
//! artifacts. Version assignment is computed inside the INSERT itself, so two
//! concurrent submits to the same project can never read the same latest
//! version. Rows are never mutated; deletion happens only through the
//! explicitly scoped or explicitly global purge operations.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{BoqArtifact, BoqArtifactResponse, Project, Role, Submission};
use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Projects
    // ========================================================================

    pub async fn create_project(&self, name: &str, description: &str) -> ApiResult<Project> {
        let project = Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO projects (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(project.id.to_string())
            .bind(&project.name)
            .bind(&project.description)
            .bind(project.created_at)
            .execute(&self.pool)
            .await?;

        tracing::info!(project_id = %project.id, name = %project.name, "Project created");
        Ok(project)
    }

    pub async fn get_project(&self, project_id: Uuid) -> ApiResult<Option<Project>> {
        let row = sqlx::query("SELECT id, name, description, created_at FROM projects WHERE id = ?1")
            .bind(project_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| project_from_row(&r)).transpose()
    }

    pub async fn list_projects(&self, limit: u32, offset: u32) -> ApiResult<Vec<Project>> {
        let rows = sqlx::query(
            "SELECT id, name, description, created_at FROM projects ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(project_from_row).collect()
    }

    pub async fn count_projects(&self) -> ApiResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM projects")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    // ========================================================================
    // Submissions
    // ========================================================================

    /// Record a role handoff. The version is `MAX(version) + 1` for the
    /// project, computed atomically within the INSERT statement; versions are
    /// never reused even after deletions.
    pub async fn submit(
        &self,
        project_id: Uuid,
        role: Role,
        filename: &str,
        metadata: &str,
    ) -> ApiResult<Submission> {
        if self.get_project(project_id).await?.is_none() {
            return Err(ApiError::NotFound(format!("Project {} not found", project_id)));
        }

        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let row = sqlx::query(
            r#"
            INSERT INTO submissions (id, project_id, role, filename, metadata, version, created_at)
            VALUES (
                ?1, ?2, ?3, ?4, ?5,
                (SELECT COALESCE(MAX(version), 0) + 1 FROM submissions WHERE project_id = ?2),
                ?6
            )
            RETURNING version
            "#,
        )
        .bind(id.to_string())
        .bind(project_id.to_string())
        .bind(role.as_tag())
        .bind(filename)
        .bind(metadata)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        let version: i64 = row.get("version");

        tracing::info!(
            submission_id = %id,
            project_id = %project_id,
            role = %role,
            version,
            "Submission recorded"
        );

        Ok(Submission {
            id,
            project_id,
            role,
            filename: filename.to_string(),
            metadata: metadata.to_string(),
            version,
            created_at,
        })
    }

    /// Highest assigned version for the project; 0 when none exist, so the
    /// first submit correctly yields version 1.
    pub async fn latest_version(&self, project_id: Uuid) -> ApiResult<i64> {
        let row = sqlx::query(
            "SELECT COALESCE(MAX(version), 0) AS latest FROM submissions WHERE project_id = ?1",
        )
        .bind(project_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("latest"))
    }

    pub async fn get_submission(&self, submission_id: Uuid) -> ApiResult<Option<Submission>> {
        let row = sqlx::query(
            "SELECT id, project_id, role, filename, metadata, version, created_at FROM submissions WHERE id = ?1",
        )
        .bind(submission_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| submission_from_row(&r)).transpose()
    }

    pub async fn list_submissions(
        &self,
        project_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> ApiResult<Vec<Submission>> {
        let rows = sqlx::query(
            r#"
            SELECT id, project_id, role, filename, metadata, version, created_at
            FROM submissions WHERE project_id = ?1
            ORDER BY version DESC LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(project_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(submission_from_row).collect()
    }

    pub async fn count_submissions(&self, project_id: Uuid) -> ApiResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM submissions WHERE project_id = ?1")
            .bind(project_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    // ========================================================================
    // BOQ artifacts
    // ========================================================================

    /// Persist a generated workbook. Hard error when the submission does not
    /// belong to the given project; other ledger rows are untouched.
    pub async fn record_boq(
        &self,
        project_id: Uuid,
        submission_id: Uuid,
        blob: Vec<u8>,
    ) -> ApiResult<BoqArtifact> {
        let mut tx = self.pool.begin().await?;

        let owner = sqlx::query("SELECT project_id FROM submissions WHERE id = ?1")
            .bind(submission_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;

        let owner_id = match owner {
            Some(row) => row.get::<String, _>("project_id"),
            None => {
                return Err(ApiError::LedgerReference(format!(
                    "Submission {} does not exist",
                    submission_id
                )))
            }
        };

        if owner_id != project_id.to_string() {
            return Err(ApiError::LedgerReference(format!(
                "Submission {} does not belong to project {}",
                submission_id, project_id
            )));
        }

        let artifact = BoqArtifact {
            id: Uuid::new_v4(),
            project_id,
            submission_id,
            data_blob: blob,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO boq_artifacts (id, project_id, submission_id, data_blob, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(artifact.id.to_string())
        .bind(artifact.project_id.to_string())
        .bind(artifact.submission_id.to_string())
        .bind(&artifact.data_blob)
        .bind(artifact.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            artifact_id = %artifact.id,
            project_id = %project_id,
            submission_id = %submission_id,
            bytes = artifact.data_blob.len(),
            "BOQ artifact recorded"
        );

        Ok(artifact)
    }

    pub async fn get_artifact(&self, artifact_id: Uuid) -> ApiResult<Option<BoqArtifact>> {
        let row = sqlx::query(
            "SELECT id, project_id, submission_id, data_blob, created_at FROM boq_artifacts WHERE id = ?1",
        )
        .bind(artifact_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(BoqArtifact {
                id: parse_uuid(r.get("id"))?,
                project_id: parse_uuid(r.get("project_id"))?,
                submission_id: parse_uuid(r.get("submission_id"))?,
                data_blob: r.get("data_blob"),
                created_at: r.get("created_at"),
            })
        })
        .transpose()
    }

    /// Artifact metadata for a project, newest first. Blobs stay in the
    /// database; use [`Ledger::get_artifact`] for the download path.
    pub async fn list_artifacts(&self, project_id: Uuid) -> ApiResult<Vec<BoqArtifactResponse>> {
        let rows = sqlx::query(
            r#"
            SELECT id, project_id, submission_id, LENGTH(data_blob) AS size_bytes, created_at
            FROM boq_artifacts WHERE project_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(project_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(BoqArtifactResponse {
                    id: parse_uuid(r.get("id"))?,
                    project_id: parse_uuid(r.get("project_id"))?,
                    submission_id: parse_uuid(r.get("submission_id"))?,
                    size_bytes: r.get::<i64, _>("size_bytes") as usize,
                    created_at: r.get("created_at"),
                })
            })
            .collect()
    }

    // ========================================================================
    // Purge
    // ========================================================================

    /// Delete one project and everything hanging off it.
    pub async fn purge_project(&self, project_id: Uuid) -> ApiResult<()> {
        if self.get_project(project_id).await?.is_none() {
            return Err(ApiError::NotFound(format!("Project {} not found", project_id)));
        }

        let id = project_id.to_string();
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM boq_artifacts WHERE project_id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM submissions WHERE project_id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM projects WHERE id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::warn!(project_id = %project_id, "Project purged");
        Ok(())
    }

    /// Wipe the entire ledger. Irreversible and deliberately global; callers
    /// wanting a scoped delete must use [`Ledger::purge_project`].
    pub async fn purge_all(&self) -> ApiResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM boq_artifacts").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM submissions").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM projects").execute(&mut *tx).await?;
        tx.commit().await?;

        tracing::warn!("Ledger wiped: all projects, submissions and artifacts deleted");
        Ok(())
    }
}

fn parse_uuid(s: String) -> Result<Uuid, ApiError> {
    Uuid::parse_str(&s).map_err(|e| ApiError::Internal(anyhow!("Corrupt id in ledger: {}", e)))
}

fn parse_role(tag: String) -> Result<Role, ApiError> {
    Role::parse(&tag).ok_or_else(|| ApiError::Internal(anyhow!("Unknown role tag: {}", tag)))
}

fn project_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Project, ApiError> {
    Ok(Project {
        id: parse_uuid(row.get("id"))?,
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn submission_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Submission, ApiError> {
    Ok(Submission {
        id: parse_uuid(row.get("id"))?,
        project_id: parse_uuid(row.get("project_id"))?,
        role: parse_role(row.get("role"))?,
        filename: row.get("filename"),
        metadata: row.get("metadata"),
        version: row.get("version"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}
