//! Submission route tests around upload storage, driven through the full
//! router with an in-memory ledger.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use std::path::PathBuf;
use tower::ServiceExt;
use uuid::Uuid;

use boqflow_backend::app::{create_app, AppState};
use boqflow_backend::config::{Environment, Settings};
use boqflow_backend::db;
use boqflow_backend::domain::Project;
use boqflow_backend::services::{CatalogStore, Ledger, TextExtractor};

const BOUNDARY: &str = "boqflow-test-boundary";

fn test_settings(uploads_dir: PathBuf) -> Settings {
    Settings {
        env: Environment::Dev,
        server_addr: "127.0.0.1:0".to_string(),
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        uploads_dir,
        cors_allow_origins: Vec::new(),
        catalog_cache_path: std::env::temp_dir().join(format!("boqflow-cat-{}.csv", Uuid::new_v4())),
        catalog_remote_url: None,
        catalog_fetch_timeout_seconds: 1,
        labor_rate: 0.10,
        ai_service_url: None,
        ai_service_token: String::new(),
        ai_service_timeout_seconds: 1,
        max_review_rounds: 2,
        admin_token: None,
    }
}

async fn test_app(uploads_dir: PathBuf) -> (Router, Ledger, Project) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    db::apply_schema(&pool).await.expect("schema");

    let ledger = Ledger::new(pool.clone());
    let project = ledger.create_project("Tower A", "").await.expect("project");

    let settings = test_settings(uploads_dir);
    let catalog = std::sync::Arc::new(CatalogStore::new(&settings).expect("catalog store"));
    let state = AppState::new(pool, settings, catalog, TextExtractor::new(None), None);

    (create_app(state), ledger, project)
}

fn submission_request(project_id: Uuid) -> Request<Body> {
    let mut body = String::new();
    body.push_str(&format!(
        "--{}\r\nContent-Disposition: form-data; name=\"role\"\r\n\r\nA\r\n",
        BOUNDARY
    ));
    body.push_str(&format!(
        "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"plan.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\nnot a real pdf\r\n",
        BOUNDARY
    ));
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    Request::builder()
        .method("POST")
        .uri(format!("/projects/{}/submissions", project_id))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .expect("request")
}

#[tokio::test]
async fn failed_file_write_leaves_no_ledger_row() {
    // uploads_dir is a regular file, so every write under it fails
    let blocked = std::env::temp_dir().join(format!("boqflow-blocked-{}", Uuid::new_v4()));
    std::fs::write(&blocked, b"").expect("blocker file");

    let (app, ledger, project) = test_app(blocked.clone()).await;

    let response = app.oneshot(submission_request(project.id)).await.expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The failed submit must not be visible in the ledger
    assert_eq!(ledger.latest_version(project.id).await.unwrap(), 0);
    assert!(ledger.list_submissions(project.id, 20, 0).await.unwrap().is_empty());

    std::fs::remove_file(&blocked).ok();
}

#[tokio::test]
async fn successful_submit_stores_the_document_it_records() {
    let uploads = std::env::temp_dir().join(format!("boqflow-uploads-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&uploads).expect("uploads dir");

    let (app, ledger, project) = test_app(uploads.clone()).await;

    let response = app.oneshot(submission_request(project.id)).await.expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let submissions = ledger.list_submissions(project.id, 20, 0).await.unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].version, 1);

    // The row's filename points at a real stored file with the uploaded bytes
    let stored = std::fs::read(uploads.join(&submissions[0].filename)).expect("stored document");
    assert_eq!(stored, b"not a real pdf");

    std::fs::remove_dir_all(&uploads).ok();
}
