//! Integration tests for the HTTP API.
//!
//! Drives the router in-process: upload → process → results, plus the
//! status bookkeeping on failure.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use docinsight::config::AnalyzerConfig;
use docinsight::providers::{EmbeddingProvider, LlmProvider};
use docinsight::server::{state::AppState, AnalyzerServer};
use docinsight::storage::{AnalysisDb, LocalBlobStore};
use docinsight::types::FileStatus;
use docinsight::{DocumentAnalyzer, Error, Result};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "docinsight-test-boundary";

struct ConstEmbedder;

#[async_trait]
impl EmbeddingProvider for ConstEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(vec![text.len() as f32, 1.0])
    }

    fn dimensions(&self) -> usize {
        2
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "const"
    }
}

struct CannedLlm(Option<&'static str>);

#[async_trait]
impl LlmProvider for CannedLlm {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.0
            .map(str::to_string)
            .ok_or_else(|| Error::generation("model unavailable"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.0.is_some())
    }

    fn name(&self) -> &str {
        "canned"
    }

    fn model(&self) -> &str {
        "canned-model"
    }
}

struct TestApp {
    _dir: TempDir,
    state: AppState,
    router: Router,
}

fn app(reply: Option<&'static str>) -> TestApp {
    let dir = TempDir::new().unwrap();
    let mut config = AnalyzerConfig::default();
    config.storage.data_dir = dir.path().to_path_buf();
    config.server.public_url = "http://files.test".to_string();

    let analyzer = Arc::new(DocumentAnalyzer::new(
        &config,
        Arc::new(ConstEmbedder),
        Arc::new(CannedLlm(reply)),
    ));
    let db = AnalysisDb::in_memory().unwrap();
    let blobs = LocalBlobStore::new(config.storage.uploads_dir()).unwrap();

    let state = AppState::with_components(config, analyzer, db, blobs);
    let router = AnalyzerServer::with_state(state.clone()).router();

    TestApp {
        _dir: dir,
        state,
        router,
    }
}

fn multipart_upload(filename: &str, content: &[u8]) -> Request<Body> {
    multipart_field("file", filename, content)
}

fn multipart_field(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::post("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn upload(app: &TestApp, filename: &str, content: &[u8]) -> Uuid {
    let (status, body) = send_json(&app.router, multipart_upload(filename, content)).await;
    assert_eq!(status, StatusCode::OK, "upload failed: {}", body);
    body["file_id"].as_str().unwrap().parse().unwrap()
}

const REPLY: &str = r#"{"summary":"Minutes of the board meeting.","insights":["Budget approved"],"topics":["governance"],"sentiment":"positive"}"#;

#[tokio::test]
async fn test_health_and_info() {
    let app = app(Some(REPLY));

    let health = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app.router, health).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    let info = Request::get("/api/info").body(Body::empty()).unwrap();
    let (status, info) = send_json(&app.router, info).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["name"], "docinsight");
    assert_eq!(info["backend"]["model"], "canned-model");
}

#[tokio::test]
async fn test_readiness_follows_state() {
    let app = app(Some(REPLY));
    app.state.set_ready(false);

    let (status, _) = send(&app.router, Request::get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_upload_without_file_field_is_invalid_request() {
    let app = app(Some(REPLY));

    let request = multipart_field("document", "memo.txt", b"some text");
    let (status, body) = send_json(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request");
    assert!(app.state.db().list_files().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_process_and_fetch_result() {
    let app = app(Some(REPLY));
    let file_id = upload(&app, "minutes.txt", b"The board met and approved the budget.").await;

    let record = app.state.db().get_file(file_id).unwrap().unwrap();
    assert_eq!(record.status, FileStatus::Uploaded);
    assert_eq!(record.filename, "minutes.txt");

    let (status, result) = send_json(
        &app.router,
        Request::post(format!("/api/process/{}", file_id)).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["summary"], "Minutes of the board meeting.");
    assert_eq!(result["sentiment"], "positive");

    let record = app.state.db().get_file(file_id).unwrap().unwrap();
    assert_eq!(record.status, FileStatus::Processed);

    let (status, stored) = send_json(
        &app.router,
        Request::get(format!("/api/results/{}", file_id)).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["insights"][0], "Budget approved");
    assert_eq!(stored["origin"], "parsed");
}

#[tokio::test]
async fn test_download_and_content() {
    let app = app(Some(REPLY));
    let file_id = upload(&app, "notes.txt", b"plain notes").await;

    let (status, body) = send_json(
        &app.router,
        Request::get(format!("/api/download/{}", file_id)).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["download_url"],
        format!("http://files.test/api/files/{}/content", file_id)
    );

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get(format!("/api/files/{}/content", file_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"plain notes");
}

#[tokio::test]
async fn test_unknown_file_is_not_found() {
    let app = app(Some(REPLY));
    let missing = Uuid::new_v4();

    let (status, body) = send_json(
        &app.router,
        Request::get(format!("/api/download/{}", missing)).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "not_found");

    let (status, _) = send_json(
        &app.router,
        Request::get(format!("/api/results/{}", missing)).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blank_upload_fails_extraction_and_marks_failed() {
    let app = app(Some(REPLY));
    let file_id = upload(&app, "blank.txt", b"   \n\n  ").await;

    let (status, body) = send_json(
        &app.router,
        Request::post(format!("/api/process/{}", file_id)).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "extraction_error");

    let record = app.state.db().get_file(file_id).unwrap().unwrap();
    assert_eq!(record.status, FileStatus::Failed);
    assert!(record.error_message.is_some());
}

#[tokio::test]
async fn test_generation_failure_is_service_unavailable() {
    let app = app(None);
    let file_id = upload(&app, "memo.txt", b"Some content worth analyzing.").await;

    let (status, body) = send_json(
        &app.router,
        Request::post(format!("/api/process/{}", file_id)).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["type"], "generation_error");
    assert_eq!(
        app.state.db().get_file(file_id).unwrap().unwrap().status,
        FileStatus::Failed
    );
}

#[tokio::test]
async fn test_extract_summarize_and_analyze() {
    let app = app(Some(REPLY));
    let text = "First paragraph about the budget.\n\nSecond paragraph about hiring.";
    let file_id = upload(&app, "memo.txt", text.as_bytes()).await;

    let (status, extracted) = send_json(
        &app.router,
        json_post("/api/extract-text", serde_json::json!({ "file_id": file_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(extracted["text_length"], text.chars().count());
    assert_eq!(extracted["total_chunks"], 1);
    assert_eq!(extracted["chunks"][0], text);

    let (status, summary) = send_json(
        &app.router,
        json_post("/api/summarize", serde_json::json!({ "file_id": file_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["summary"], "Minutes of the board meeting.");

    let (status, analysis) = send_json(
        &app.router,
        json_post("/api/analyze", serde_json::json!({ "file_id": file_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(analysis["topics"][0], "governance");
    assert_eq!(analysis["sentiment"], "positive");
    assert!(analysis.get("summary").is_none());

    // summarize/analyze do not store results
    assert!(app.state.db().get_result(file_id).unwrap().is_none());
}
