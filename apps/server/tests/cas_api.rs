use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use advisordesk_core::cas::{ParserGatewayTrait, PortfolioSnapshot};
use advisordesk_core::errors::ParserError;
use advisordesk_server::{api::app_router, build_state_with_parser, config::Config};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const BOUNDARY: &str = "advisordesk-test-boundary";
const KEY: &str = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

struct StubParser {
    outcome: Result<PortfolioSnapshot, ParserError>,
}

#[async_trait]
impl ParserGatewayTrait for StubParser {
    async fn parse(
        &self,
        _file_path: &Path,
        _password: Option<&str>,
    ) -> Result<PortfolioSnapshot, ParserError> {
        self.outcome.clone()
    }
}

fn snapshot() -> PortfolioSnapshot {
    serde_json::from_value(json!({
        "investor": { "name": "ASHA RAO", "identityNumber": "ABCDE1234F" },
        "dematAccounts": [],
        "mutualFunds": [],
        "summary": { "totalValue": 150000.0, "accountCount": 1 },
        "format": "NSDL"
    }))
    .unwrap()
}

async fn build_test_router(
    outcome: Result<PortfolioSnapshot, ParserError>,
    encryption_key: Option<&str>,
) -> (TempDir, Router) {
    let tmp = tempdir().unwrap();
    let config = Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        db_path: tmp.path().join("db").join("test.db").to_string_lossy().to_string(),
        cors_allow: vec!["*".to_string()],
        request_timeout: Duration::from_secs(30),
        cas_storage_dir: tmp.path().join("cas"),
        cas_encryption_key: encryption_key.map(str::to_string),
        cas_parser_cmd: "unused".to_string(),
        cas_parser_args: vec![],
    };
    let state = build_state_with_parser(&config, Arc::new(StubParser { outcome }))
        .await
        .unwrap();
    (tmp, app_router(state, &config))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn multipart_upload(uri: &str, file_name: &str, bytes: &[u8], password: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
    if let Some(password) = password {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"password\"\r\n\r\n{password}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn pdf() -> Vec<u8> {
    b"%PDF-1.4\n% statement\n".to_vec()
}

async fn create_client(app: &Router) -> String {
    let (status, body) = send(
        app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/clients")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "name": "Asha Rao" }).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn wait_for_terminal_status(app: &Router, id: &str) -> Value {
    for _ in 0..100 {
        let (_, body) = send(app, get(&format!("/api/v1/clients/{id}/cas/status"))).await;
        if body["status"] != "parsing" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("parse did not finish");
}

#[tokio::test]
async fn health_routes_respond() {
    let (_tmp, app) = build_test_router(Ok(snapshot()), None).await;
    let (status, _) = send(&app, get("/api/v1/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get("/api/v1/readyz")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn full_cas_lifecycle() {
    let (_tmp, app) = build_test_router(Ok(snapshot()), Some(KEY)).await;
    let id = create_client(&app).await;

    let (status, body) = send(&app, get("/api/v1/clients")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["cas"]["status"], "not_uploaded");

    let (status, body) = send(
        &app,
        multipart_upload(
            &format!("/api/v1/clients/{id}/cas"),
            "cas_jan.pdf",
            &pdf(),
            Some("Secret123"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "uploaded");
    assert_eq!(body["fileMeta"]["name"], "cas_jan.pdf");
    assert_eq!(body["fileMeta"]["passwordProtected"], true);
    assert!(body["fileMeta"].get("storagePath").is_none());

    let (status, body) = send(&app, post_empty(&format!("/api/v1/clients/{id}/cas/parse"))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "parsing");

    let status_body = wait_for_terminal_status(&app, &id).await;
    assert_eq!(status_body["status"], "parsed");
    assert!(status_body.get("parsedData").is_none());

    let (status, body) = send(&app, get(&format!("/api/v1/clients/{id}/cas"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["parsedData"]["summary"]["totalValue"], 150000.0);

    let (_, client) = send(&app, get(&format!("/api/v1/clients/{id}"))).await;
    assert_eq!(client["identityNumber"], "ABCDE1234F");

    let (status, body) = send(
        &app,
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/v1/clients/{id}/cas"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_uploaded");
    assert!(body["fileMeta"].is_null());
}

#[tokio::test]
async fn wrong_password_is_reported_on_status() {
    let (_tmp, app) = build_test_router(Err(ParserError::WrongPassword), Some(KEY)).await;
    let id = create_client(&app).await;
    send(
        &app,
        multipart_upload(&format!("/api/v1/clients/{id}/cas"), "cas.pdf", &pdf(), Some("nope")),
    )
    .await;

    let (status, _) = send(&app, post_empty(&format!("/api/v1/clients/{id}/cas/parse"))).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let body = wait_for_terminal_status(&app, &id).await;
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["parseError"],
        "Incorrect CAS password. Please check and try again."
    );
}

#[tokio::test]
async fn upload_rejects_non_pdf() {
    let (_tmp, app) = build_test_router(Ok(snapshot()), Some(KEY)).await;
    let id = create_client(&app).await;

    let (status, body) = send(
        &app,
        multipart_upload(&format!("/api/v1/clients/{id}/cas"), "holdings.xlsx", b"PK\x03\x04", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "VALIDATION");
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn upload_for_unknown_client_is_404() {
    let (_tmp, app) = build_test_router(Ok(snapshot()), Some(KEY)).await;
    let (status, body) = send(
        &app,
        multipart_upload("/api/v1/clients/nobody/cas", "cas.pdf", &pdf(), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NOT_FOUND");
}

#[tokio::test]
async fn password_upload_without_key_is_a_config_error() {
    let (_tmp, app) = build_test_router(Ok(snapshot()), None).await;
    let id = create_client(&app).await;
    let (status, body) = send(
        &app,
        multipart_upload(&format!("/api/v1/clients/{id}/cas"), "cas.pdf", &pdf(), Some("pw")),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "CONFIG");

    let (_, body) = send(&app, get(&format!("/api/v1/clients/{id}/cas/status"))).await;
    assert_eq!(body["status"], "not_uploaded");
}

#[tokio::test]
async fn parse_and_reset_guard_their_states() {
    let (_tmp, app) = build_test_router(Ok(snapshot()), Some(KEY)).await;
    let id = create_client(&app).await;

    let (status, _) = send(&app, post_empty(&format!("/api/v1/clients/{id}/cas/parse"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, post_empty(&format!("/api/v1/clients/{id}/cas/reset"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "CONFLICT");
}

#[tokio::test]
async fn blank_client_name_is_rejected() {
    let (_tmp, app) = build_test_router(Ok(snapshot()), None).await;
    let (status, body) = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/clients")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "name": "  " }).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "VALIDATION");
}
