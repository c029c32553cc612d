//! HTTP tests for the conversion API.
//!
//! Each test serves the router on an ephemeral port with a stand-in
//! `soffice` script and drives it with reqwest.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;

use docport_api::{app, AppState, ServiceConfig};
use docport_convert::resolve::default_chain;
use docport_convert::{
    ConversionEngine, ConversionPipeline, PdfTextExtractor, RetentionPolicy, SofficeEngine,
};
use docport_store::ArtifactStore;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tempfile::TempDir;

const COPYING_SOFFICE: &str = r#"
if [ "$1" = "--version" ]; then
  echo "LibreOffice 7.6.4.1 test-build"
  exit 0
fi
in="$4"
out="$6"
ext="${3%%:*}"
base=$(basename "$in")
stem="${base%.*}"
cp "$in" "$out/$stem.$ext"
"#;

const MISSING_SOFFICE: &str = "echo 'soffice: not installed' >&2\nexit 127";

struct TestServer {
    base: String,
    client: reqwest::Client,
    data: TempDir,
    _tmp: TempDir,
    bin: TempDir,
}

fn tool(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

async fn start_server(soffice_body: &str, max_content_length: usize) -> TestServer {
    let bin = TempDir::new().unwrap();
    let tmp = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();

    let config = ServiceConfig {
        max_content_length,
        soffice_path: tool(&bin, "soffice", soffice_body),
        retention: RetentionPolicy::from_hours(24),
        data_dir: data.path().to_path_buf(),
        tmp_dir: tmp.path().to_path_buf(),
        pdftotext_path: tool(&bin, "pdftotext", r#"printf 'page one\f'"#),
        pdfinfo_path: tool(&bin, "pdfinfo", "echo 'Pages: 1'"),
        ..ServiceConfig::default()
    };

    let engine = Arc::new(SofficeEngine::new(&config.soffice_path));
    let status = engine.probe().await;
    let store = Arc::new(ArtifactStore::new(&config.data_dir, config.retention));
    let extractor = Arc::new(PdfTextExtractor::new(
        &config.pdftotext_path,
        &config.pdfinfo_path,
    ));
    let pipeline = Arc::new(
        ConversionPipeline::new(engine, store, &config.tmp_dir, status)
            .with_resolvers(default_chain(extractor)),
    );

    let router = app(AppState::new(pipeline, config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        base: format!("http://{}", addr),
        client: reqwest::Client::new(),
        data,
        _tmp: tmp,
        bin,
    }
}

fn upload(filename: &str, data: &[u8], format: Option<&str>) -> Form {
    let mut form = Form::new().part(
        "file",
        Part::bytes(data.to_vec()).file_name(filename.to_string()),
    );
    if let Some(format) = format {
        form = form.text("format", format.to_string());
    }
    form
}

impl TestServer {
    async fn convert(&self, form: Form) -> (reqwest::StatusCode, Value) {
        let resp = self
            .client
            .post(format!("{}/convert", self.base))
            .multipart(form)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        let body = resp.json().await.unwrap_or(Value::Null);
        (status, body)
    }
}

#[tokio::test]
async fn test_convert_then_download() {
    let server = start_server(COPYING_SOFFICE, 1024 * 1024).await;

    let (status, body) = server
        .convert(upload("report.docx", b"%PDF-1.4 fake body", Some("pdf")))
        .await;
    assert_eq!(status, 200, "body: {}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["filename"], "report.docx");
    assert!(body.get("text").is_none());

    let key = body["download_filename"].as_str().unwrap();
    assert!(key.ends_with(".pdf"));
    assert!(key.contains("/report_"));
    let url = body["download_url"].as_str().unwrap();
    assert_eq!(url, format!("{}/download/{}", server.base, key));
    assert!(server.data.path().join(key).is_file());

    let resp = server.client.get(url).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains(key.rsplit('/').next().unwrap()));
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"%PDF-1.4 fake body");
}

#[tokio::test]
async fn test_convert_txt_returns_text_inline() {
    let server = start_server(COPYING_SOFFICE, 1024 * 1024).await;

    let (status, body) = server
        .convert(upload("notes.odt", b"hello from notes", None))
        .await;
    assert_eq!(status, 200, "body: {}", body);
    assert_eq!(body["text"], "hello from notes");
    assert!(body["download_filename"].as_str().unwrap().ends_with(".txt"));
    assert!(body["expiry"].as_str().unwrap().len() >= 19);
}

#[tokio::test]
async fn test_convert_without_file_part() {
    let server = start_server(COPYING_SOFFICE, 1024 * 1024).await;

    let (status, body) = server
        .convert(Form::new().text("format", "pdf"))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "No file part in the request");
}

#[tokio::test]
async fn test_convert_with_blank_filename() {
    let server = start_server(COPYING_SOFFICE, 1024 * 1024).await;

    let (status, body) = server.convert(upload("", b"data", Some("pdf"))).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "No file selected");
}

#[tokio::test]
async fn test_convert_empty_payload() {
    let server = start_server(COPYING_SOFFICE, 1024 * 1024).await;

    let (status, body) = server.convert(upload("empty.docx", b"", Some("pdf"))).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_convert_rejects_oversized_body() {
    let server = start_server(COPYING_SOFFICE, 1024).await;

    let resp = server
        .client
        .post(format!("{}/convert", server.base))
        .multipart(upload("big.docx", &vec![b'x'; 8 * 1024], Some("pdf")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
    assert_eq!(std::fs::read_dir(server.data.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_convert_with_unavailable_engine() {
    let server = start_server(MISSING_SOFFICE, 1024 * 1024).await;

    let (status, body) = server
        .convert(upload("report.docx", b"content", Some("pdf")))
        .await;
    assert_eq!(status, 500);
    assert_eq!(body["kind"], "engine_unavailable");
    assert_eq!(body["error"], "Conversion engine is not available");
    assert!(body["details"].as_str().unwrap().contains("not installed"));
}

#[tokio::test]
async fn test_download_rejects_malformed_path() {
    let server = start_server(COPYING_SOFFICE, 1024 * 1024).await;

    for path in ["notadate/report.pdf", "20231201", "20231201/a/b.pdf"] {
        let resp = server
            .client
            .get(format!("{}/download/{}", server.base, path))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "path {}", path);
    }
}

#[tokio::test]
async fn test_download_missing_file() {
    let server = start_server(COPYING_SOFFICE, 1024 * 1024).await;

    let resp = server
        .client
        .get(format!("{}/download/20231201/gone_1.pdf", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("File not found"));
}

#[tokio::test]
async fn test_health_reports_engine() {
    let server = start_server(COPYING_SOFFICE, 1024 * 1024).await;

    let body: Value = server
        .client
        .get(format!("{}/health", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["libreoffice"], true);
    assert_eq!(body["version"], "LibreOffice 7.6.4.1 test-build");
    assert_eq!(body["file_expiry_hours"], 24);
}

#[tokio::test]
async fn test_reprobe_refreshes_status() {
    let server = start_server(MISSING_SOFFICE, 1024 * 1024).await;

    let health: Value = server
        .client
        .get(format!("{}/health", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["libreoffice"], false);

    // Install the engine, then ask the service to look again.
    tool(&server.bin, "soffice", COPYING_SOFFICE);
    let resp = server
        .client
        .post(format!("{}/health/reprobe", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["libreoffice"], true);

    let (status, _) = server
        .convert(upload("report.docx", b"content", Some("pdf")))
        .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_index_and_openapi_document() {
    let server = start_server(COPYING_SOFFICE, 1024 * 1024).await;

    let resp = server.client.get(&server.base).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("/convert"));

    let spec: Value = server
        .client
        .get(format!("{}/apispec.json", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(spec["paths"]["/convert"].is_object());
    assert!(spec["paths"]["/health"].is_object());
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let server = start_server(COPYING_SOFFICE, 1024 * 1024).await;

    let resp = server
        .client
        .get(format!("{}/health", server.base))
        .send()
        .await
        .unwrap();
    let id = resp.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}
