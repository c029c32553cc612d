//! Artifact download handler.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::debug;

use docport_core::{content_type_for, Error};

use crate::{ApiError, AppState};

/// Bytes read from the start of a file for content sniffing.
const SNIFF_LEN: usize = 512;

/// Download a converted file by its retrieval key.
///
/// # Returns
/// - 200 OK streaming the file as an attachment
/// - 400 Bad Request if the path is not `<YYYYMMDD>/<filename>`
/// - 404 Not Found if the file does not exist (or has expired)
#[utoipa::path(get, path = "/download/{date}/{filename}", tag = "Conversion",
    params(
        ("date" = String, Path, description = "Partition date, YYYYMMDD"),
        ("filename" = String, Path, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid file path"),
        (status = 404, description = "File not found")
    ))]
pub async fn download(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let relative = path.strip_prefix('/').unwrap_or(&path);
    let file_path = state.pipeline.store().resolve(relative).await?;

    let mut file = tokio::fs::File::open(&file_path).await.map_err(Error::from)?;
    let len = file.metadata().await.map_err(Error::from)?.len();

    let mut head = vec![0u8; SNIFF_LEN];
    let read = file.read(&mut head).await.map_err(Error::from)?;
    head.truncate(read);
    file.rewind().await.map_err(Error::from)?;

    let filename = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = content_type_for(&filename, &head);
    debug!(relative_path = %relative, content_type = %content_type, size = len, "Serving artifact");

    let mut response = (StatusCode::OK, Body::from_stream(ReaderStream::new(file))).into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&filename)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// `attachment` disposition with an ASCII fallback name and the exact
/// UTF-8 name in `filename*`.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}
