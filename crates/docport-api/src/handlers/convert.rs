//! Document conversion handler.

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use docport_core::ConversionRequest;

use crate::config::ServiceConfig;
use crate::{ApiError, AppState};

/// Multipart form accepted by `POST /convert`.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ConvertForm {
    /// Document to convert.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Target format, e.g. `pdf` or `pdf:writer_pdf_Export`. Defaults to `txt`.
    pub format: Option<String>,
}

/// Successful conversion.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConvertResponse {
    pub success: bool,
    /// Filename as uploaded.
    pub filename: String,
    /// Absolute URL of the converted file.
    #[schema(example = "http://localhost:15000/download/20231201/report_1701410000000.pdf")]
    pub download_url: String,
    /// Retrieval key of the converted file.
    #[schema(example = "20231201/report_1701410000000.pdf")]
    pub download_filename: String,
    /// Expiry timestamp (`%Y-%m-%d %H:%M:%S`) or "never expires".
    pub expiry: String,
    /// Converted text, present only for `txt` output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Convert an uploaded document with LibreOffice.
///
/// # Multipart Fields
/// - `file`: Document (required)
/// - `format`: Target format, optionally with filter options (default `txt`)
///
/// # Returns
/// - 200 OK with the download URL, expiry, and inline text for `txt`
/// - 400 Bad Request if the file is missing, unnamed, or empty
/// - 413 Payload Too Large if the body exceeds `MAX_CONTENT_LENGTH`
/// - 500 if the engine is unavailable, fails, times out, or writes no output
#[utoipa::path(post, path = "/convert", tag = "Conversion",
    request_body(content = ConvertForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Conversion succeeded", body = ConvertResponse),
        (status = 400, description = "Missing or empty upload"),
        (status = 413, description = "Upload too large"),
        (status = 500, description = "Conversion failed")
    ))]
pub async fn convert(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut format = String::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(|n| n.to_string());
        match field_name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?.to_vec();
                upload = Some((filename, data));
            }
            Some("format") => {
                format = field.text().await?;
            }
            _ => {}
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| ApiError::BadRequest("No file part in the request".to_string()))?;
    if filename.trim().is_empty() {
        return Err(ApiError::BadRequest("No file selected".to_string()));
    }

    info!(filename = %filename, size = data.len(), format = %format, "Conversion requested");

    let outcome = state
        .pipeline
        .run(ConversionRequest::new(data, filename, format))
        .await?;

    Ok(Json(ConvertResponse {
        success: true,
        download_url: download_url(&state.config, &headers, &outcome.relative_path),
        filename: outcome.filename,
        download_filename: outcome.relative_path,
        expiry: outcome.expiry,
        text: outcome.text,
    }))
}

/// Absolute download URL for a retrieval key.
///
/// Uses `PUBLIC_URL` when configured, otherwise the request's forwarded or
/// direct host. Path segments are percent-encoded.
pub fn download_url(config: &ServiceConfig, headers: &HeaderMap, relative_path: &str) -> String {
    let encoded: Vec<String> = relative_path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/download/{}", base_url(config, headers), encoded.join("/"))
}

fn base_url(config: &ServiceConfig, headers: &HeaderMap) -> String {
    if let Some(public) = &config.public_url {
        return public.clone();
    }

    let first_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let scheme = first_value("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
    let host = first_value("x-forwarded-host")
        .or_else(|| first_value(header::HOST.as_str()))
        .unwrap_or_else(|| format!("localhost:{}", config.port));
    format!("{}://{}", scheme, host)
}
