//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value as JsonValue};

use docport_core::Error;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    PayloadTooLarge(String),
    /// A pipeline or store failure; reported as 500 with details.
    Conversion(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidRequest(msg) => ApiError::BadRequest(msg),
            Error::InvalidPath(path) => ApiError::BadRequest(format!("Invalid file path: {}", path)),
            Error::NotFound(path) => ApiError::NotFound(format!("File not found: {}", path)),
            other => ApiError::Conversion(other),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::BadRequest(format!("Multipart error: {}", err.body_text()))
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Conversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> JsonValue {
        let err = match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::PayloadTooLarge(msg) => {
                return json!({ "error": msg });
            }
            ApiError::Conversion(err) => err,
        };

        let summary = match err {
            Error::EngineUnavailable(_) => "Conversion engine is not available",
            Error::EngineFailure { .. } => "File conversion failed",
            Error::Timeout { .. } => "File conversion timed out",
            Error::OutputNotFound { .. } => "Converted file not found",
            _ => "Internal server error",
        };
        let mut body = json!({
            "error": summary,
            "kind": err.kind(),
            "details": err.to_string(),
        });

        match err {
            Error::EngineFailure { stdout, stderr, .. } => {
                body["stdout"] = json!(stdout);
                body["stderr"] = json!(stderr);
            }
            Error::OutputNotFound { listing, .. } => {
                body["files"] = json!(listing);
            }
            _ => {}
        }
        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = ?self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = ?self, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
