//! Error types for docport.

use thiserror::Error;

/// Result type alias using docport's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for docport operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The startup probe found no usable conversion engine
    #[error("Conversion engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Missing or empty upload, empty filename
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The engine process exited non-zero (or could not be launched).
    /// Both output streams are kept verbatim for diagnostics.
    #[error("Conversion engine failed ({}): {}", exit_label(.code), .stderr.trim())]
    EngineFailure {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The engine process exceeded its time bound and was killed
    #[error("Conversion engine timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The engine succeeded but no output file could be located
    #[error("Converted .{target_ext} output not found; workspace contains: [{}]", .listing.join(", "))]
    OutputNotFound {
        target_ext: String,
        listing: Vec<String>,
    },

    /// Malformed artifact path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persisting or copying an artifact failed
    #[error("Store error: {0}")]
    Store(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable snake_case name of the error kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::EngineUnavailable(_) => "engine_unavailable",
            Error::InvalidRequest(_) => "invalid_request",
            Error::EngineFailure { .. } => "engine_failure",
            Error::Timeout { .. } => "timeout",
            Error::OutputNotFound { .. } => "output_not_found",
            Error::InvalidPath(_) => "invalid_path",
            Error::NotFound(_) => "not_found",
            Error::Store(_) => "store_io",
            Error::Internal(_) => "internal",
            Error::Io(_) => "io",
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit {}", code),
        None => "no exit code".to_string(),
    }
}
