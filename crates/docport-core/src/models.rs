//! Core data models for docport.
//!
//! These types are shared across the docport crates and describe one
//! conversion request, its outcome, the engine status and the retention
//! policy for stored artifacts.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_FORMAT, EXPIRY_DISPLAY_FORMAT, MAX_FILE_EXPIRY_HOURS, NEVER_EXPIRES,
};
use crate::error::{Error, Result};

// =============================================================================
// FORMAT SPECIFIER
// =============================================================================

/// Client-supplied output format, e.g. `"pdf"` or `"pdf:writer_pdf_Export"`.
///
/// The raw string is handed to the engine untouched; the target extension is
/// the token before the first `:`, lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    raw: String,
    target_ext: String,
}

impl FormatSpec {
    /// Parse a specifier. Blank input means [`DEFAULT_FORMAT`].
    ///
    /// The extension becomes part of stored filenames, so it must be
    /// non-empty ASCII alphanumerics.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = match raw.trim() {
            "" => DEFAULT_FORMAT,
            trimmed => trimmed,
        };
        let target_ext = raw
            .split(':')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if target_ext.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "format '{}' names no target extension",
                raw
            )));
        }
        if !target_ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidRequest(format!(
                "format '{}' has an invalid target extension",
                raw
            )));
        }

        Ok(Self {
            raw: raw.to_string(),
            target_ext,
        })
    }

    /// The specifier exactly as passed to `--convert-to`.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Lower-cased extension of the expected output file.
    pub fn target_ext(&self) -> &str {
        &self.target_ext
    }

    /// Whether the output is plain text (and gets inlined in responses).
    pub fn is_text(&self) -> bool {
        self.target_ext == crate::defaults::TEXT_EXT
    }
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            raw: DEFAULT_FORMAT.to_string(),
            target_ext: DEFAULT_FORMAT.to_string(),
        }
    }
}

impl std::fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

// =============================================================================
// REQUEST / OUTCOME
// =============================================================================

/// One inbound conversion.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Uploaded file bytes.
    pub data: Vec<u8>,
    /// Client filename; untrusted.
    pub filename: String,
    /// Raw format specifier; blank means `txt`.
    pub format: String,
}

impl ConversionRequest {
    pub fn new(data: impl Into<Vec<u8>>, filename: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            filename: filename.into(),
            format: format.into(),
        }
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionOutcome {
    /// Client filename as uploaded.
    pub filename: String,
    /// Retrieval key, `<YYYYMMDD>/<base>_<millis>.<ext>`.
    pub relative_path: String,
    /// Where the artifact was written.
    pub absolute_path: PathBuf,
    /// Artifact text, present only for `txt` output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Expiry timestamp for display, or "never expires".
    pub expiry: String,
}

/// Captured output of a successful engine run.
#[derive(Debug, Clone, Default)]
pub struct EngineRun {
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

// =============================================================================
// ENGINE STATUS
// =============================================================================

/// Availability of the conversion engine, established by probing it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineStatus {
    pub available: bool,
    /// Version string when available, diagnostic text otherwise.
    pub info: String,
    pub checked_at: DateTime<Utc>,
}

impl EngineStatus {
    pub fn available(version: impl Into<String>) -> Self {
        Self {
            available: true,
            info: version.into(),
            checked_at: Utc::now(),
        }
    }

    pub fn unavailable(diagnostic: impl Into<String>) -> Self {
        Self {
            available: false,
            info: diagnostic.into(),
            checked_at: Utc::now(),
        }
    }
}

// =============================================================================
// RETENTION
// =============================================================================

/// How long stored artifacts live before the sweep removes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
    /// Artifacts are never deleted.
    #[default]
    Infinite,
    /// Artifacts older than this are deleted. Always non-zero.
    Finite(Duration),
}

impl RetentionPolicy {
    /// Build from a configured hour count; zero or negative means infinite.
    /// Counts above [`MAX_FILE_EXPIRY_HOURS`] are clamped to it.
    pub fn from_hours(hours: i64) -> Self {
        if hours <= 0 {
            return RetentionPolicy::Infinite;
        }
        let hours = (hours as u64).min(MAX_FILE_EXPIRY_HOURS);
        let secs = hours.checked_mul(3600).unwrap_or(MAX_FILE_EXPIRY_HOURS * 3600);
        RetentionPolicy::Finite(Duration::from_secs(secs))
    }

    /// Finite window, `None` when infinite.
    pub fn window(&self) -> Option<Duration> {
        match self {
            RetentionPolicy::Infinite => None,
            RetentionPolicy::Finite(window) => Some(*window),
        }
    }

    /// Window in whole hours, as reported by the health endpoint.
    pub fn hours(&self) -> Option<u64> {
        self.window().map(|w| w.as_secs() / 3600)
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, RetentionPolicy::Infinite)
    }

    /// True when a file of this age is past the window.
    pub fn is_expired(&self, age: Duration) -> bool {
        match self {
            RetentionPolicy::Infinite => false,
            RetentionPolicy::Finite(window) => age > *window,
        }
    }

    /// Human-readable expiry for an artifact created at `created`.
    ///
    /// A finite window whose end is past the representable calendar range
    /// displays as never expiring.
    pub fn expiry_display(&self, created: DateTime<Local>) -> String {
        self.window()
            .and_then(|w| chrono::Duration::from_std(w).ok())
            .and_then(|window| created.checked_add_signed(window))
            .map(|expiry| expiry.format(EXPIRY_DISPLAY_FORMAT).to_string())
            .unwrap_or_else(|| NEVER_EXPIRES.to_string())
    }
}
