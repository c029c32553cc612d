//! Centralized default constants for the docport service.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// SERVER
// =============================================================================

/// Default bind address.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 15000;

/// Maximum accepted request body size in bytes (100 MiB).
pub const MAX_CONTENT_LENGTH: usize = 100 * 1024 * 1024;

/// Seconds to wait for background tasks after the server stops.
pub const SHUTDOWN_GRACE_SECS: u64 = 3;

// =============================================================================
// CONVERSION ENGINE
// =============================================================================

/// Default engine binary, resolved through `PATH`.
pub const SOFFICE_PATH: &str = "soffice";

/// Time bound for the startup `--version` probe.
pub const PROBE_TIMEOUT_SECS: u64 = 10;

/// Time bound for a single conversion.
pub const CONVERT_TIMEOUT_SECS: u64 = 60;

/// Format used when the client sends none.
pub const DEFAULT_FORMAT: &str = "txt";

/// Extension that triggers inlining of the artifact text in the response.
pub const TEXT_EXT: &str = "txt";

// =============================================================================
// PDF TEXT FALLBACK
// =============================================================================

/// Default `pdftotext` binary (poppler-utils).
pub const PDFTOTEXT_PATH: &str = "pdftotext";

/// Default `pdfinfo` binary (poppler-utils).
pub const PDFINFO_PATH: &str = "pdfinfo";

/// Pages extracted per `pdftotext` invocation.
pub const PDF_BATCH_PAGES: usize = 50;

/// Per-command timeout for the extraction tools (seconds).
pub const EXTRACTION_CMD_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// ARTIFACT STORE
// =============================================================================

/// Default artifact store root.
pub const DATA_DIR: &str = "./data";

/// Default workspace root.
pub const TMP_DIR: &str = "./tmp";

/// Default retention window in hours.
pub const FILE_EXPIRY_HOURS: u64 = 24;

/// Longest accepted retention window in hours (about 100 years).
pub const MAX_FILE_EXPIRY_HOURS: u64 = 876_000;

/// Interval between retention sweeps (one hour).
pub const SWEEP_INTERVAL_SECS: u64 = 3600;

/// Date partition directory format.
pub const PARTITION_DATE_FORMAT: &str = "%Y%m%d";

/// Display format for artifact expiry timestamps.
pub const EXPIRY_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Expiry text reported when retention is infinite.
pub const NEVER_EXPIRES: &str = "never expires";

/// Prefix for per-request workspace directories.
pub const WORKSPACE_PREFIX: &str = "work_";

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

pub const ENV_DEBUG: &str = "DEBUG";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_MAX_CONTENT_LENGTH: &str = "MAX_CONTENT_LENGTH";
pub const ENV_SOFFICE_PATH: &str = "SOFFICE_PATH";
pub const ENV_FILE_EXPIRY_HOURS: &str = "FILE_EXPIRY_HOURS";
pub const ENV_DATA_DIR: &str = "DATA_DIR";
pub const ENV_TMP_DIR: &str = "TMP_DIR";
pub const ENV_PUBLIC_URL: &str = "PUBLIC_URL";
pub const ENV_CONVERT_TIMEOUT_SECS: &str = "CONVERT_TIMEOUT_SECS";
pub const ENV_PROBE_TIMEOUT_SECS: &str = "PROBE_TIMEOUT_SECS";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "SWEEP_INTERVAL_SECS";
pub const ENV_PDFTOTEXT_PATH: &str = "PDFTOTEXT_PATH";
pub const ENV_PDFINFO_PATH: &str = "PDFINFO_PATH";
