//! Service configuration from environment variables.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DEBUG` | `true` | Debug-level logging unless `false` |
//! | `HOST` | `0.0.0.0` | Bind address |
//! | `PORT` | `15000` | Bind port |
//! | `MAX_CONTENT_LENGTH` | `104857600` | Request body limit in bytes |
//! | `SOFFICE_PATH` | `soffice` | LibreOffice binary |
//! | `FILE_EXPIRY_HOURS` | `24` | Artifact retention; empty or `<= 0` keeps files forever, capped at 876000 |
//! | `DATA_DIR` | `./data` | Artifact store root |
//! | `TMP_DIR` | `./tmp` | Workspace root |
//! | `PUBLIC_URL` | unset | Base URL for download links |
//! | `CONVERT_TIMEOUT_SECS` | `60` | Conversion time limit |
//! | `PROBE_TIMEOUT_SECS` | `10` | Engine probe time limit |
//! | `SWEEP_INTERVAL_SECS` | `3600` | Retention sweep period |
//! | `PDFTOTEXT_PATH` | `pdftotext` | PDF text fallback binary |
//! | `PDFINFO_PATH` | `pdfinfo` | PDF page-count binary |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use docport_core::defaults::{self, *};
use docport_core::RetentionPolicy;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub debug: bool,
    pub host: String,
    pub port: u16,
    pub max_content_length: usize,
    pub soffice_path: PathBuf,
    pub retention: RetentionPolicy,
    pub data_dir: PathBuf,
    pub tmp_dir: PathBuf,
    pub public_url: Option<String>,
    pub convert_timeout: Duration,
    pub probe_timeout: Duration,
    pub sweep_interval: Duration,
    pub pdftotext_path: PathBuf,
    pub pdfinfo_path: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_vars(|_| None)
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let secs = |key: &str, default: u64| -> Duration {
            let secs = parse_or(lookup(key), default);
            Duration::from_secs(if secs == 0 { default } else { secs })
        };

        Self {
            debug: lookup(ENV_DEBUG)
                .map(|v| !v.trim().eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            host: text(ENV_HOST, SERVER_HOST),
            port: parse_or(lookup(ENV_PORT), SERVER_PORT),
            max_content_length: parse_or(lookup(ENV_MAX_CONTENT_LENGTH), defaults::MAX_CONTENT_LENGTH),
            soffice_path: PathBuf::from(text(ENV_SOFFICE_PATH, SOFFICE_PATH)),
            retention: parse_retention(lookup(ENV_FILE_EXPIRY_HOURS)),
            data_dir: PathBuf::from(text(ENV_DATA_DIR, DATA_DIR)),
            tmp_dir: PathBuf::from(text(ENV_TMP_DIR, TMP_DIR)),
            public_url: lookup(ENV_PUBLIC_URL)
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),
            convert_timeout: secs(ENV_CONVERT_TIMEOUT_SECS, CONVERT_TIMEOUT_SECS),
            probe_timeout: secs(ENV_PROBE_TIMEOUT_SECS, PROBE_TIMEOUT_SECS),
            sweep_interval: secs(ENV_SWEEP_INTERVAL_SECS, SWEEP_INTERVAL_SECS),
            pdftotext_path: PathBuf::from(text(ENV_PDFTOTEXT_PATH, PDFTOTEXT_PATH)),
            pdfinfo_path: PathBuf::from(text(ENV_PDFINFO_PATH, PDFINFO_PATH)),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Unset means the default window; an explicitly empty value or any
/// non-positive hour count means artifacts never expire. Larger counts than
/// `MAX_FILE_EXPIRY_HOURS` are clamped to it.
fn parse_retention(raw: Option<String>) -> RetentionPolicy {
    let Some(raw) = raw else {
        return RetentionPolicy::from_hours(FILE_EXPIRY_HOURS as i64);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return RetentionPolicy::Infinite;
    }
    match raw.parse::<i64>() {
        Ok(hours) => RetentionPolicy::from_hours(hours),
        Err(_) => RetentionPolicy::from_hours(FILE_EXPIRY_HOURS as i64),
    }
}
