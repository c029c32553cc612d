//! SofficeEngine — drives LibreOffice's `soffice` binary in headless mode.
//!
//! Convert invocation: `soffice --headless --convert-to <format> <input> --outdir <dir>`.
//! Both the version probe and conversions are bounded by timeouts; a child
//! that outlives its conversion timeout is killed and reaped before the
//! error is returned.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use docport_core::defaults::{CONVERT_TIMEOUT_SECS, PROBE_TIMEOUT_SECS, SOFFICE_PATH};
use docport_core::{ConversionEngine, EngineRun, EngineStatus, Error, FormatSpec, Result};

/// Adapter for the LibreOffice command-line converter.
#[derive(Debug, Clone)]
pub struct SofficeEngine {
    binary: PathBuf,
    convert_timeout: Duration,
    probe_timeout: Duration,
}

impl SofficeEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            convert_timeout: Duration::from_secs(CONVERT_TIMEOUT_SECS),
            probe_timeout: Duration::from_secs(PROBE_TIMEOUT_SECS),
        }
    }

    pub fn with_convert_timeout(mut self, timeout: Duration) -> Self {
        self.convert_timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn launch_failure(&self, e: std::io::Error) -> Error {
        Error::EngineFailure {
            code: None,
            stdout: String::new(),
            stderr: format!("failed to launch {}: {}", self.binary.display(), e),
        }
    }
}

impl Default for SofficeEngine {
    fn default() -> Self {
        Self::new(SOFFICE_PATH)
    }
}

/// Drain a child pipe to a lossily decoded string.
async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!(error = %e, "soffice: pipe read failed");
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[async_trait]
impl ConversionEngine for SofficeEngine {
    async fn probe(&self) -> EngineStatus {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let status = match tokio::time::timeout(self.probe_timeout, cmd.output()).await {
            Err(_) => EngineStatus::unavailable(format!(
                "{} --version timed out after {}s",
                self.binary.display(),
                self.probe_timeout.as_secs()
            )),
            Ok(Err(e)) => EngineStatus::unavailable(format!(
                "failed to launch {}: {}",
                self.binary.display(),
                e
            )),
            Ok(Ok(output)) if output.status.success() => {
                EngineStatus::available(String::from_utf8_lossy(&output.stdout).trim())
            }
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                if stderr.is_empty() {
                    EngineStatus::unavailable(format!("--version exited with {}", output.status))
                } else {
                    EngineStatus::unavailable(stderr)
                }
            }
        };

        if status.available {
            info!(binary = %self.binary.display(), version = %status.info, "soffice: engine available");
        } else {
            warn!(binary = %self.binary.display(), reason = %status.info, "soffice: engine unavailable");
        }
        status
    }

    async fn convert(&self, input: &Path, out_dir: &Path, format: &FormatSpec) -> Result<EngineRun> {
        let started = Instant::now();
        debug!(
            input = %input.display(),
            out_dir = %out_dir.display(),
            format = %format,
            "soffice: converting"
        );

        let mut child = Command::new(&self.binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg(format.raw())
            .arg(input)
            .arg("--outdir")
            .arg(out_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.launch_failure(e))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = tokio::time::timeout(self.convert_timeout, async {
            tokio::join!(child.wait(), read_pipe(stdout), read_pipe(stderr))
        })
        .await;

        let (exit, stdout, stderr) = match finished {
            Ok(result) => result,
            Err(_) => {
                // kill() also waits for the child, so nothing is left behind.
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "soffice: failed to kill timed-out child");
                }
                warn!(
                    input = %input.display(),
                    timeout_secs = self.convert_timeout.as_secs(),
                    "soffice: conversion timed out"
                );
                return Err(Error::Timeout {
                    secs: self.convert_timeout.as_secs(),
                });
            }
        };

        let exit = exit.map_err(|e| self.launch_failure(e))?;
        let duration = started.elapsed();

        if !exit.success() {
            warn!(
                code = ?exit.code(),
                stderr = %stderr.trim(),
                duration_ms = duration.as_millis() as u64,
                "soffice: conversion failed"
            );
            return Err(Error::EngineFailure {
                code: exit.code(),
                stdout,
                stderr,
            });
        }

        debug!(
            duration_ms = duration.as_millis() as u64,
            stdout = %stdout.trim(),
            stderr = %stderr.trim(),
            "soffice: conversion finished"
        );
        Ok(EngineRun {
            stdout,
            stderr,
            duration,
        })
    }

    fn name(&self) -> &str {
        "soffice"
    }
}
