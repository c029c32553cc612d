//! External program adapters.

pub mod pdf_text;
pub mod soffice;

pub use pdf_text::PdfTextExtractor;
pub use soffice::SofficeEngine;

use std::time::Duration;

use tokio::process::Command;

use docport_core::{Error, Result};

/// Run a command with a timeout, returning stdout as a string.
///
/// The child is killed if the timeout elapses.
pub(crate) async fn run_cmd_with_timeout(cmd: &mut Command, timeout_secs: u64) -> Result<String> {
    cmd.kill_on_drop(true);
    let output = tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output())
        .await
        .map_err(|_| Error::Internal(format!("External command timed out after {}s", timeout_secs)))?
        .map_err(|e| Error::Internal(format!("Failed to execute command: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Internal(format!(
            "Command failed (exit {}): {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
