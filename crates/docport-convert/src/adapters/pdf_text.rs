//! PdfTextExtractor — pulls the embedded text layer out of a PDF with
//! `pdftotext` (poppler-utils).
//!
//! Used when the engine cannot produce plain text from a PDF itself. The page
//! count comes from `pdfinfo`; pages are extracted in batches of
//! [`PDF_BATCH_PAGES`] so one invocation never handles the whole document.
//! Each page is followed by a blank line in the result.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, warn};

use docport_core::defaults::{
    EXTRACTION_CMD_TIMEOUT_SECS, PDFINFO_PATH, PDFTOTEXT_PATH, PDF_BATCH_PAGES,
};
use docport_core::Result;

use super::run_cmd_with_timeout;

/// `pdftotext` ends every page with a form feed.
const PAGE_BREAK: char = '\u{0c}';

#[derive(Debug, Clone)]
pub struct PdfTextExtractor {
    pdftotext: PathBuf,
    pdfinfo: PathBuf,
    timeout_secs: u64,
}

impl PdfTextExtractor {
    pub fn new(pdftotext: impl Into<PathBuf>, pdfinfo: impl Into<PathBuf>) -> Self {
        Self {
            pdftotext: pdftotext.into(),
            pdfinfo: pdfinfo.into(),
            timeout_secs: EXTRACTION_CMD_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Page count reported by `pdfinfo`, if it can be determined.
    pub async fn page_count(&self, pdf: &Path) -> Option<usize> {
        match run_cmd_with_timeout(Command::new(&self.pdfinfo).arg(pdf), self.timeout_secs).await {
            Ok(output) => parse_page_count(&output),
            Err(e) => {
                warn!(pdf = %pdf.display(), error = %e, "pdf_text: pdfinfo failed, extracting in one pass");
                None
            }
        }
    }

    /// Extract the text of every page, each followed by a blank line.
    pub async fn extract(&self, pdf: &Path) -> Result<String> {
        let mut text = String::new();

        match self.page_count(pdf).await {
            Some(pages) if pages > 0 => {
                debug!(pdf = %pdf.display(), pages, "pdf_text: extracting in batches");
                let mut start = 1usize;
                while start <= pages {
                    let end = (start + PDF_BATCH_PAGES - 1).min(pages);
                    let chunk = run_cmd_with_timeout(
                        Command::new(&self.pdftotext)
                            .arg("-f")
                            .arg(start.to_string())
                            .arg("-l")
                            .arg(end.to_string())
                            .arg(pdf)
                            .arg("-"),
                        self.timeout_secs,
                    )
                    .await?;
                    append_pages(&mut text, &chunk);
                    start = end + 1;
                }
            }
            _ => {
                let all = run_cmd_with_timeout(
                    Command::new(&self.pdftotext).arg(pdf).arg("-"),
                    self.timeout_secs,
                )
                .await?;
                append_pages(&mut text, &all);
            }
        }

        Ok(text)
    }
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new(PDFTOTEXT_PATH, PDFINFO_PATH)
    }
}

/// Read the `Pages:` line of `pdfinfo` output.
fn parse_page_count(output: &str) -> Option<usize> {
    output.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim().eq_ignore_ascii_case("pages") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

/// Append each form-feed separated page of `chunk`, followed by a blank line.
fn append_pages(text: &mut String, chunk: &str) {
    let chunk = chunk.strip_suffix(PAGE_BREAK).unwrap_or(chunk);
    if chunk.is_empty() {
        return;
    }
    for page in chunk.split(PAGE_BREAK) {
        text.push_str(page);
        text.push_str("\n\n");
    }
}
