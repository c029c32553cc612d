//! Output resolver chain.
//!
//! The engine does not report what it wrote, so the pipeline asks an ordered
//! list of [`OutputResolver`]s to locate (or, for the PDF text fallback,
//! produce) the output file. The first resolver returning a path wins.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, warn};

use docport_core::{OutputResolver, ResolveContext, Result};

use crate::adapters::PdfTextExtractor;

/// Default chain: exact name, suffix scan, then the PDF text fallback.
pub fn default_chain(extractor: Arc<PdfTextExtractor>) -> Vec<Arc<dyn OutputResolver>> {
    vec![
        Arc::new(ExactNameResolver),
        Arc::new(SuffixScanResolver),
        Arc::new(PdfTextFallbackResolver::new(extractor)),
    ]
}

/// Looks for `<stem>.<target-ext>`, the name the engine normally uses.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactNameResolver;

#[async_trait]
impl OutputResolver for ExactNameResolver {
    async fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<Option<PathBuf>> {
        let expected = ctx.expected_output();
        match fs::metadata(&expected).await {
            Ok(meta) if meta.is_file() => Ok(Some(expected)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        "exact_name"
    }
}

/// Takes the first regular file, other than the input, whose name ends in
/// `.<target-ext>` (case-insensitive). Some filters name their output after
/// the filter rather than the input.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuffixScanResolver;

#[async_trait]
impl OutputResolver for SuffixScanResolver {
    async fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<Option<PathBuf>> {
        let suffix = format!(".{}", ctx.format.target_ext());
        let mut entries = fs::read_dir(ctx.work_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path == ctx.input_path {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if !name.ends_with(&suffix) {
                continue;
            }
            if entry.file_type().await?.is_file() {
                debug!(output = %path.display(), "resolve: matched by suffix");
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    fn name(&self) -> &str {
        "suffix_scan"
    }
}

/// Produces `<stem>.txt` from a PDF's text layer when the engine could not.
///
/// Applies only to `txt` conversions of `.pdf` inputs. Extraction failures
/// are logged and reported as "not found".
#[derive(Debug, Clone)]
pub struct PdfTextFallbackResolver {
    extractor: Arc<PdfTextExtractor>,
}

impl PdfTextFallbackResolver {
    pub fn new(extractor: Arc<PdfTextExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl OutputResolver for PdfTextFallbackResolver {
    async fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<Option<PathBuf>> {
        if !ctx.format.is_text() || ctx.input_ext != Some(".pdf") {
            return Ok(None);
        }

        let text = match self.extractor.extract(ctx.input_path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(input = %ctx.input_path.display(), error = %e, "resolve: pdf text fallback failed");
                return Ok(None);
            }
        };

        let output = ctx.expected_output();
        if let Err(e) = fs::write(&output, text.as_bytes()).await {
            warn!(output = %output.display(), error = %e, "resolve: failed to write extracted text");
            return Ok(None);
        }

        info!(output = %output.display(), chars = text.len(), "resolve: extracted pdf text layer");
        Ok(Some(output))
    }

    fn name(&self) -> &str {
        "pdf_text_fallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docport_core::FormatSpec;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        input: PathBuf,
        format: FormatSpec,
        input_ext: Option<&'static str>,
    }

    impl Fixture {
        fn new(input_name: &str, input_ext: Option<&'static str>, format: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let input = dir.path().join(input_name);
            std::fs::write(&input, b"input").unwrap();
            Self {
                dir,
                input,
                format: FormatSpec::parse(format).unwrap(),
                input_ext,
            }
        }

        fn ctx(&self) -> ResolveContext<'_> {
            ResolveContext {
                work_dir: self.dir.path(),
                input_path: &self.input,
                stem: "abc",
                input_ext: self.input_ext,
                format: &self.format,
            }
        }

        fn write(&self, name: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            std::fs::write(&path, b"out").unwrap();
            path
        }
    }

    #[tokio::test]
    async fn test_exact_name_found() {
        let fx = Fixture::new("abc.docx", Some(".docx"), "pdf:writer_pdf_Export");
        let expected = fx.write("abc.pdf");
        assert_eq!(ExactNameResolver.resolve(&fx.ctx()).await.unwrap(), Some(expected));
    }

    #[tokio::test]
    async fn test_exact_name_missing() {
        let fx = Fixture::new("abc.docx", Some(".docx"), "pdf");
        fx.write("other.pdf");
        assert_eq!(ExactNameResolver.resolve(&fx.ctx()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_suffix_scan_case_insensitive() {
        let fx = Fixture::new("abc.docx", Some(".docx"), "pdf");
        let other = fx.write("Exported.PDF");
        assert_eq!(SuffixScanResolver.resolve(&fx.ctx()).await.unwrap(), Some(other));
    }

    #[tokio::test]
    async fn test_suffix_scan_skips_input_and_directories() {
        let fx = Fixture::new("abc.txt", Some(".txt"), "txt");
        std::fs::create_dir(fx.dir.path().join("nested.txt")).unwrap();
        assert_eq!(SuffixScanResolver.resolve(&fx.ctx()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pdf_fallback_ignores_non_pdf_or_non_text() {
        let extractor = Arc::new(PdfTextExtractor::new("/nonexistent/pdftotext", "/nonexistent/pdfinfo"));
        let resolver = PdfTextFallbackResolver::new(extractor);

        let docx = Fixture::new("abc.docx", Some(".docx"), "txt");
        assert_eq!(resolver.resolve(&docx.ctx()).await.unwrap(), None);

        let pdf_to_html = Fixture::new("abc.pdf", Some(".pdf"), "html");
        assert_eq!(resolver.resolve(&pdf_to_html.ctx()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pdf_fallback_failure_is_not_found() {
        let extractor = Arc::new(PdfTextExtractor::new("/nonexistent/pdftotext", "/nonexistent/pdfinfo"));
        let resolver = PdfTextFallbackResolver::new(extractor);
        let fx = Fixture::new("abc.pdf", Some(".pdf"), "txt");

        assert_eq!(resolver.resolve(&fx.ctx()).await.unwrap(), None);
        assert!(!fx.dir.path().join("abc.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pdf_fallback_writes_expected_output() {
        use std::os::unix::fs::PermissionsExt;

        let tools = TempDir::new().unwrap();
        let write_tool = |name: &str, body: &str| -> PathBuf {
            let path = tools.path().join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        };
        let pdfinfo = write_tool("pdfinfo", "echo 'Pages: 1'");
        let pdftotext = write_tool("pdftotext", r#"printf 'Hello PDF\f'"#);
        let resolver = PdfTextFallbackResolver::new(Arc::new(PdfTextExtractor::new(pdftotext, pdfinfo)));
        let fx = Fixture::new("abc.pdf", Some(".pdf"), "txt");

        let output = resolver.resolve(&fx.ctx()).await.unwrap().unwrap();

        assert_eq!(output, fx.dir.path().join("abc.txt"));
        assert_eq!(std::fs::read_to_string(output).unwrap(), "Hello PDF\n\n");
    }

    #[test]
    fn test_default_chain_order() {
        let chain = default_chain(Arc::new(PdfTextExtractor::default()));
        let names: Vec<&str> = chain.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["exact_name", "suffix_scan", "pdf_text_fallback"]);
    }
}
