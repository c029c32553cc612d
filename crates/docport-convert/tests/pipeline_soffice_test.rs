//! End-to-end pipeline tests against a stand-in `soffice` script.
//!
//! The script mimics the real binary's calling convention:
//! `--headless --convert-to <format> <input> --outdir <dir>`.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use docport_convert::resolve::default_chain;
use docport_convert::{
    ConversionEngine, ConversionPipeline, ConversionRequest, Error, PdfTextExtractor,
    RetentionPolicy, SofficeEngine,
};
use docport_store::ArtifactStore;
use tempfile::TempDir;

const COPYING_SOFFICE: &str = r#"
if [ "$1" = "--version" ]; then
  echo "LibreOffice 7.6.4.1 test-build"
  exit 0
fi
in="$4"
out="$6"
ext="${3%%:*}"
base=$(basename "$in")
stem="${base%.*}"
cp "$in" "$out/$stem.$ext"
echo "convert $in -> $out/$stem.$ext using filter : $3"
"#;

struct Env {
    bin: TempDir,
    tmp: TempDir,
    data: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            bin: TempDir::new().unwrap(),
            tmp: TempDir::new().unwrap(),
            data: TempDir::new().unwrap(),
        }
    }

    fn tool(&self, name: &str, body: &str) -> PathBuf {
        let path = self.bin.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    async fn pipeline(&self, soffice_body: &str, convert_timeout: Duration) -> ConversionPipeline {
        let engine = Arc::new(
            SofficeEngine::new(self.tool("soffice", soffice_body))
                .with_convert_timeout(convert_timeout),
        );
        let status = engine.probe().await;
        let store = Arc::new(ArtifactStore::new(
            self.data.path(),
            RetentionPolicy::from_hours(24),
        ));
        let extractor = Arc::new(PdfTextExtractor::new(
            self.tool("pdftotext", r#"printf 'page one\fpage two\f'"#),
            self.tool("pdfinfo", "echo 'Pages: 2'"),
        ));
        ConversionPipeline::new(engine, store, self.tmp.path(), status)
            .with_resolvers(default_chain(extractor))
    }

    fn workspaces_left(&self) -> usize {
        std::fs::read_dir(self.tmp.path()).unwrap().count()
    }
}

fn is_layout(relative: &str, ext: &str) -> bool {
    let Some((date, file)) = relative.split_once('/') else {
        return false;
    };
    let Some(stamp) = file
        .strip_suffix(&format!(".{}", ext))
        .and_then(|rest| rest.rsplit_once('_'))
        .map(|(_, stamp)| stamp)
    else {
        return false;
    };
    date.len() == 8
        && date.bytes().all(|b| b.is_ascii_digit())
        && !stamp.is_empty()
        && stamp.bytes().all(|b| b.is_ascii_digit())
}

#[tokio::test]
async fn test_docx_to_pdf_round_trip() {
    let env = Env::new();
    let pipeline = env.pipeline(COPYING_SOFFICE, Duration::from_secs(30)).await;
    assert!(pipeline.engine_status().await.available);

    let outcome = pipeline
        .run(ConversionRequest::new(
            b"fake docx bytes".to_vec(),
            "report.docx",
            "pdf:writer_pdf_Export",
        ))
        .await
        .unwrap();

    assert!(is_layout(&outcome.relative_path, "pdf"), "{}", outcome.relative_path);
    assert!(outcome.relative_path.contains("/report_"));
    assert_eq!(outcome.text, None);
    assert_eq!(
        std::fs::read(&outcome.absolute_path).unwrap(),
        b"fake docx bytes"
    );
    let resolved = pipeline
        .store()
        .resolve(&outcome.relative_path)
        .await
        .unwrap();
    assert_eq!(resolved, outcome.absolute_path);
    assert_eq!(env.workspaces_left(), 0);
}

#[tokio::test]
async fn test_same_upload_twice_gets_distinct_paths() {
    let env = Env::new();
    let pipeline = env.pipeline(COPYING_SOFFICE, Duration::from_secs(30)).await;

    let first = pipeline
        .run(ConversionRequest::new(b"a".to_vec(), "report.docx", "pdf"))
        .await
        .unwrap();
    let second = pipeline
        .run(ConversionRequest::new(b"b".to_vec(), "report.docx", "pdf"))
        .await
        .unwrap();

    assert_ne!(first.relative_path, second.relative_path);
    assert!(first.absolute_path.exists());
    assert!(second.absolute_path.exists());
}

#[tokio::test]
async fn test_txt_output_is_inlined() {
    let env = Env::new();
    let pipeline = env.pipeline(COPYING_SOFFICE, Duration::from_secs(30)).await;

    let outcome = pipeline
        .run(ConversionRequest::new(b"plain words".to_vec(), "notes.odt", ""))
        .await
        .unwrap();

    assert!(is_layout(&outcome.relative_path, "txt"));
    assert_eq!(outcome.text.as_deref(), Some("plain words"));
}

#[tokio::test]
async fn test_pdf_to_txt_uses_text_layer_fallback() {
    let env = Env::new();
    // Exits cleanly without writing anything, as soffice does for PDF -> txt.
    let pipeline = env
        .pipeline(
            r#"if [ "$1" = "--version" ]; then echo "LibreOffice 7.6"; fi; exit 0"#,
            Duration::from_secs(30),
        )
        .await;

    let outcome = pipeline
        .run(ConversionRequest::new(b"%PDF-1.7".to_vec(), "scan.PDF", "txt"))
        .await
        .unwrap();

    assert_eq!(outcome.text.as_deref(), Some("page one\n\npage two\n\n"));
    assert_eq!(env.workspaces_left(), 0);
}

#[tokio::test]
async fn test_missing_output_reports_listing() {
    let env = Env::new();
    let pipeline = env
        .pipeline(
            r#"if [ "$1" = "--version" ]; then echo "LibreOffice 7.6"; exit 0; fi; touch "$6/.~lock.x#""#,
            Duration::from_secs(30),
        )
        .await;

    let err = pipeline
        .run(ConversionRequest::new(b"x".to_vec(), "deck.pptx", "pdf"))
        .await
        .unwrap_err();

    match err {
        Error::OutputNotFound { listing, .. } => {
            assert!(listing.iter().any(|n| n.ends_with(".pptx")));
            assert!(listing.iter().any(|n| n == ".~lock.x#"));
        }
        other => panic!("expected OutputNotFound, got {:?}", other),
    }
    assert_eq!(env.workspaces_left(), 0);
}

#[tokio::test]
async fn test_engine_failure_surfaces_streams() {
    let env = Env::new();
    let pipeline = env
        .pipeline(
            r#"if [ "$1" = "--version" ]; then echo "LibreOffice 7.6"; exit 0; fi; echo out; echo 'Error: source file could not be loaded' >&2; exit 81"#,
            Duration::from_secs(30),
        )
        .await;

    let err = pipeline
        .run(ConversionRequest::new(b"x".to_vec(), "broken.doc", "pdf"))
        .await
        .unwrap_err();

    match err {
        Error::EngineFailure { code, stdout, stderr } => {
            assert_eq!(code, Some(81));
            assert_eq!(stdout.trim(), "out");
            assert!(stderr.contains("could not be loaded"));
        }
        other => panic!("expected EngineFailure, got {:?}", other),
    }
    assert_eq!(env.workspaces_left(), 0);
}

#[tokio::test]
async fn test_timeout_leaves_no_workspace() {
    let env = Env::new();
    let pipeline = env
        .pipeline(
            r#"if [ "$1" = "--version" ]; then echo "LibreOffice 7.6"; exit 0; fi; exec sleep 30"#,
            Duration::from_millis(300),
        )
        .await;

    let err = pipeline
        .run(ConversionRequest::new(b"x".to_vec(), "slow.docx", "pdf"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { .. }));
    assert_eq!(env.workspaces_left(), 0);
}

#[tokio::test]
async fn test_unavailable_engine_never_converts() {
    let env = Env::new();
    let engine = Arc::new(SofficeEngine::new(env.bin.path().join("missing-soffice")));
    let status = engine.probe().await;
    assert!(!status.available);
    let store = Arc::new(ArtifactStore::new(env.data.path(), RetentionPolicy::Infinite));
    let pipeline = ConversionPipeline::new(engine, store, env.tmp.path(), status);

    let err = pipeline
        .run(ConversionRequest::new(b"x".to_vec(), "a.docx", "pdf"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::EngineUnavailable(_)));
    assert_eq!(env.workspaces_left(), 0);
}
