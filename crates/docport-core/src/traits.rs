//! Core traits for docport abstractions.
//!
//! These traits are the seams between the pipeline and its collaborators:
//! the external conversion engine and the strategies that locate its output.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{EngineRun, EngineStatus, FormatSpec};

// =============================================================================
// CONVERSION ENGINE
// =============================================================================

/// An external document conversion program.
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    /// Check whether the engine can run. Never fails; problems are reported
    /// as an unavailable status carrying the diagnostic text.
    async fn probe(&self) -> EngineStatus;

    /// Convert `input` into `format`, writing output files into `out_dir`.
    ///
    /// A successful return does not name the produced file; callers locate
    /// it themselves.
    async fn convert(&self, input: &Path, out_dir: &Path, format: &FormatSpec)
        -> Result<EngineRun>;

    /// Human-readable name of this engine.
    fn name(&self) -> &str;
}

// =============================================================================
// OUTPUT RESOLUTION
// =============================================================================

/// What a resolver knows about one finished engine run.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Workspace directory holding the input and engine outputs.
    pub work_dir: &'a Path,
    /// The staged input file.
    pub input_path: &'a Path,
    /// Stem of the staged input (the workspace UUID).
    pub stem: &'a str,
    /// Lower-cased input extension including the dot, if any.
    pub input_ext: Option<&'a str>,
    /// Requested format.
    pub format: &'a FormatSpec,
}

impl ResolveContext<'_> {
    /// `<stem>.<target-ext>` inside the workspace.
    pub fn expected_output(&self) -> PathBuf {
        self.work_dir
            .join(format!("{}.{}", self.stem, self.format.target_ext()))
    }
}

/// One strategy for locating the engine's output file.
#[async_trait]
pub trait OutputResolver: Send + Sync {
    /// Return the output path if this strategy finds (or produces) it.
    async fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<Option<PathBuf>>;

    /// Human-readable name of this resolver.
    fn name(&self) -> &str;
}
