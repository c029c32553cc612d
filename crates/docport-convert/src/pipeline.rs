//! The conversion pipeline: upload bytes in, stored artifact out.
//!
//! Each run stages the input in its own [`Workspace`], invokes the engine,
//! locates the output through the resolver chain and persists it into the
//! artifact store. The workspace is released on every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use docport_core::{
    ConversionEngine, ConversionOutcome, ConversionRequest, EngineStatus, Error, FormatSpec,
    OutputResolver, ResolveContext, Result,
};
use docport_store::ArtifactStore;

use crate::resolve::{ExactNameResolver, SuffixScanResolver};
use crate::workspace::{StagedInput, Workspace};

pub struct ConversionPipeline {
    engine: Arc<dyn ConversionEngine>,
    store: Arc<ArtifactStore>,
    resolvers: Vec<Arc<dyn OutputResolver>>,
    tmp_root: PathBuf,
    status: RwLock<EngineStatus>,
}

impl ConversionPipeline {
    /// Build a pipeline around an already-probed engine.
    ///
    /// The resolver chain starts as exact-name then suffix-scan; use
    /// [`with_resolvers`](Self::with_resolvers) to install the full chain.
    pub fn new(
        engine: Arc<dyn ConversionEngine>,
        store: Arc<ArtifactStore>,
        tmp_root: impl Into<PathBuf>,
        status: EngineStatus,
    ) -> Self {
        Self {
            engine,
            store,
            resolvers: vec![Arc::new(ExactNameResolver), Arc::new(SuffixScanResolver)],
            tmp_root: tmp_root.into(),
            status: RwLock::new(status),
        }
    }

    /// Replace the resolver chain.
    pub fn with_resolvers(mut self, resolvers: Vec<Arc<dyn OutputResolver>>) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// Append one resolver to the end of the chain.
    pub fn with_resolver(mut self, resolver: Arc<dyn OutputResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    pub fn tmp_root(&self) -> &Path {
        &self.tmp_root
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Snapshot of the cached engine status.
    pub async fn engine_status(&self) -> EngineStatus {
        self.status.read().await.clone()
    }

    /// Probe the engine again and replace the cached status.
    pub async fn reprobe(&self) -> EngineStatus {
        let fresh = self.engine.probe().await;
        *self.status.write().await = fresh.clone();
        info!(
            engine = self.engine.name(),
            available = fresh.available,
            info = %fresh.info,
            "pipeline: engine re-probed"
        );
        fresh
    }

    /// Convert one upload and persist the result.
    #[instrument(skip(self, request), fields(filename = %request.filename, format = %request.format))]
    pub async fn run(&self, request: ConversionRequest) -> Result<ConversionOutcome> {
        let status = self.engine_status().await;
        if !status.available {
            return Err(Error::EngineUnavailable(status.info));
        }
        if request.filename.trim().is_empty() {
            return Err(Error::InvalidRequest("no file selected".to_string()));
        }
        if request.data.is_empty() {
            return Err(Error::InvalidRequest("uploaded file is empty".to_string()));
        }
        let format = FormatSpec::parse(&request.format)?;

        let started = Instant::now();
        let workspace = Workspace::create(&self.tmp_root).await?;
        let input = workspace.stage_input(&request.data, &request.filename).await?;

        let run = self.engine.convert(&input.path, workspace.path(), &format).await?;
        debug!(
            stdout = %run.stdout.trim(),
            stderr = %run.stderr.trim(),
            engine_ms = run.duration.as_millis() as u64,
            "pipeline: engine finished"
        );

        let output = self.resolve_output(&workspace, &input, &format).await?;
        let stored = self
            .store
            .persist(&output, &request.filename, format.target_ext())
            .await?;

        let expiry = self.store.retention().expiry_display(stored.created);
        let text = if format.is_text() {
            let bytes = tokio::fs::read(&stored.absolute_path).await?;
            Some(String::from_utf8_lossy(&bytes).into_owned())
        } else {
            None
        };

        info!(
            relative_path = %stored.relative_path,
            target_ext = format.target_ext(),
            duration_ms = started.elapsed().as_millis() as u64,
            "pipeline: conversion complete"
        );

        Ok(ConversionOutcome {
            filename: request.filename,
            relative_path: stored.relative_path,
            absolute_path: stored.absolute_path,
            text,
            expiry,
        })
    }

    /// Walk the resolver chain; errors from one resolver do not stop the next.
    async fn resolve_output(
        &self,
        workspace: &Workspace,
        input: &StagedInput,
        format: &FormatSpec,
    ) -> Result<PathBuf> {
        let ctx = ResolveContext {
            work_dir: workspace.path(),
            input_path: &input.path,
            stem: &input.stem,
            input_ext: input.ext.as_deref(),
            format,
        };

        for resolver in &self.resolvers {
            match resolver.resolve(&ctx).await {
                Ok(Some(path)) => {
                    debug!(resolver = resolver.name(), output = %path.display(), "pipeline: output resolved");
                    return Ok(path);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(resolver = resolver.name(), error = %e, "pipeline: resolver failed");
                }
            }
        }

        let listing = workspace.listing().await;
        warn!(
            target_ext = format.target_ext(),
            listing = ?listing,
            "pipeline: engine output not found"
        );
        Err(Error::OutputNotFound {
            target_ext: format.target_ext().to_string(),
            listing,
        })
    }
}
