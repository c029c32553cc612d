//! # docport-convert
//!
//! Document conversion for docport.
//!
//! This crate provides:
//! - The `soffice` engine adapter (probe and headless convert, both bounded)
//! - A `pdftotext` fallback for PDF-to-text conversions the engine cannot do
//! - The ordered output resolver chain
//! - Per-request scratch workspaces that clean up after themselves
//! - The conversion pipeline tying these to the artifact store
//! - The periodic retention sweeper
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docport_convert::{resolve, ConversionPipeline, PdfTextExtractor, SofficeEngine, Sweeper};
//!
//! let engine = Arc::new(SofficeEngine::new("soffice"));
//! let status = engine.probe().await;
//!
//! let pipeline = ConversionPipeline::new(engine, store.clone(), "./tmp", status)
//!     .with_resolvers(resolve::default_chain(Arc::new(PdfTextExtractor::default())));
//!
//! let outcome = pipeline.run(ConversionRequest::new(bytes, "report.docx", "pdf")).await?;
//!
//! let sweeper = Sweeper::new(store, Duration::from_secs(3600)).start();
//! ```

pub mod adapters;
pub mod pipeline;
pub mod resolve;
pub mod sweeper;
pub mod workspace;

// Re-export core types
pub use docport_core::*;

pub use adapters::{PdfTextExtractor, SofficeEngine};
pub use pipeline::ConversionPipeline;
pub use resolve::{ExactNameResolver, PdfTextFallbackResolver, SuffixScanResolver};
pub use sweeper::{Sweeper, SweeperHandle};
pub use workspace::{StagedInput, Workspace};
