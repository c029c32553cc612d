//! # docport-store
//!
//! Filesystem artifact store for docport.
//!
//! Converted files live in a tree partitioned by creation date:
//!
//! ```text
//! {root}/{YYYYMMDD}/{base-name}_{epoch-millis}.{ext}
//! ```
//!
//! The retrieval key of an artifact is its path relative to the root
//! (`{YYYYMMDD}/{filename}`). Keys of any other shape are rejected before
//! touching the filesystem, so a key can never address anything outside the
//! root.
//!
//! ## Example
//!
//! ```rust,ignore
//! use docport_store::ArtifactStore;
//! use docport_core::RetentionPolicy;
//!
//! let store = ArtifactStore::new("/var/lib/docport/data", RetentionPolicy::from_hours(24));
//! let stored = store.persist(&output, "report.docx", "pdf").await?;
//! let path = store.resolve(&stored.relative_path).await?;
//! ```

pub mod artifact_store;
pub mod sweep;

pub use artifact_store::{ArtifactKey, ArtifactStore, StoredArtifact};
pub use sweep::SweepReport;
