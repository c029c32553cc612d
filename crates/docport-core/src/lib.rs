//! # docport-core
//!
//! Core types, traits, and abstractions for the docport conversion service.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the store, conversion and API crates depend on.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file_safety::{artifact_base_name, content_type_for, input_extension, sanitize_filename};
pub use models::*;
pub use traits::*;
