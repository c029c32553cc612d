//! HTTP handlers for docport-api.

pub mod convert;
pub mod download;
pub mod system;
