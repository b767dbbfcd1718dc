//! Shared types and utilities for sampreset
//!
//! This crate holds the sampling strategy data model served by the responder
//! and small helpers used by its configuration layer.

pub mod types;
pub mod utils;

// Re-export commonly used types
pub use types::strategy::*;
