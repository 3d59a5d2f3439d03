//! Utility functions for path normalization and parameter collection.
//!
//! - [`path_normalizer`] - Canonical slug form for url paths
//! - [`collectors`] - Ordered parameter and filter accumulation

pub mod collectors;
pub mod path_normalizer;
