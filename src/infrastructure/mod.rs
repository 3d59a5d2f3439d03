//! Infrastructure layer for external collaborators.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and caching.
//!
//! # Modules
//!
//! - [`cache`] - Tag-aware caching (Redis, in-memory and no-op implementations)
//! - [`persistence`] - Url repository implementations

pub mod cache;
pub mod persistence;
