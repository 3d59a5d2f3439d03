//! Error taxonomy of the routing core.
//!
//! Not-found is an expected outcome of normal operation and is therefore
//! represented as `Ok(None)` by lookups, never as an error variant.

use crate::domain::repositories::StorageError;

/// Errors surfaced by the routing core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed url path input, raised at normalization time.
    #[error("invalid url path: {reason}")]
    Validation { reason: String },

    /// Destination string does not match the `Module:Presenter:action` grammar.
    #[error("invalid destination format: {destination:?}")]
    InvalidDestinationFormat { destination: String },

    /// A record with the same normalized path already exists.
    ///
    /// Raised by the persister on create; the transaction has already been
    /// rolled back when this surfaces.
    #[error("url path already exists: {path:?}")]
    UrlAlreadyExists { path: String },

    /// Redirect linking was attempted on a record without an identifier.
    #[error("url record has not been persisted yet")]
    UrlNotPersisted,

    /// A redirect chain visited the same record twice while being followed.
    #[error("redirect loop detected at url id {id}")]
    RedirectLoop { id: i64 },

    /// Storage failure passed through unchanged.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl Error {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}

/// Result type used across the routing core.
pub type Result<T> = std::result::Result<T, Error>;
