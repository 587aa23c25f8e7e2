//! # Error Types
//!
//! Errors for the nanopublication store, one enum per port plus the
//! manager-level `NanopubError` they convert into.

use shared_types::{Iri, NQuadsError, SourceError};
use thiserror::Error;

/// Quad store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the staging artifact failed.
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The staging artifact could not be parsed by the bulk loader.
    #[error("Bulk load parse error: {0}")]
    Parse(#[from] NQuadsError),

    /// Backend-specific failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<SourceError> for StoreError {
    fn from(err: SourceError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Blob depot failures.
#[derive(Debug, Error)]
pub enum DepotError {
    /// No blob with this id.
    #[error("File not found: {0}")]
    NotFound(String),

    /// Filesystem failure.
    #[error("Depot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata sidecar could not be encoded or decoded.
    #[error("Depot metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Errors surfaced by the nanopublication manager.
#[derive(Debug, Error)]
pub enum NanopubError {
    /// Caller may not retire or revise this nanopublication.
    #[error("Unauthorized: caller may not edit {target}")]
    Unauthorized { target: Iri },

    /// A `data:` URL in `whyis:hasContent` could not be decoded.
    #[error("Invalid data URL for {entity}: {reason}")]
    InvalidDataUrl { entity: String, reason: String },

    /// A nanopublication head is malformed (e.g. a literal part link).
    #[error("Malformed nanopublication {identifier}: {reason}")]
    Malformed { identifier: String, reason: String },

    /// Quad store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Blob depot failure.
    #[error(transparent)]
    Depot(#[from] DepotError),
}

impl From<SourceError> for NanopubError {
    fn from(err: SourceError) -> Self {
        NanopubError::Store(StoreError::from(err))
    }
}

impl From<NQuadsError> for NanopubError {
    fn from(err: NQuadsError) -> Self {
        NanopubError::Store(StoreError::Parse(err))
    }
}

impl From<std::io::Error> for NanopubError {
    fn from(err: std::io::Error) -> Self {
        NanopubError::Store(StoreError::Io(err))
    }
}

/// Result alias for manager operations.
pub type NanopubResult<T> = Result<T, NanopubError>;
