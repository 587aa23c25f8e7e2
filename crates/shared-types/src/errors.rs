//! # Error Types
//!
//! Errors shared by every crate that reads or writes quads.

use thiserror::Error;

/// Errors raised by a `QuadSource` while answering a pattern query.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing store could not be read.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A lock guarding the store was poisoned or unavailable.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while reading or writing N-Quads.
#[derive(Debug, Error)]
pub enum NQuadsError {
    /// Malformed statement.
    #[error("N-Quads syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Underlying reader or writer failed.
    #[error("N-Quads I/O error: {0}")]
    Io(#[from] std::io::Error),
}
