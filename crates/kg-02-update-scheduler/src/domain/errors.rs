//! # Error Types
//!
//! `ServiceError` is what inferencers and importers return; `SchedulerError`
//! is what a job execution returns before it is folded into a `JobOutcome`.

use kg_01_nanopub_store::NanopubError;
use shared_bus::QueueError;
use shared_types::{Iri, SourceError};
use thiserror::Error;

/// Failure inside an inferencer or importer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Reading the source graph failed.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Publishing results failed.
    #[error("Publish error: {0}")]
    Nanopub(#[from] NanopubError),

    /// Remote fetch or other service-specific failure.
    #[error("{0}")]
    Failed(String),
}

/// Errors raised while executing a job.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The store rejected a read or write.
    #[error(transparent)]
    Nanopub(#[from] NanopubError),

    /// A quad store read failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Follow-up work could not be enqueued.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// An inferencer or importer failed.
    #[error("Service {service} failed: {source}")]
    Service {
        service: String,
        #[source]
        source: ServiceError,
    },

    /// No registered service has this name.
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// The import gave up after exhausting its retries.
    #[error("Import of {entity} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        entity: Iri,
        attempts: u32,
        last: String,
    },
}

/// Result alias for job execution.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
