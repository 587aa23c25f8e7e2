//! # Job Queue Port
//!
//! The producing side of the job queue. The update scheduler enqueues
//! follow-up work through this trait; adapters decide where it runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from queue operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The queue was closed and accepts no more jobs.
    #[error("Job queue closed")]
    Closed,
}

/// Dispatch tier. Lower values run first; jobs in the same tier run in
/// submission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    /// Reaction to a single published unit.
    UnitReaction,
    /// Whole-graph recomputation.
    GlobalReaction,
    /// Top-level fan-out after a publish.
    Dispatch,
}

impl Priority {
    /// Numeric tier, lower first.
    pub fn value(&self) -> u8 {
        match self {
            Priority::UnitReaction => 1,
            Priority::GlobalReaction => 5,
            Priority::Dispatch => 9,
        }
    }
}

/// Result of an enqueue request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The job was queued.
    Accepted,
    /// A job with the same key is already pending or executing; the new job
    /// was dropped.
    Deduplicated,
}

/// Trait for submitting jobs.
pub trait JobQueue<T>: Send + Sync {
    /// Submit a job.
    ///
    /// # Arguments
    ///
    /// * `job` - The job payload
    /// * `priority` - Dispatch tier
    /// * `dedup_key` - When set, the job is dropped if another job holding
    ///   the same key is pending or executing
    fn enqueue(
        &self,
        job: T,
        priority: Priority,
        dedup_key: Option<String>,
    ) -> Result<EnqueueOutcome, QueueError>;

    /// Returns true if a job holding `key` is pending or executing.
    fn is_in_flight(&self, key: &str) -> bool;
}

impl<T, Q: JobQueue<T> + ?Sized> JobQueue<T> for std::sync::Arc<Q> {
    fn enqueue(
        &self,
        job: T,
        priority: Priority,
        dedup_key: Option<String>,
    ) -> Result<EnqueueOutcome, QueueError> {
        (**self).enqueue(job, priority, dedup_key)
    }

    fn is_in_flight(&self, key: &str) -> bool {
        (**self).is_in_flight(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_values() {
        assert_eq!(Priority::UnitReaction.value(), 1);
        assert_eq!(Priority::GlobalReaction.value(), 5);
        assert_eq!(Priority::Dispatch.value(), 9);
        assert!(Priority::UnitReaction < Priority::Dispatch);
    }
}
