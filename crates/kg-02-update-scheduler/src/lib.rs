//! # Update Scheduler (kg-02)
//!
//! Keeps derived knowledge in step with the nanopublication store. Each
//! publish becomes an `Update` job; workers fan it out to inferencers, and
//! periodic tasks pull remote entities in through importers.
//!
//! ## Job Tiers
//!
//! | Job | Tier | Single-flight |
//! |-----|------|---------------|
//! | `ProcessNanopub` | 1 (unit reaction) | no |
//! | `ProcessResource` | 5 (global reaction) | per service |
//! | `RunTask`, `RunImporter` | 5 | import gate per entity |
//! | `Update` | 9 (dispatch) | no |
//!
//! ## Guarantees
//!
//! - A job referring to a retired unit does nothing.
//! - At most one global run per inferencer is pending or executing.
//! - At most one import per entity runs at a time; the gate is released on
//!   every exit path.
//!
//! ## Usage
//!
//! ```ignore
//! let scheduler = Arc::new(UpdateScheduler::new(deps, registry, SchedulerConfig::from_env()));
//! let workers = scheduler.spawn_workers();
//! let tasks = scheduler.start_tasks(shutdown_rx);
//! ```

pub mod domain;
pub mod ports;
pub mod service;
pub mod test_utils;

// Re-export key types for convenience
pub use domain::config::{RetryPolicy, SchedulerConfig, DEFAULT_IMPORT_KEY_PREFIX};
pub use domain::errors::{SchedulerError, SchedulerResult, ServiceError};
pub use domain::jobs::{Job, JobOutcome, SkipReason};
pub use domain::rules::{Consequent, RuleInferencer, Slot};
pub use domain::services::{
    Importer, InferenceContext, Inferencer, ScheduledTask, ServiceRegistry, TaskSchedule,
    TriggerKind,
};
pub use ports::outbound::{CounterStore, InMemoryCounterStore, QueueListener};
pub use service::{SchedulerDependencies, UpdateScheduler};
