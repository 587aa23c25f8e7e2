//! # Jobs
//!
//! Units of deferred work and what became of them.

use shared_bus::Priority;
use shared_types::Iri;

/// Deferred work, pulled from the queue by workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Fan out reactions to a newly published unit.
    Update { uri: Iri },
    /// Run a unit-triggered inferencer over one unit.
    ProcessNanopub { uri: Iri, service: String },
    /// Run a global inferencer over the whole store.
    ProcessResource { service: String, trigger: Iri },
    /// Run a periodic task on one selected instance.
    RunTask { task: String, uri: Iri },
    /// Bring a remote entity up to date.
    RunImporter { entity: Iri },
}

impl Job {
    /// Dispatch tier the scheduler uses for this job.
    pub fn priority(&self) -> Priority {
        match self {
            Job::ProcessNanopub { .. } => Priority::UnitReaction,
            Job::ProcessResource { .. } => Priority::GlobalReaction,
            Job::Update { .. } => Priority::Dispatch,
            Job::RunTask { .. } | Job::RunImporter { .. } => Priority::GlobalReaction,
        }
    }

    /// Single-flight key, if this job kind is deduplicated.
    pub fn dedup_key(&self) -> Option<String> {
        match self {
            Job::ProcessResource { service, .. } => Some(global_key(service)),
            _ => None,
        }
    }

    /// Short kind label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Job::Update { .. } => "update",
            Job::ProcessNanopub { .. } => "process_nanopub",
            Job::ProcessResource { .. } => "process_resource",
            Job::RunTask { .. } => "run_task",
            Job::RunImporter { .. } => "run_importer",
        }
    }
}

/// Single-flight key for a global inferencer.
pub fn global_key(service: &str) -> String {
    format!("global:{}", service)
}

/// Why a job did nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The unit the job refers to was retired.
    NotCurrent,
    /// Another import of the same entity holds the gate.
    ImportInProgress,
    /// No importer handles the entity.
    NoImporter,
    /// The local copy is recent enough.
    UpToDate,
}

/// Result of executing one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Skipped(SkipReason),
    Failed(String),
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed)
    }
}
