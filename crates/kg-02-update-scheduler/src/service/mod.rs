//! # Update Scheduler
//!
//! Turns publish notifications into deferred inference and import work.
//!
//! ## Architecture
//!
//! ```text
//! publish ──on_publish──→ Update (9) ──┬─→ ProcessNanopub (1)   per-unit inferencers
//!                                      └─→ ProcessResource (5)  global inferencers, single-flight
//!
//! periodic task ──select──→ RunTask ──resolve_entity──→ RunImporter (gated, retried)
//! ```
//!
//! Every job re-checks that the unit it refers to is still current when it
//! executes; stale jobs complete as `Skipped(NotCurrent)`.

mod dispatch;
mod import;
mod tasks;
mod worker;

use std::sync::Arc;

use kg_01_nanopub_store::{NanopubStoreApi, QuadStore};
use shared_bus::{EnqueueOutcome, InMemoryJobQueue, JobQueue};
use shared_types::{QuadPattern, QuadSource, Quad, SourceError};

use crate::domain::config::SchedulerConfig;
use crate::domain::errors::{SchedulerError, SchedulerResult, ServiceError};
use crate::domain::jobs::{Job, JobOutcome};
use crate::domain::services::ServiceRegistry;
use crate::ports::outbound::{CounterStore, QueueListener};

/// Read view over the whole quad store.
pub(crate) struct StoreSource<'a>(pub &'a dyn QuadStore);

impl QuadSource for StoreSource<'_> {
    fn match_quads(&self, pattern: &QuadPattern) -> Result<Vec<Quad>, SourceError> {
        self.0.match_quads(pattern)
    }
}

/// Dependencies for UpdateScheduler
pub struct SchedulerDependencies {
    pub manager: Arc<dyn NanopubStoreApi>,
    pub store: Arc<dyn QuadStore>,
    pub queue: InMemoryJobQueue<Job>,
    pub counters: Arc<dyn CounterStore>,
}

/// The Update Scheduler.
pub struct UpdateScheduler {
    /// Store API used to read units and publish results.
    pub(crate) manager: Arc<dyn NanopubStoreApi>,
    /// Whole-store reads for global inferencers, tasks and importers.
    pub(crate) store: Arc<dyn QuadStore>,
    /// Shared job queue.
    pub(crate) queue: InMemoryJobQueue<Job>,
    /// Import gate counters.
    pub(crate) counters: Arc<dyn CounterStore>,
    /// Registered services.
    pub(crate) registry: ServiceRegistry,
    /// Scheduler configuration.
    pub(crate) config: SchedulerConfig,
}

impl UpdateScheduler {
    pub fn new(deps: SchedulerDependencies, registry: ServiceRegistry, config: SchedulerConfig) -> Self {
        tracing::info!(
            workers = config.worker_count,
            max_retries = config.retry.max_retries,
            registry = ?registry,
            "[kg-02] Update scheduler ready"
        );
        Self {
            manager: deps.manager,
            store: deps.store,
            queue: deps.queue,
            counters: deps.counters,
            registry,
            config,
        }
    }

    /// The shared job queue.
    pub fn queue(&self) -> &InMemoryJobQueue<Job> {
        &self.queue
    }

    /// A listener feeding this scheduler's queue.
    pub fn listener(&self) -> QueueListener {
        QueueListener::new(self.queue.clone())
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Execute one job. Errors are logged and reported as `Failed`.
    pub async fn execute(&self, job: &Job) -> JobOutcome {
        let result = match job {
            Job::Update { uri } => self.on_update(uri),
            Job::ProcessNanopub { uri, service } => self.process_nanopub(uri, service),
            Job::ProcessResource { service, trigger } => self.process_resource(service, trigger),
            Job::RunTask { task, uri } => self.run_task(task, uri).await,
            Job::RunImporter { entity } => self.run_importer(entity).await,
        };
        match result {
            Ok(outcome) => {
                tracing::debug!(job = job.kind(), outcome = ?outcome, "[kg-02] Job finished");
                outcome
            }
            Err(e) => {
                tracing::error!(job = ?job, error = %e, "[kg-02] Job failed");
                JobOutcome::Failed(e.to_string())
            }
        }
    }

    /// Enqueue a job at its own priority and dedup key.
    pub(crate) fn submit(&self, job: Job) -> SchedulerResult<EnqueueOutcome> {
        let priority = job.priority();
        let key = job.dedup_key();
        Ok(self.queue.enqueue(job, priority, key)?)
    }
}

/// Attach the service name to a service failure.
pub(crate) fn service_error(service: &str) -> impl FnOnce(ServiceError) -> SchedulerError + '_ {
    move |source| SchedulerError::Service {
        service: service.to_string(),
        source,
    }
}
