//! Periodic tasks.

use std::sync::Arc;

use shared_types::vocab::{np, rdf};
use shared_types::{CallerContext, Dataset, Iri, QuadPattern, QuadSource, Term};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{service_error, StoreSource, UpdateScheduler};
use crate::domain::errors::{SchedulerError, SchedulerResult};
use crate::domain::jobs::{Job, JobOutcome};
use crate::domain::services::{InferenceContext, TaskSchedule};

impl UpdateScheduler {
    /// Select a task's instances from the whole store and queue one
    /// `RunTask` per instance. Returns the number queued.
    pub fn find_instances(&self, task: &str) -> SchedulerResult<usize> {
        let scheduled = self
            .registry
            .task(task)
            .ok_or_else(|| SchedulerError::UnknownService(task.to_string()))?;
        let instances = scheduled
            .service
            .select_instances(&StoreSource(self.store.as_ref()))
            .map_err(service_error(&scheduled.name))?;

        let mut queued = 0;
        for instance in instances {
            let Term::Iri(uri) = instance else {
                continue;
            };
            self.submit(Job::RunTask {
                task: task.to_string(),
                uri,
            })?;
            queued += 1;
        }
        tracing::info!(task, instances = queued, "[kg-02] Task triggered");
        Ok(queued)
    }

    /// Resolve one instance and process its description.
    pub(crate) async fn run_task(&self, task: &str, uri: &Iri) -> SchedulerResult<JobOutcome> {
        let scheduled = self
            .registry
            .task(task)
            .ok_or_else(|| SchedulerError::UnknownService(task.to_string()))?
            .clone();
        tracing::debug!(task, uri = %uri, "[kg-02] Running task");

        let entity = self.resolve_entity(uri, true).await?;
        let description = self.description(&entity)?;
        let ctx = InferenceContext {
            instance: Term::Iri(entity),
            trigger: None,
            manager: self.manager.as_ref(),
            caller: CallerContext::agent(),
        };
        scheduled
            .service
            .process(&description, &ctx)
            .map_err(service_error(&scheduled.name))?;
        Ok(JobOutcome::Completed)
    }

    /// Statements about `entity` held in assertion graphs.
    pub fn description(&self, entity: &Iri) -> SchedulerResult<Dataset> {
        let rdf_type = Iri::new(rdf::TYPE);
        let assertion_class = Term::iri(np::ASSERTION);
        let mut description = Dataset::new();
        for quad in self.store.match_quads(&QuadPattern::any().subject(entity.clone()))? {
            let typed = QuadPattern::any()
                .subject(quad.graph.clone())
                .predicate(rdf_type.clone())
                .object(assertion_class.clone());
            if QuadSource::contains(self.store.as_ref(), &typed)? {
                description.insert(quad);
            }
        }
        Ok(description)
    }

    /// Start every registered task. `Once` tasks select immediately;
    /// `Every` tasks select on each interval tick until shutdown.
    pub fn start_tasks(self: &Arc<Self>, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        for task in self.registry.tasks() {
            match task.schedule {
                TaskSchedule::Once => {
                    if let Err(e) = self.find_instances(&task.name) {
                        tracing::error!(task = %task.name, error = %e, "[kg-02] Task selection failed");
                    }
                }
                TaskSchedule::Every(period) => {
                    let scheduler = Arc::clone(self);
                    let name = task.name.clone();
                    let mut shutdown = shutdown.clone();
                    handles.push(tokio::spawn(async move {
                        let mut ticker = tokio::time::interval(period);
                        ticker.tick().await;
                        loop {
                            tokio::select! {
                                _ = ticker.tick() => {
                                    if let Err(e) = scheduler.find_instances(&name) {
                                        tracing::error!(task = %name, error = %e, "[kg-02] Task selection failed");
                                    }
                                }
                                _ = shutdown.changed() => {
                                    tracing::info!(task = %name, "[kg-02] Shutdown signal received");
                                    break;
                                }
                            }
                        }
                    }));
                }
            }
        }
        handles
    }
}
