//! Reactions to published units.

use shared_bus::{EnqueueOutcome, JobQueue};
use shared_types::{CallerContext, Iri, QuadSource};

use super::{service_error, StoreSource, UpdateScheduler};
use crate::domain::errors::{SchedulerError, SchedulerResult};
use crate::domain::jobs::{global_key, Job, JobOutcome, SkipReason};
use crate::domain::services::{InferenceContext, Inferencer, TriggerKind};

impl UpdateScheduler {
    /// Fan out reactions to a newly published unit.
    pub(crate) fn on_update(&self, uri: &Iri) -> SchedulerResult<JobOutcome> {
        if !self.manager.is_current(uri)? {
            tracing::debug!(nanopub = %uri, "[kg-02] Skipping retired nanopublication");
            return Ok(JobOutcome::Skipped(SkipReason::NotCurrent));
        }
        let assertion = self.manager.get(uri, None)?.assertion();

        let mut unit_jobs = 0;
        for inferencer in self.registry.triggered_by(TriggerKind::Unit) {
            let instances = inferencer
                .select_instances(&assertion)
                .map_err(service_error(inferencer.name()))?;
            if instances.is_empty() {
                continue;
            }
            tracing::debug!(
                service = inferencer.name(),
                nanopub = %uri,
                instances = instances.len(),
                "[kg-02] Invoking unit inferencer"
            );
            self.submit(Job::ProcessNanopub {
                uri: uri.clone(),
                service: inferencer.name().to_string(),
            })?;
            unit_jobs += 1;
        }

        let mut global_jobs = 0;
        for inferencer in self.registry.triggered_by(TriggerKind::Global) {
            if self.queue.is_in_flight(&global_key(inferencer.name())) {
                continue;
            }
            let outcome = self.submit(Job::ProcessResource {
                service: inferencer.name().to_string(),
                trigger: uri.clone(),
            })?;
            if outcome == EnqueueOutcome::Accepted {
                global_jobs += 1;
            }
        }

        tracing::info!(
            nanopub = %uri,
            unit_jobs,
            global_jobs,
            "[kg-02] Dispatched update"
        );
        Ok(JobOutcome::Completed)
    }

    /// Run a unit-triggered inferencer over one unit's assertion.
    pub(crate) fn process_nanopub(&self, uri: &Iri, service: &str) -> SchedulerResult<JobOutcome> {
        let inferencer = self
            .registry
            .inferencer(service)
            .ok_or_else(|| SchedulerError::UnknownService(service.to_string()))?;
        if !self.manager.is_current(uri)? {
            tracing::debug!(nanopub = %uri, service, "[kg-02] Skipping retired nanopublication");
            return Ok(JobOutcome::Skipped(SkipReason::NotCurrent));
        }
        let assertion = self.manager.get(uri, None)?.assertion();
        self.process_graph(inferencer.as_ref(), &assertion, Some(uri))?;
        Ok(JobOutcome::Completed)
    }

    /// Run a global inferencer over the whole store.
    pub(crate) fn process_resource(&self, service: &str, trigger: &Iri) -> SchedulerResult<JobOutcome> {
        let inferencer = self
            .registry
            .inferencer(service)
            .ok_or_else(|| SchedulerError::UnknownService(service.to_string()))?;
        if !self.manager.is_current(trigger)? {
            tracing::debug!(trigger = %trigger, service, "[kg-02] Trigger retired; skipping global run");
            return Ok(JobOutcome::Skipped(SkipReason::NotCurrent));
        }
        let source = StoreSource(self.store.as_ref());
        self.process_graph(inferencer.as_ref(), &source, Some(trigger))?;
        Ok(JobOutcome::Completed)
    }

    /// Select instances in `source` and process each one.
    pub(crate) fn process_graph(
        &self,
        inferencer: &dyn Inferencer,
        source: &dyn QuadSource,
        trigger: Option<&Iri>,
    ) -> SchedulerResult<usize> {
        let instances = inferencer
            .select_instances(source)
            .map_err(service_error(inferencer.name()))?;
        let count = instances.len();
        for instance in instances {
            let ctx = InferenceContext {
                instance,
                trigger: trigger.cloned(),
                manager: self.manager.as_ref(),
                caller: CallerContext::agent(),
            };
            inferencer
                .process(source, &ctx)
                .map_err(service_error(inferencer.name()))?;
        }
        tracing::debug!(service = inferencer.name(), instances = count, "[kg-02] Processed graph");
        Ok(count)
    }
}
