//! # Imports
//!
//! Entity resolution and the gated, retried importer run.

use std::sync::Arc;

use chrono::Utc;
use shared_types::Iri;

use super::{StoreSource, UpdateScheduler};
use crate::domain::errors::{SchedulerError, SchedulerResult, ServiceError};
use crate::domain::jobs::{Job, JobOutcome, SkipReason};
use crate::domain::services::Importer;
use crate::ports::outbound::CounterStore;

/// Resets the import counter when dropped, on every exit path.
struct ImportGate {
    counters: Arc<dyn CounterStore>,
    key: String,
}

impl Drop for ImportGate {
    fn drop(&mut self) {
        self.counters.reset(&self.key);
    }
}

impl UpdateScheduler {
    /// Map `entity` through alias-declaring importers and make sure it is
    /// loaded. Returns the canonical entity IRI.
    ///
    /// With no local copy, or when `asynchronous` is false, the import runs
    /// inline. Otherwise a background refresh is queued unless the importer
    /// loads only once.
    pub async fn resolve_entity(&self, entity: &Iri, asynchronous: bool) -> SchedulerResult<Iri> {
        let (entity, importer) = match self.registry.map_entity(entity) {
            Some((mapped, importer)) => (mapped, Some(importer)),
            None => (entity.clone(), None),
        };
        let Some(importer) = importer.or_else(|| self.registry.find_importer(&entity)) else {
            return Ok(entity);
        };

        let modified = importer
            .last_modified(&entity, &StoreSource(self.store.as_ref()))
            .map_err(super::service_error(importer.name()))?;
        if modified.is_none() || !asynchronous {
            match self.run_importer(&entity).await? {
                JobOutcome::Failed(reason) => {
                    tracing::warn!(entity = %entity, reason = %reason, "[kg-02] Inline import failed")
                }
                outcome => tracing::debug!(entity = %entity, outcome = ?outcome, "[kg-02] Inline import"),
            }
        } else if !importer.import_once() {
            self.submit(Job::RunImporter {
                entity: entity.clone(),
            })?;
        }
        Ok(entity)
    }

    /// Import `entity` unless another import of it is in progress.
    ///
    /// The whole attempt is retried with exponential backoff and full jitter
    /// up to `retry.max_retries` times.
    pub async fn run_importer(&self, entity: &Iri) -> SchedulerResult<JobOutcome> {
        let key = self.config.import_key(entity.as_str());
        if self.counters.incr(&key) > 1 {
            tracing::debug!(entity = %entity, "[kg-02] Import already in progress");
            return Ok(JobOutcome::Skipped(SkipReason::ImportInProgress));
        }
        let _gate = ImportGate {
            counters: Arc::clone(&self.counters),
            key,
        };

        let Some(importer) = self.registry.find_importer(entity) else {
            return Ok(JobOutcome::Skipped(SkipReason::NoImporter));
        };

        let retry = &self.config.retry;
        let mut attempt = 0;
        loop {
            match self.import_once(importer.as_ref(), entity).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt >= retry.max_retries => {
                    tracing::error!(
                        entity = %entity,
                        importer = importer.name(),
                        attempts = attempt + 1,
                        error = %e,
                        "[kg-02] Import failed"
                    );
                    return Err(SchedulerError::RetriesExhausted {
                        entity: entity.clone(),
                        attempts: attempt + 1,
                        last: e.to_string(),
                    });
                }
                Err(e) => {
                    let delay = retry.delay(attempt, &mut rand::thread_rng());
                    tracing::warn!(
                        entity = %entity,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "[kg-02] Import attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn import_once(&self, importer: &dyn Importer, entity: &Iri) -> Result<JobOutcome, ServiceError> {
        let local = importer.last_modified(entity, &StoreSource(self.store.as_ref()))?;
        let remote = importer
            .remote_modified(entity)
            .await?
            .unwrap_or_else(Utc::now);

        let stale = match local {
            None => true,
            Some(local) => remote - local > importer.min_modified_interval(),
        };
        if !stale {
            return Ok(JobOutcome::Skipped(SkipReason::UpToDate));
        }

        tracing::info!(entity = %entity, importer = importer.name(), "[kg-02] Importing");
        importer
            .load(entity, self.store.as_ref(), self.manager.as_ref())
            .await?;
        Ok(JobOutcome::Completed)
    }
}
