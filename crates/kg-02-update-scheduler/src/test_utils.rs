//! Shared fixtures for scheduler tests in this crate and downstream crates.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kg_01_nanopub_store::test_utils::{ex, fixed_now, test_config, TestManager};
use kg_01_nanopub_store::{
    FixedTimeSource, InMemoryBlobDepot, InMemoryQuadStore, NanopubDependencies, NanopubManager,
    NanopubResult, NanopubStoreApi, Part, QuadStore, SequentialAllocator,
};
use parking_lot::Mutex;
use shared_bus::InMemoryJobQueue;
use shared_types::{CallerContext, Iri, Literal, QuadPattern, QuadSource, Term};

use crate::domain::config::{RetryPolicy, SchedulerConfig};
use crate::domain::errors::ServiceError;
use crate::domain::jobs::Job;
use crate::domain::services::{InferenceContext, Importer, Inferencer, ServiceRegistry, TriggerKind};
use crate::ports::outbound::{InMemoryCounterStore, QueueListener};
use crate::service::{SchedulerDependencies, UpdateScheduler};

/// A scheduler wired to an in-memory manager whose publishes feed its queue.
pub struct SchedulerHarness {
    pub scheduler: Arc<UpdateScheduler>,
    pub manager: Arc<TestManager>,
    pub store: Arc<InMemoryQuadStore>,
    pub clock: Arc<FixedTimeSource>,
    pub counters: Arc<InMemoryCounterStore>,
    pub queue: InMemoryJobQueue<Job>,
}

impl SchedulerHarness {
    /// Publish one unit asserting `ex:s ex:p ex:o` as the agent.
    pub fn publish(&self, triples: &[(&str, &str, &str)]) -> NanopubResult<Iri> {
        let mut nanopub = self.manager.new_nanopub();
        for (s, p, o) in triples {
            nanopub.add(Part::Assertion, ex(s), ex(p), ex(o));
        }
        let id = nanopub.identifier().clone();
        self.manager
            .publish(&CallerContext::agent(), vec![nanopub.into()])?;
        Ok(id)
    }
}

/// Two workers, immediate retries, two of them.
pub fn test_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        worker_count: 2,
        retry: RetryPolicy::immediate(2),
        ..SchedulerConfig::default()
    }
}

pub fn make_test_scheduler(registry: ServiceRegistry, config: SchedulerConfig) -> SchedulerHarness {
    let queue: InMemoryJobQueue<Job> = InMemoryJobQueue::new();
    let store = Arc::new(InMemoryQuadStore::new());
    let clock = Arc::new(FixedTimeSource::new(fixed_now()));
    let counters = Arc::new(InMemoryCounterStore::new());

    let manager = Arc::new(NanopubManager::new(
        NanopubDependencies {
            store: store.clone(),
            depot: Arc::new(InMemoryBlobDepot::new()),
            allocator: SequentialAllocator::new(),
            time_source: clock.clone(),
            listener: Arc::new(QueueListener::new(queue.clone())),
        },
        test_config(),
    ));
    let deps = SchedulerDependencies {
        manager: manager.clone(),
        store: store.clone(),
        queue: queue.clone(),
        counters: counters.clone(),
    };
    SchedulerHarness {
        scheduler: Arc::new(UpdateScheduler::new(deps, registry, config)),
        manager,
        store,
        clock,
        counters,
        queue,
    }
}

// =============================================================================
// Stub services
// =============================================================================

/// Selects subjects of `ex:<predicate>` and records every processed instance.
pub struct RecordingInferencer {
    name: String,
    trigger: TriggerKind,
    predicate: Iri,
    processed: Mutex<Vec<(Term, Option<Iri>)>>,
}

impl RecordingInferencer {
    pub fn new(name: &str, trigger: TriggerKind, predicate: &str) -> Self {
        Self {
            name: name.to_string(),
            trigger,
            predicate: ex(predicate),
            processed: Mutex::new(Vec::new()),
        }
    }

    /// Instances processed so far, with the trigger each saw.
    pub fn processed(&self) -> Vec<(Term, Option<Iri>)> {
        self.processed.lock().clone()
    }
}

impl Inferencer for RecordingInferencer {
    fn name(&self) -> &str {
        &self.name
    }

    fn trigger(&self) -> TriggerKind {
        self.trigger
    }

    fn select_instances(&self, source: &dyn QuadSource) -> Result<BTreeSet<Term>, ServiceError> {
        Ok(source
            .match_quads(&QuadPattern::any().predicate(self.predicate.clone()))?
            .into_iter()
            .map(|quad| quad.subject)
            .collect())
    }

    fn process(&self, _source: &dyn QuadSource, ctx: &InferenceContext<'_>) -> Result<(), ServiceError> {
        self.processed
            .lock()
            .push((ctx.instance.clone(), ctx.trigger.clone()));
        Ok(())
    }
}

/// Importer for every IRI under `http://ex.org/remote/`.
///
/// A load publishes `<entity> ex:loadedAt <remote time>`; `last_modified`
/// reads that statement back. The first `failures` loads fail; a `slow`
/// importer sleeps inside every load.
pub struct StubImporter {
    remote: Option<DateTime<Utc>>,
    aliases: Vec<(Iri, Iri)>,
    once: bool,
    delay: Option<Duration>,
    failures: Mutex<u32>,
    attempts: Mutex<u32>,
    loads: Mutex<u32>,
}

impl StubImporter {
    pub const PREFIX: &'static str = "http://ex.org/remote/";

    pub fn new(remote: Option<DateTime<Utc>>) -> Self {
        Self {
            remote,
            aliases: Vec::new(),
            once: false,
            delay: None,
            failures: Mutex::new(0),
            attempts: Mutex::new(0),
            loads: Mutex::new(0),
        }
    }

    pub fn failing(mut self, failures: u32) -> Self {
        self.failures = Mutex::new(failures);
        self
    }

    pub fn with_alias(mut self, alias: Iri, canonical: Iri) -> Self {
        self.aliases.push((alias, canonical));
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Each load waits this long before succeeding or failing.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls to `load`, failed ones included.
    pub fn attempts(&self) -> u32 {
        *self.attempts.lock()
    }

    /// Successful loads.
    pub fn loads(&self) -> u32 {
        *self.loads.lock()
    }

    fn loaded_at() -> Iri {
        ex("loadedAt")
    }
}

#[async_trait]
impl Importer for StubImporter {
    fn name(&self) -> &str {
        "stub-importer"
    }

    fn handles(&self, entity: &Iri) -> bool {
        entity.starts_with(Self::PREFIX)
    }

    fn map_entity(&self, entity: &Iri) -> Option<Iri> {
        self.aliases
            .iter()
            .find(|(alias, _)| alias == entity)
            .map(|(_, canonical)| canonical.clone())
    }

    fn last_modified(
        &self,
        entity: &Iri,
        store: &dyn QuadSource,
    ) -> Result<Option<DateTime<Utc>>, ServiceError> {
        Ok(store
            .objects_of(&Term::Iri(entity.clone()), &Self::loaded_at())?
            .into_iter()
            .filter_map(|term| term.as_literal().and_then(Literal::as_date_time))
            .max())
    }

    async fn remote_modified(&self, _entity: &Iri) -> Result<Option<DateTime<Utc>>, ServiceError> {
        Ok(self.remote)
    }

    fn import_once(&self) -> bool {
        self.once
    }

    async fn load(
        &self,
        entity: &Iri,
        _store: &dyn QuadStore,
        manager: &dyn NanopubStoreApi,
    ) -> Result<(), ServiceError> {
        *self.attempts.lock() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        {
            let mut failures = self.failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(ServiceError::Failed(format!("remote unavailable: {}", entity)));
            }
        }

        let mut nanopub = manager.new_nanopub();
        nanopub.add(
            Part::Assertion,
            entity.clone(),
            Self::loaded_at(),
            Literal::date_time(self.remote.unwrap_or_else(fixed_now)),
        );
        manager.publish(&CallerContext::agent(), vec![nanopub.into()])?;
        *self.loads.lock() += 1;
        Ok(())
    }
}
