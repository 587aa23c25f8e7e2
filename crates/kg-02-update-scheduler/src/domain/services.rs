//! # Service Contracts
//!
//! Inferencers react to changes in the graph; importers bring remote
//! entities into it. Both are registered once at startup in a
//! `ServiceRegistry`.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kg_01_nanopub_store::{NanopubStoreApi, QuadStore};
use shared_types::{CallerContext, Iri, QuadSource, Term};

use crate::domain::errors::ServiceError;

/// When an inferencer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    /// Against the assertion of each newly published unit.
    Unit,
    /// Against the whole store, once per change burst.
    Global,
}

/// What an inferencer sees when processing one instance.
pub struct InferenceContext<'a> {
    /// The selected instance.
    pub instance: Term,
    /// Unit whose publication triggered this run, if any.
    pub trigger: Option<Iri>,
    /// Where results are published.
    pub manager: &'a dyn NanopubStoreApi,
    /// Identity results are published under.
    pub caller: CallerContext,
}

/// A graph-reactive service.
pub trait Inferencer: Send + Sync {
    /// Registry name; unique per registry.
    fn name(&self) -> &str;

    fn trigger(&self) -> TriggerKind;

    /// Instances this inferencer would process in `source`.
    fn select_instances(&self, source: &dyn QuadSource) -> Result<BTreeSet<Term>, ServiceError>;

    /// Process one instance, publishing any results through `ctx.manager`.
    fn process(&self, source: &dyn QuadSource, ctx: &InferenceContext<'_>) -> Result<(), ServiceError>;
}

/// Brings remote entities into the store.
#[async_trait]
pub trait Importer: Send + Sync {
    fn name(&self) -> &str;

    /// True if this importer loads `entity`.
    fn handles(&self, entity: &Iri) -> bool;

    /// Rewrite an alias to the canonical entity IRI, if this importer
    /// declares one for `entity`.
    fn map_entity(&self, _entity: &Iri) -> Option<Iri> {
        None
    }

    /// When the local copy was last loaded, if ever.
    fn last_modified(
        &self,
        entity: &Iri,
        store: &dyn QuadSource,
    ) -> Result<Option<DateTime<Utc>>, ServiceError>;

    /// When the remote copy last changed. `None` when unknown.
    async fn remote_modified(&self, entity: &Iri) -> Result<Option<DateTime<Utc>>, ServiceError>;

    /// Remote must be newer than local by more than this to reload.
    fn min_modified_interval(&self) -> chrono::Duration {
        chrono::Duration::zero()
    }

    /// Once loaded, never refresh in the background.
    fn import_once(&self) -> bool {
        false
    }

    /// Fetch and publish the entity.
    async fn load(
        &self,
        entity: &Iri,
        store: &dyn QuadStore,
        manager: &dyn NanopubStoreApi,
    ) -> Result<(), ServiceError>;
}

/// How often a periodic task selects instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSchedule {
    /// At a fixed interval, first run after one interval.
    Every(Duration),
    /// Once, at startup.
    Once,
}

/// A periodic task: select instances from the whole store and process each
/// with the task's inferencer.
#[derive(Clone)]
pub struct ScheduledTask {
    pub name: String,
    pub schedule: TaskSchedule,
    pub service: Arc<dyn Inferencer>,
}

impl ScheduledTask {
    pub fn new(name: impl Into<String>, schedule: TaskSchedule, service: Arc<dyn Inferencer>) -> Self {
        Self {
            name: name.into(),
            schedule,
            service,
        }
    }
}

/// Every service known to the scheduler, in registration order.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    inferencers: Vec<Arc<dyn Inferencer>>,
    importers: Vec<Arc<dyn Importer>>,
    tasks: Vec<ScheduledTask>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an inferencer. A later one with the same name is ignored.
    pub fn with_inferencer(mut self, inferencer: Arc<dyn Inferencer>) -> Self {
        if self.inferencer(inferencer.name()).is_some() {
            tracing::warn!(service = inferencer.name(), "[kg-02] Duplicate inferencer ignored");
            return self;
        }
        self.inferencers.push(inferencer);
        self
    }

    pub fn with_importer(mut self, importer: Arc<dyn Importer>) -> Self {
        self.importers.push(importer);
        self
    }

    pub fn with_task(mut self, task: ScheduledTask) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn inferencer(&self, name: &str) -> Option<&Arc<dyn Inferencer>> {
        self.inferencers.iter().find(|i| i.name() == name)
    }

    pub fn inferencers(&self) -> impl Iterator<Item = &Arc<dyn Inferencer>> {
        self.inferencers.iter()
    }

    /// Inferencers with the given trigger, in registration order.
    pub fn triggered_by(&self, kind: TriggerKind) -> impl Iterator<Item = &Arc<dyn Inferencer>> {
        self.inferencers.iter().filter(move |i| i.trigger() == kind)
    }

    pub fn importers(&self) -> &[Arc<dyn Importer>] {
        &self.importers
    }

    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    pub fn task(&self, name: &str) -> Option<&ScheduledTask> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// First importer declaring an alias for `entity`, with the mapped IRI.
    pub fn map_entity(&self, entity: &Iri) -> Option<(Iri, Arc<dyn Importer>)> {
        self.importers
            .iter()
            .find_map(|imp| imp.map_entity(entity).map(|mapped| (mapped, Arc::clone(imp))))
    }

    /// First importer handling `entity`.
    pub fn find_importer(&self, entity: &Iri) -> Option<Arc<dyn Importer>> {
        self.importers.iter().find(|imp| imp.handles(entity)).cloned()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("inferencers", &self.inferencers.iter().map(|i| i.name()).collect::<Vec<_>>())
            .field("importers", &self.importers.iter().map(|i| i.name()).collect::<Vec<_>>())
            .field("tasks", &self.tasks.iter().map(|t| t.name.as_str()).collect::<Vec<_>>())
            .finish()
    }
}
