//! Service construction and wiring.

use std::sync::Arc;

use kg_01_nanopub_store::{
    BlobDepot, DepotError, FileSystemBlobDepot, InMemoryBlobDepot, InMemoryQuadStore,
    NanopubDependencies, NanopubManager, SystemTimeSource, UuidAllocator,
};
use kg_02_update_scheduler::{
    InMemoryCounterStore, Job, QueueListener, RuleInferencer, SchedulerDependencies,
    ServiceRegistry, UpdateScheduler,
};
use shared_bus::InMemoryJobQueue;
use thiserror::Error;
use tracing::info;

use super::config::{ConfigError, NodeConfig};

/// The manager as deployed: in-memory quads, configurable blob depot.
pub type NodeManager =
    NanopubManager<Arc<InMemoryQuadStore>, Arc<dyn BlobDepot>, UuidAllocator, SystemTimeSource>;

/// Startup failures.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to open file archive: {0}")]
    Depot(#[from] DepotError),
}

/// Every long-lived service of a node.
pub struct NodeContainer {
    pub config: NodeConfig,
    pub store: Arc<InMemoryQuadStore>,
    pub manager: Arc<NodeManager>,
    pub scheduler: Arc<UpdateScheduler>,
    pub counters: Arc<InMemoryCounterStore>,
}

impl NodeContainer {
    /// Validate `config` and build the store and scheduler with the rules it
    /// names.
    pub fn new(config: NodeConfig) -> Result<Self, ContainerError> {
        let registry = Self::registry(&config);
        Self::with_registry(config, registry)
    }

    /// Build with an explicit service registry.
    pub fn with_registry(config: NodeConfig, registry: ServiceRegistry) -> Result<Self, ContainerError> {
        config.validate()?;

        let depot: Arc<dyn BlobDepot> = match &config.storage.file_archive {
            Some(root) => {
                info!(file_archive = %root.display(), "Using file archive");
                Arc::new(FileSystemBlobDepot::new(root)?)
            }
            None => {
                info!("No KG_FILE_ARCHIVE set, keeping files in memory");
                Arc::new(InMemoryBlobDepot::new())
            }
        };

        let queue: InMemoryJobQueue<Job> = InMemoryJobQueue::new();
        let store = Arc::new(InMemoryQuadStore::new());
        let counters = Arc::new(InMemoryCounterStore::new());

        let manager = Arc::new(NanopubManager::new(
            NanopubDependencies {
                store: Arc::clone(&store),
                depot,
                allocator: UuidAllocator,
                time_source: SystemTimeSource,
                listener: Arc::new(QueueListener::new(queue.clone())),
            },
            config.manager.clone(),
        ));

        let scheduler = Arc::new(UpdateScheduler::new(
            SchedulerDependencies {
                manager: manager.clone(),
                store: store.clone(),
                queue,
                counters: counters.clone(),
            },
            registry,
            config.scheduler.clone(),
        ));

        Ok(Self {
            config,
            store,
            manager,
            scheduler,
            counters,
        })
    }

    /// One unit-triggered rule inferencer per configured rename rule.
    fn registry(config: &NodeConfig) -> ServiceRegistry {
        config
            .rules
            .iter()
            .enumerate()
            .fold(ServiceRegistry::new(), |registry, (i, rule)| {
                registry.with_inferencer(Arc::new(RuleInferencer::rename(
                    format!("rule-{}", i + 1),
                    rule.antecedent.clone(),
                    rule.consequent.clone(),
                )))
            })
    }
}
