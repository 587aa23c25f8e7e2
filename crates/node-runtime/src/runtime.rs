//! # Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration and build the container
//! 2. Spawn the worker pool
//! 3. Start periodic tasks
//!
//! ## Shutdown Sequence
//!
//! 1. Signal periodic tasks to stop
//! 2. Wait for the queue to go idle, follow-up jobs included
//! 3. Close the job queue and wait for every task to exit
//!
//! Both waits are bounded by `SHUTDOWN_TIMEOUT`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::container::{ContainerError, NodeConfig, NodeContainer};

/// Upper bound on each shutdown wait.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

const IDLE_POLL: Duration = Duration::from_millis(20);

/// The main node runtime orchestrating store and scheduler.
pub struct NodeRuntime {
    /// Container with all initialized services.
    container: Arc<NodeContainer>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
    /// Workers and periodic tasks.
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Result<Self, ContainerError> {
        Ok(Self::from_container(NodeContainer::new(config)?))
    }

    pub fn from_container(container: NodeContainer) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container: Arc::new(container),
            shutdown_tx,
            shutdown_rx,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn workers and periodic tasks.
    pub fn start(&self) {
        let config = &self.container.config;
        info!("===========================================");
        info!("  Nanograph Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");
        info!(
            lod_prefix = %config.manager.lod_prefix,
            workers = config.scheduler.worker_count,
            rules = config.rules.len(),
            "Starting node"
        );

        let scheduler = &self.container.scheduler;
        let mut handles = scheduler.spawn_workers();
        handles.extend(scheduler.start_tasks(self.shutdown_rx.clone()));
        self.handles.lock().extend(handles);

        info!("Node is running");
    }

    /// Stop tasks, drain the queue and wait for workers.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        let scheduler = &self.container.scheduler;
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, scheduler.wait_idle(IDLE_POLL))
            .await
            .is_err()
        {
            warn!(
                pending = scheduler.queue().pending(),
                "Queue still busy at shutdown; closing anyway"
            );
        }
        scheduler.shutdown();

        let handles = std::mem::take(&mut *self.handles.lock());
        let joined = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
            for handle in handles {
                if let Err(e) = handle.await {
                    error!("Task ended abnormally: {}", e);
                }
            }
        })
        .await;
        if joined.is_err() {
            warn!("Shutdown timed out waiting for tasks");
        }

        info!("Shutdown complete");
    }

    /// Get a reference to the service container.
    pub fn container(&self) -> Arc<NodeContainer> {
        Arc::clone(&self.container)
    }
}
