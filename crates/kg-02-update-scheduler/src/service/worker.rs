//! Worker pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::UpdateScheduler;
use crate::domain::jobs::{Job, JobOutcome};

impl UpdateScheduler {
    /// Spawn `worker_count` workers pulling from the shared queue.
    pub fn spawn_workers(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        (0..self.config.worker_count.max(1))
            .map(|id| tokio::spawn(Arc::clone(self).run_worker(id)))
            .collect()
    }

    /// Execute jobs until the queue is closed and drained.
    pub async fn run_worker(self: Arc<Self>, id: usize) {
        tracing::info!(worker = id, "[kg-02] Worker started");
        while let Some(lease) = self.queue.next().await {
            let outcome = self.execute(lease.job()).await;
            if let JobOutcome::Failed(reason) = &outcome {
                tracing::warn!(worker = id, job = lease.job().kind(), reason = %reason, "[kg-02] Job did not complete");
            }
        }
        tracing::info!(worker = id, "[kg-02] Worker stopped");
    }

    /// Execute queued jobs on the current task until nothing is pending,
    /// including jobs queued along the way. Returns each job with its outcome
    /// in execution order.
    pub async fn run_until_idle(&self) -> Vec<(Job, JobOutcome)> {
        let mut executed = Vec::new();
        while let Some(lease) = self.queue.try_next() {
            let outcome = self.execute(lease.job()).await;
            executed.push((lease.job().clone(), outcome));
        }
        executed
    }

    /// Wait until nothing is pending or executing.
    pub async fn wait_idle(&self, poll: Duration) {
        while !self.queue.is_idle() {
            tokio::time::sleep(poll).await;
        }
    }

    /// Stop accepting jobs. Follow-up work submitted afterwards is rejected,
    /// so call `wait_idle` first for a clean drain. Workers finish what is queued, then exit.
    pub fn shutdown(&self) {
        tracing::info!(pending = self.queue.pending(), "[kg-02] Shutting down scheduler");
        self.queue.close();
    }
}
