//! # Outbound Ports (Driven Ports)
//!
//! The shared counter store behind the import gate, plus in-process adapters.

use std::collections::HashMap;

use kg_01_nanopub_store::UpdateListener;
use parking_lot::Mutex;
use shared_bus::{InMemoryJobQueue, JobQueue};
use shared_types::Iri;

use crate::domain::jobs::Job;

/// Atomic integer counters shared by every worker.
///
/// Production: a key-value server behind an adapter in the node runtime.
/// Testing: `InMemoryCounterStore` (below).
pub trait CounterStore: Send + Sync {
    /// Increment and return the new value. Missing keys start at zero.
    fn incr(&self, key: &str) -> i64;

    /// Set the counter to zero.
    fn reset(&self, key: &str);

    /// Current value, zero if missing.
    fn get(&self, key: &str) -> i64;
}

impl<T: CounterStore + ?Sized> CounterStore for std::sync::Arc<T> {
    fn incr(&self, key: &str) -> i64 {
        (**self).incr(key)
    }

    fn reset(&self, key: &str) {
        (**self).reset(key)
    }

    fn get(&self, key: &str) -> i64 {
        (**self).get(key)
    }
}

// =============================================================================
// ADAPTER IMPLEMENTATIONS
// Testing and single-node: in-memory implementations below
// =============================================================================

/// In-memory counters.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: Mutex<HashMap<String, i64>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently counted.
    pub fn len(&self) -> usize {
        self.counters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.lock().is_empty()
    }
}

impl CounterStore for InMemoryCounterStore {
    fn incr(&self, key: &str) -> i64 {
        let mut counters = self.counters.lock();
        let value = counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        *value
    }

    fn reset(&self, key: &str) {
        self.counters.lock().remove(key);
    }

    fn get(&self, key: &str) -> i64 {
        self.counters.lock().get(key).copied().unwrap_or(0)
    }
}

/// Update listener that enqueues an `Update` job per published unit.
#[derive(Clone)]
pub struct QueueListener {
    queue: InMemoryJobQueue<Job>,
}

impl QueueListener {
    pub fn new(queue: InMemoryJobQueue<Job>) -> Self {
        Self { queue }
    }
}

impl UpdateListener for QueueListener {
    fn on_publish(&self, nanopub: &Iri) {
        let job = Job::Update {
            uri: nanopub.clone(),
        };
        let priority = job.priority();
        if let Err(e) = self.queue.enqueue(job, priority, None) {
            tracing::warn!(nanopub = %nanopub, error = %e, "[kg-02] Dropped update notification");
        }
    }
}
