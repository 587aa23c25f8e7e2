//! # In-Memory Job Queue
//!
//! Priority queue shared by a pool of worker tasks.
//!
//! ## Semantics
//!
//! - Lower `Priority::value()` is served first, FIFO within a tier.
//! - A dedup key is held from `enqueue` until the `JobLease` handed to the
//!   worker is dropped, so a keyed job is single-flight across pending and
//!   executing states.
//! - `close()` wakes every waiting worker; `next()` then drains what is left
//!   and returns `None`.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::debug;

use crate::queue::{EnqueueOutcome, JobQueue, Priority, QueueError};

struct Entry<T> {
    priority: Priority,
    seq: u64,
    key: Option<String>,
    job: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // BinaryHeap is a max-heap: invert so the lowest tier and oldest seq pop first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .value()
            .cmp(&self.priority.value())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct State<T> {
    heap: BinaryHeap<Entry<T>>,
    keys: HashSet<String>,
    next_seq: u64,
    executing: usize,
    closed: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    notify: Notify,
}

/// In-memory implementation of the job queue.
///
/// Cloning yields another handle to the same queue.
pub struct InMemoryJobQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for InMemoryJobQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> InMemoryJobQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    heap: BinaryHeap::new(),
                    keys: HashSet::new(),
                    next_seq: 0,
                    executing: 0,
                    closed: false,
                }),
                notify: Notify::new(),
            }),
        }
    }

    /// Take the next job without waiting.
    pub fn try_next(&self) -> Option<JobLease<T>> {
        let mut state = self.shared.state.lock();
        let entry = state.heap.pop()?;
        state.executing += 1;
        Some(JobLease {
            job: entry.job,
            priority: entry.priority,
            key: entry.key,
            shared: self.shared.clone(),
        })
    }

    /// Wait for the next job. Returns `None` once the queue is closed and
    /// drained.
    pub async fn next(&self) -> Option<JobLease<T>> {
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(lease) = self.try_next() {
                return Some(lease);
            }
            if self.shared.state.lock().closed {
                return None;
            }
            notified.await;
        }
    }

    /// Stop accepting jobs and wake all waiting workers.
    pub fn close(&self) {
        self.shared.state.lock().closed = true;
        self.shared.notify.notify_waiters();
        debug!("Job queue closed");
    }

    /// Returns true once `close()` has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Number of jobs waiting to run.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().heap.len()
    }

    /// Number of leases currently held by workers.
    pub fn executing(&self) -> usize {
        self.shared.state.lock().executing
    }

    /// Returns true if nothing is pending or executing.
    pub fn is_idle(&self) -> bool {
        let state = self.shared.state.lock();
        state.heap.is_empty() && state.executing == 0
    }
}

impl<T> Default for InMemoryJobQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> JobQueue<T> for InMemoryJobQueue<T> {
    fn enqueue(
        &self,
        job: T,
        priority: Priority,
        dedup_key: Option<String>,
    ) -> Result<EnqueueOutcome, QueueError> {
        {
            let mut state = self.shared.state.lock();
            if state.closed {
                return Err(QueueError::Closed);
            }
            if let Some(key) = &dedup_key {
                if !state.keys.insert(key.clone()) {
                    debug!(key = %key, "Job deduplicated");
                    return Ok(EnqueueOutcome::Deduplicated);
                }
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.heap.push(Entry {
                priority,
                seq,
                key: dedup_key,
                job,
            });
        }
        self.shared.notify.notify_one();
        Ok(EnqueueOutcome::Accepted)
    }

    fn is_in_flight(&self, key: &str) -> bool {
        self.shared.state.lock().keys.contains(key)
    }
}

/// A job handed to a worker.
///
/// When dropped, the job's dedup key is released and the executing count
/// decremented, including when the worker panics.
pub struct JobLease<T> {
    job: T,
    priority: Priority,
    key: Option<String>,
    shared: Arc<Shared<T>>,
}

impl<T> JobLease<T> {
    /// The job payload.
    pub fn job(&self) -> &T {
        &self.job
    }

    /// Tier the job was queued at.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Dedup key, if any.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl<T> Drop for JobLease<T> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.executing = state.executing.saturating_sub(1);
        if let Some(key) = self.key.take() {
            state.keys.remove(&key);
            debug!(key = %key, "Job key released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_lower_tier_first_fifo_within_tier() {
        let queue: InMemoryJobQueue<&str> = InMemoryJobQueue::new();
        queue.enqueue("dispatch", Priority::Dispatch, None).unwrap();
        queue.enqueue("unit-a", Priority::UnitReaction, None).unwrap();
        queue.enqueue("global", Priority::GlobalReaction, None).unwrap();
        queue.enqueue("unit-b", Priority::UnitReaction, None).unwrap();

        let order: Vec<_> = std::iter::from_fn(|| queue.try_next().map(|l| *l.job())).collect();
        assert_eq!(order, vec!["unit-a", "unit-b", "global", "dispatch"]);
    }

    #[test]
    fn test_dedup_while_pending_and_executing() {
        let queue: InMemoryJobQueue<u32> = InMemoryJobQueue::new();
        let key = Some("global:svc".to_string());
        assert_eq!(
            queue.enqueue(1, Priority::GlobalReaction, key.clone()).unwrap(),
            EnqueueOutcome::Accepted
        );
        assert_eq!(
            queue.enqueue(2, Priority::GlobalReaction, key.clone()).unwrap(),
            EnqueueOutcome::Deduplicated
        );
        assert!(queue.is_in_flight("global:svc"));

        let lease = queue.try_next().unwrap();
        assert_eq!(*lease.job(), 1);
        // still executing
        assert_eq!(
            queue.enqueue(3, Priority::GlobalReaction, key.clone()).unwrap(),
            EnqueueOutcome::Deduplicated
        );
        drop(lease);

        assert!(!queue.is_in_flight("global:svc"));
        assert_eq!(
            queue.enqueue(4, Priority::GlobalReaction, key).unwrap(),
            EnqueueOutcome::Accepted
        );
        assert!(queue.try_next().is_some());
        assert!(queue.try_next().is_none());
    }

    #[test]
    fn test_enqueue_after_close_fails() {
        let queue: InMemoryJobQueue<()> = InMemoryJobQueue::new();
        queue.close();
        assert_eq!(
            queue.enqueue((), Priority::Dispatch, None),
            Err(QueueError::Closed)
        );
    }

    #[test]
    fn test_idle_tracking() {
        let queue: InMemoryJobQueue<u32> = InMemoryJobQueue::new();
        assert!(queue.is_idle());
        queue.enqueue(1, Priority::Dispatch, None).unwrap();
        assert!(!queue.is_idle());
        let lease = queue.try_next().unwrap();
        assert_eq!(queue.executing(), 1);
        assert!(!queue.is_idle());
        drop(lease);
        assert!(queue.is_idle());
    }

    #[tokio::test]
    async fn test_next_wakes_on_enqueue() {
        let queue: InMemoryJobQueue<u32> = InMemoryJobQueue::new();
        let worker = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.next().await.map(|l| *l.job()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.enqueue(7, Priority::Dispatch, None).unwrap();
        let got = tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, Some(7));
    }

    #[tokio::test]
    async fn test_close_releases_waiting_workers() {
        let queue: InMemoryJobQueue<u32> = InMemoryJobQueue::new();
        let worker = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.next().await.is_none() })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.close();
        let finished = tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .unwrap()
            .unwrap();
        assert!(finished);
    }
}
