//! # Shared Bus - Priority Job Queue
//!
//! Carries follow-up work from the nanopublication store to background
//! workers.
//!
//! ## Dispatch Model
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Scheduler   │                    │   Worker N   │
//! │              │    enqueue()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Job Queue   │          │
//!                  │ (by tier)    │ ─────────┘
//!                  └──────────────┘   next() -> JobLease
//! ```
//!
//! ## Single-Flight
//!
//! - A job may carry a dedup key. While a job holding that key is pending or
//!   executing, further jobs with the same key are dropped
//!   (`EnqueueOutcome::Deduplicated`). The first job is never cancelled.
//! - The key is released when the worker drops its `JobLease`.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod memory;
pub mod queue;

pub use memory::{InMemoryJobQueue, JobLease};
pub use queue::{EnqueueOutcome, JobQueue, Priority, QueueError};
