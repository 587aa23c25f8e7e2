//! # Node Container
//!
//! Holds the store, the scheduler and the adapters between them, built once
//! at startup.
//!
//! ```text
//! NanopubManager ──on_publish──→ QueueListener ──→ job queue ──→ UpdateScheduler workers
//!        ↑                                                              │
//!        └──────────────────────── publish (inferencers) ───────────────┘
//! ```

pub mod config;
pub mod services;

pub use config::{ConfigError, LoggingConfig, NodeConfig, RenameRule, StorageConfig};
pub use services::{ContainerError, NodeContainer, NodeManager};
