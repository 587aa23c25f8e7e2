//! # Node Runtime Library
//!
//! Exposes the container and runtime for the binary and the integration
//! test suite. The main entry point is the `main.rs` binary.

pub mod container;
pub mod logging;
pub mod runtime;

pub use container::{NodeConfig, NodeContainer};
pub use runtime::NodeRuntime;
