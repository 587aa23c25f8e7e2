//! # Nanograph Test Suite
//!
//! Cross-crate flows that no single crate can test on its own.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs          # Store + scheduler feedback loops
//!     └── e2e_pipeline.rs   # Full node: container, workers, tasks, shutdown
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p kg-tests
//! cargo test -p kg-tests integration::flows::
//! ```

pub mod integration;
