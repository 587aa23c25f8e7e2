//! Integration flows across the store, the scheduler and the node runtime.

pub mod e2e_pipeline;
pub mod flows;
