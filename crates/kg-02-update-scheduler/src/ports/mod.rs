//! # Ports Layer
//!
//! - `outbound.rs` - Driven ports (shared counters) and the listener adapter
//!   that feeds publish notifications into the job queue

pub mod outbound;
