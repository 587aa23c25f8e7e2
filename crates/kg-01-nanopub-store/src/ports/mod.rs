//! # Ports Layer
//!
//! Defines the port traits for the nanopublication store.
//!
//! ## Hexagonal Architecture
//!
//! - `inbound.rs` - Driving ports (API exposed to the scheduler and web layers)
//! - `outbound.rs` - Driven ports (quad store, blob depot, listener, clock)

pub mod inbound;
pub mod outbound;
