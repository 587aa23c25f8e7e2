//! # Shared Types Crate
//!
//! RDF data model shared by the nanopublication store, the update scheduler
//! and the node runtime.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: terms, quads and datasets are defined once
//!   here; stores and inferencers never invent their own representation.
//! - **Named Graphs Only**: every quad lives in a named graph (IRI or blank
//!   node). There is no default graph.
//! - **Explicit Identity**: callers are identified by a `CallerContext`
//!   passed into each mutating operation.

pub mod context;
pub mod dataset;
pub mod errors;
pub mod nquads;
pub mod source;
pub mod term;
pub mod vocab;

pub use context::{Caller, CallerContext, Role};
pub use dataset::Dataset;
pub use errors::*;
pub use source::QuadSource;
pub use term::{BlankId, Iri, Literal, Quad, QuadPattern, Term};
