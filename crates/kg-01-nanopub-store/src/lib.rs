//! # Nanopublication Store (kg-01)
//!
//! The versioned store at the bottom of the knowledge graph. Every write is a
//! nanopublication: four named graphs sharing one identifier prefix.
//!
//! ```text
//! <id>             head: rdf:type np:Nanopublication, part links, part types
//! <id>_assertion   the statements themselves
//! <id>_provenance  how the assertion was derived
//! <id>_pubinfo     who published it, when, and what it revises
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Well-formed units | Every live unit has a head and three suffixed parts |
//! | 2 | No loose graphs | Graphs outside any unit are adopted before publish |
//! | 3 | Revision supersedes | A revised unit is retired and stamped invalidated |
//! | 4 | Cascading retirement | Retiring a unit retires everything derived from it |
//! | 5 | Atomic batches | One staged bulk load per publish, all or nothing |
//! | 6 | Notify after commit | One listener call per published unit, in order |
//! | 7 | Shared blobs survive | A file is deleted only when no live unit uses it |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Model, batch normalization, identity, skolemization, files
//! - `ports/` - Port traits (inbound API, outbound SPI) and in-memory adapters
//! - `service/` - `NanopubManager` implementing the API
//!
//! ## Usage
//!
//! ```ignore
//! use kg_01_nanopub_store::{NanopubManager, NanopubStoreApi, Publishable};
//!
//! let mut nanopub = manager.new_nanopub();
//! nanopub.add(Part::Assertion, alice, knows, bob);
//! let report = manager.publish(&CallerContext::agent(), vec![nanopub.into()])?;
//! ```

pub mod domain;
pub mod ports;
pub mod service;
pub mod test_utils;

// Re-export key types for convenience
pub use domain::config::ManagerConfig;
pub use domain::data_url::DataUrl;
pub use domain::errors::{DepotError, NanopubError, NanopubResult, StoreError};
pub use domain::files::{Attachment, FileUpload, PriorAttachment, UploadKind};
pub use domain::identity::{IdentityAllocator, SequentialAllocator, UuidAllocator};
pub use domain::nanopub::{
    NanopubBatch, Nanopublication, Part, PublishReport, Publishable, RetireReport,
};
pub use domain::skolem::Skolemizer;
pub use ports::inbound::NanopubStoreApi;
pub use ports::outbound::{
    BlobDepot, FileMeta, FileSystemBlobDepot, FixedTimeSource, InMemoryBlobDepot,
    InMemoryQuadStore, NoopListener, QuadStore, RecordingListener, SystemTimeSource, TimeSource,
    UpdateListener,
};
pub use service::{NanopubDependencies, NanopubManager};
