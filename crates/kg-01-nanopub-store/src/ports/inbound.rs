//! # Inbound Ports (Driving Ports)
//!
//! The primary API of the nanopublication store. The update scheduler,
//! inferencers, importers and web layers all go through this trait.

use shared_types::{CallerContext, Dataset, Iri};

use crate::domain::errors::NanopubResult;
use crate::domain::files::{Attachment, FileUpload, UploadKind};
use crate::domain::nanopub::{
    NanopubBatch, Nanopublication, PublishReport, Publishable, RetireReport,
};

/// Primary API for the nanopublication store.
///
/// Implementations must keep every live unit well-formed: one head, three
/// suffixed parts, `rdf:type np:Nanopublication` in the head.
pub trait NanopubStoreApi: Send + Sync {
    /// Allocate a fresh, empty unit. No store interaction.
    fn new_nanopub(&self) -> Nanopublication;

    /// Normalize a candidate dataset into units.
    ///
    /// Loose graphs are adopted into newly minted units; blank heads and
    /// parts get stable identifiers.
    ///
    /// ## Errors
    ///
    /// - `Malformed`: a head links a part with a literal
    fn prepare(&self, candidate: Dataset) -> NanopubResult<NanopubBatch>;

    /// Publish units atomically.
    ///
    /// ## Atomicity
    ///
    /// Superseded units are retired and the new units bulk-loaded from one
    /// staging artifact. Any error before or during the load aborts the
    /// batch and no listener is notified.
    ///
    /// ## Errors
    ///
    /// - `Unauthorized`: caller may not revise a targeted unit
    /// - `InvalidDataUrl`: inline content could not be decoded
    /// - `Store` / `Depot`: adapter failures
    fn publish(&self, ctx: &CallerContext, items: Vec<Publishable>) -> NanopubResult<PublishReport>;

    /// Retire units and everything derived from them. Idempotent.
    ///
    /// ## Errors
    ///
    /// - `Unauthorized`: caller may not edit one of `uris`
    fn retire(&self, ctx: &CallerContext, uris: &[Iri]) -> NanopubResult<RetireReport>;

    /// Read a unit's head and part graphs, into `into` if given.
    fn get(&self, uri: &Iri, into: Option<Dataset>) -> NanopubResult<Nanopublication>;

    /// True iff the store still types `uri` as a nanopublication.
    fn is_current(&self, uri: &Iri) -> NanopubResult<bool>;

    /// Store an upload and describe it in `nanopub`'s assertion.
    ///
    /// Returns the new file id and the live units that already hold a file
    /// for `entity`; the caller supersedes them.
    fn attach_file(
        &self,
        ctx: &CallerContext,
        nanopub: &mut Nanopublication,
        entity: &Iri,
        upload: &FileUpload,
    ) -> NanopubResult<Attachment>;

    /// Retire every live unit attaching a file to `entity`.
    fn delete_file(&self, ctx: &CallerContext, entity: &Iri) -> NanopubResult<RetireReport>;

    /// Attach uploads to `entity` in a new unit and publish it, revising any
    /// previous attachments.
    fn upload_files(
        &self,
        ctx: &CallerContext,
        entity: &Iri,
        uploads: Vec<FileUpload>,
        kind: UploadKind,
    ) -> NanopubResult<PublishReport>;
}
