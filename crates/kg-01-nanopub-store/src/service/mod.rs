//! # Nanopublication Manager
//!
//! The main service implementing the store API.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `NanopubStoreApi` for the full unit lifecycle
//! 2. Keeps every live unit well-formed (head + three suffixed parts)
//! 3. Notifies the update listener once per published unit, after commit
//! 4. Uses dependency injection for all external dependencies

mod auth;
mod files;
mod publish;
mod read;
mod retire;
mod staging;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use shared_types::{CallerContext, Dataset, Iri};

use crate::domain::config::ManagerConfig;
use crate::domain::errors::NanopubResult;
use crate::domain::files::{Attachment, FileUpload, UploadKind};
use crate::domain::identity::IdentityAllocator;
use crate::domain::nanopub::{
    NanopubBatch, Nanopublication, PublishReport, Publishable, RetireReport,
};
use crate::domain::prepare;
use crate::ports::inbound::NanopubStoreApi;
use crate::ports::outbound::{BlobDepot, QuadStore, TimeSource, UpdateListener};

/// The Nanopublication Manager.
pub struct NanopubManager<QS, BD, IA, TS>
where
    QS: QuadStore,
    BD: BlobDepot,
    IA: IdentityAllocator,
    TS: TimeSource,
{
    /// Named-graph quad store.
    pub(crate) store: QS,
    /// Binary file store.
    pub(crate) depot: BD,
    /// Identifier source for new units.
    pub(crate) allocator: IA,
    /// Clock for `dc:created`, `dc:modified` and `prov:invalidatedAtTime`.
    pub(crate) time_source: TS,
    /// Receives one call per published unit.
    pub(crate) listener: Arc<dyn UpdateListener>,
    /// Service configuration.
    pub(crate) config: ManagerConfig,
}

/// Dependencies for NanopubManager
pub struct NanopubDependencies<QS, BD, IA, TS> {
    pub store: QS,
    pub depot: BD,
    pub allocator: IA,
    pub time_source: TS,
    pub listener: Arc<dyn UpdateListener>,
}

impl<QS, BD, IA, TS> NanopubManager<QS, BD, IA, TS>
where
    QS: QuadStore,
    BD: BlobDepot,
    IA: IdentityAllocator,
    TS: TimeSource,
{
    /// Create a manager with the given dependencies.
    pub fn new(deps: NanopubDependencies<QS, BD, IA, TS>, config: ManagerConfig) -> Self {
        tracing::info!(
            lod_prefix = %config.lod_prefix,
            bnode_rewrite = config.bnode_rewrite,
            delete_archive_nanopubs = config.delete_archive_nanopubs,
            "[kg-01] Nanopublication manager ready"
        );
        Self {
            store: deps.store,
            depot: deps.depot,
            allocator: deps.allocator,
            time_source: deps.time_source,
            listener: deps.listener,
            config,
        }
    }

    /// The underlying quad store.
    pub fn store(&self) -> &QS {
        &self.store
    }

    /// The underlying blob depot.
    pub fn depot(&self) -> &BD {
        &self.depot
    }

    /// Active configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Mint a fresh unit identifier.
    pub(crate) fn mint(&self) -> Iri {
        Iri::new(format!("{}{}", self.config.pub_prefix(), self.allocator.allocate()))
    }
}

impl<QS, BD, IA, TS> NanopubStoreApi for NanopubManager<QS, BD, IA, TS>
where
    QS: QuadStore,
    BD: BlobDepot,
    IA: IdentityAllocator,
    TS: TimeSource,
{
    fn new_nanopub(&self) -> Nanopublication {
        Nanopublication::empty(self.mint())
    }

    fn prepare(&self, candidate: Dataset) -> NanopubResult<NanopubBatch> {
        let units = prepare::normalize(candidate, || self.mint())?;
        tracing::debug!(units = units.len(), "[kg-01] Prepared batch");
        Ok(NanopubBatch::new(units))
    }

    fn publish(&self, ctx: &CallerContext, items: Vec<Publishable>) -> NanopubResult<PublishReport> {
        self.publish_items(ctx, items)
    }

    fn retire(&self, ctx: &CallerContext, uris: &[Iri]) -> NanopubResult<RetireReport> {
        for uri in uris {
            self.authorize(ctx, uri)?;
        }
        self.retire_unchecked(uris)
    }

    fn get(&self, uri: &Iri, into: Option<Dataset>) -> NanopubResult<Nanopublication> {
        self.read_unit(uri, into)
    }

    fn is_current(&self, uri: &Iri) -> NanopubResult<bool> {
        self.is_live(uri)
    }

    fn attach_file(
        &self,
        ctx: &CallerContext,
        nanopub: &mut Nanopublication,
        entity: &Iri,
        upload: &FileUpload,
    ) -> NanopubResult<Attachment> {
        self.attach(ctx, nanopub, entity, upload)
    }

    fn delete_file(&self, ctx: &CallerContext, entity: &Iri) -> NanopubResult<RetireReport> {
        self.delete_attachments(ctx, entity)
    }

    fn upload_files(
        &self,
        ctx: &CallerContext,
        entity: &Iri,
        uploads: Vec<FileUpload>,
        kind: UploadKind,
    ) -> NanopubResult<PublishReport> {
        self.upload(ctx, entity, uploads, kind)
    }
}
