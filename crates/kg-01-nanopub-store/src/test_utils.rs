//! Shared fixtures for manager tests in this crate and downstream crates.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use shared_types::vocab::prov;
use shared_types::{Iri, Term};

use crate::domain::config::ManagerConfig;
use crate::domain::identity::SequentialAllocator;
use crate::domain::nanopub::{Nanopublication, Part};
use crate::ports::outbound::{
    FixedTimeSource, InMemoryBlobDepot, InMemoryQuadStore, RecordingListener,
};
use crate::service::{NanopubDependencies, NanopubManager};

/// Prefix for every fixture IRI.
pub const EX: &str = "http://ex.org/";

/// Manager wired to in-memory adapters and a deterministic allocator.
pub type TestManager = NanopubManager<
    Arc<InMemoryQuadStore>,
    Arc<InMemoryBlobDepot>,
    SequentialAllocator,
    Arc<FixedTimeSource>,
>;

/// A test manager plus handles on its adapters.
pub struct TestHarness {
    pub manager: TestManager,
    pub store: Arc<InMemoryQuadStore>,
    pub depot: Arc<InMemoryBlobDepot>,
    pub clock: Arc<FixedTimeSource>,
    pub listener: Arc<RecordingListener>,
}

/// `http://ex.org/<local>`.
pub fn ex(local: &str) -> Iri {
    Iri::new(format!("{}{}", EX, local))
}

/// Instant the fixture clock starts at.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Config minting `http://ex.org/pub/npN` identifiers.
pub fn test_config() -> ManagerConfig {
    ManagerConfig {
        lod_prefix: EX.trim_end_matches('/').to_string(),
        ..ManagerConfig::default()
    }
}

pub fn make_test_manager(config: ManagerConfig) -> TestHarness {
    let store = Arc::new(InMemoryQuadStore::new());
    let depot = Arc::new(InMemoryBlobDepot::new());
    let clock = Arc::new(FixedTimeSource::new(fixed_now()));
    let listener = Arc::new(RecordingListener::new());
    let deps = NanopubDependencies {
        store: store.clone(),
        depot: depot.clone(),
        allocator: SequentialAllocator::new(),
        time_source: clock.clone(),
        listener: listener.clone(),
    };
    TestHarness {
        manager: NanopubManager::new(deps, config),
        store,
        depot,
        clock,
        listener,
    }
}

/// Add `ex:s ex:p ex:o` statements to a unit's assertion.
pub fn assert_triples(nanopub: &mut Nanopublication, triples: &[(&str, &str, &str)]) {
    for (s, p, o) in triples {
        nanopub.add(Part::Assertion, ex(s), ex(p), ex(o));
    }
}

/// Record in `nanopub`'s provenance that its assertion derives from
/// `source`'s assertion.
pub fn derive_from(nanopub: &mut Nanopublication, source: &Nanopublication) {
    let assertion = Term::Iri(nanopub.assertion_id().clone());
    nanopub.add(
        Part::Provenance,
        assertion,
        Iri::new(prov::WAS_DERIVED_FROM),
        source.assertion_id().clone(),
    );
}

/// Record in `nanopub`'s pubinfo that its assertion revises `prior`'s.
pub fn revise(nanopub: &mut Nanopublication, prior: &Nanopublication) {
    let assertion = Term::Iri(nanopub.assertion_id().clone());
    nanopub.add(
        Part::PublicationInfo,
        assertion,
        Iri::new(prov::WAS_REVISION_OF),
        prior.assertion_id().clone(),
    );
}
