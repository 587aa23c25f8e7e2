//! Reading units back out of the store.

use shared_types::vocab::{np, rdf};
use shared_types::{Dataset, Iri, QuadPattern, QuadSource, Term};

use super::NanopubManager;
use crate::domain::errors::NanopubResult;
use crate::domain::identity::IdentityAllocator;
use crate::domain::nanopub::{Nanopublication, Part};
use crate::domain::skolem::unskolemize_quad;
use crate::ports::outbound::{BlobDepot, QuadStore, TimeSource};

impl<QS, BD, IA, TS> NanopubManager<QS, BD, IA, TS>
where
    QS: QuadStore,
    BD: BlobDepot,
    IA: IdentityAllocator,
    TS: TimeSource,
{
    pub(crate) fn read_unit(&self, uri: &Iri, into: Option<Dataset>) -> NanopubResult<Nanopublication> {
        let head = Term::Iri(uri.clone());
        let mut graphs = vec![head.clone()];
        for part in Part::ALL {
            for target in self.store.objects_of(&head, &part.link())? {
                if target.is_resource() && !graphs.contains(&target) {
                    graphs.push(target);
                }
            }
        }

        let mut dataset = into.unwrap_or_default();
        for graph in graphs {
            for quad in self.store.match_quads(&QuadPattern::any().graph(graph))? {
                let quad = if self.config.bnode_rewrite {
                    unskolemize_quad(quad)
                } else {
                    quad
                };
                dataset.insert(quad);
            }
        }
        Nanopublication::from_dataset(uri.clone(), dataset)
    }

    pub(crate) fn is_live(&self, uri: &Iri) -> NanopubResult<bool> {
        let pattern = QuadPattern::any()
            .subject(uri.clone())
            .predicate(Iri::new(rdf::TYPE))
            .object(Term::iri(np::NANOPUBLICATION));
        Ok(QuadSource::contains(&self.store, &pattern)?)
    }
}
