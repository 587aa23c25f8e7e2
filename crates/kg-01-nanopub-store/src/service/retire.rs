//! Retirement with derivation cascade and blob cleanup.

use std::collections::{BTreeSet, HashSet, VecDeque};

use shared_types::vocab::{np, prov, rdf, whyis};
use shared_types::{Iri, QuadPattern, QuadSource, Term};

use super::NanopubManager;
use crate::domain::errors::NanopubResult;
use crate::domain::identity::IdentityAllocator;
use crate::domain::nanopub::{Part, RetireReport};
use crate::ports::outbound::{BlobDepot, QuadStore, TimeSource};

/// Everything a retirement removes, resolved before any mutation.
#[derive(Debug, Default)]
pub(crate) struct RetirePlan {
    pub units: Vec<Iri>,
    pub graphs: Vec<Term>,
    pub files: Vec<String>,
}

impl<QS, BD, IA, TS> NanopubManager<QS, BD, IA, TS>
where
    QS: QuadStore,
    BD: BlobDepot,
    IA: IdentityAllocator,
    TS: TimeSource,
{
    /// Retire `uris` and their derivation closure without edit checks.
    pub(crate) fn retire_unchecked(&self, uris: &[Iri]) -> NanopubResult<RetireReport> {
        let plan = self.plan_retirement(uris)?;
        if plan.units.is_empty() {
            return Ok(RetireReport::default());
        }

        let mut removed = 0;
        for graph in &plan.graphs {
            removed += self.store.remove_graph(graph)?;
        }
        let report = self.finish_retirement(plan)?;
        tracing::info!(
            requested = uris.len(),
            retired = report.retired.len(),
            quads = removed,
            deleted_files = report.deleted_files.len(),
            "[kg-01] Retirement committed"
        );
        Ok(report)
    }

    /// Resolve what retiring `uris` would remove. Reads only.
    pub(crate) fn plan_retirement(&self, uris: &[Iri]) -> NanopubResult<RetirePlan> {
        let units = self.resolve_cascade(uris)?;
        let mut graphs = BTreeSet::new();
        for unit in &units {
            graphs.extend(self.unit_graphs(unit)?);
        }

        // references from inside the set do not keep a blob alive
        let retiring: HashSet<Term> = graphs.iter().cloned().collect();
        let mut files = Vec::new();
        for unit in &units {
            for file_id in self.attached_files(unit)? {
                if !files.contains(&file_id) && !self.referenced_outside(&file_id, &retiring)? {
                    files.push(file_id);
                }
            }
        }
        Ok(RetirePlan {
            units,
            graphs: graphs.into_iter().collect(),
            files,
        })
    }

    /// Delete the plan's orphaned blobs and commit. Its graphs must already
    /// be gone from the store.
    pub(crate) fn finish_retirement(&self, plan: RetirePlan) -> NanopubResult<RetireReport> {
        let mut report = RetireReport::default();
        for file_id in plan.files {
            if self.depot.exists(&file_id)? {
                self.depot.delete(&file_id)?;
                report.deleted_files.push(file_id);
            }
        }
        for unit in plan.units {
            tracing::debug!(nanopub = %unit, "[kg-01] Retired");
            report.retired.push(unit);
        }
        self.store.commit()?;
        Ok(report)
    }

    /// The roots plus every live unit whose assertion reaches a root's
    /// assertion through `prov:wasDerivedFrom` edges.
    fn resolve_cascade(&self, roots: &[Iri]) -> NanopubResult<Vec<Iri>> {
        let derived_from = Iri::new(prov::WAS_DERIVED_FROM);
        let has_assertion = Iri::new(np::HAS_ASSERTION);

        let mut candidates: Vec<Iri> = Vec::new();
        let mut seen_assertions: HashSet<Term> = HashSet::new();
        let mut frontier: VecDeque<Term> = VecDeque::new();

        for root in roots {
            if !candidates.contains(root) {
                candidates.push(root.clone());
            }
            for assertion in self.store.objects_of(&Term::Iri(root.clone()), &has_assertion)? {
                if seen_assertions.insert(assertion.clone()) {
                    frontier.push_back(assertion);
                }
            }
        }

        while let Some(source) = frontier.pop_front() {
            for derived in self.store.subjects_of(&derived_from, &source)? {
                if !derived.is_resource() || !seen_assertions.insert(derived.clone()) {
                    continue;
                }
                for owner in self.store.subjects_of(&has_assertion, &derived)? {
                    if let Term::Iri(owner) = owner {
                        if !candidates.contains(&owner) {
                            candidates.push(owner);
                        }
                    }
                }
                frontier.push_back(derived);
            }
        }

        let mut units = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !self.is_live(&candidate)? {
                continue;
            }
            if !self.config.delete_archive_nanopubs && self.is_archive(&candidate)? {
                tracing::debug!(nanopub = %candidate, "[kg-01] Keeping archive nanopublication");
                continue;
            }
            units.push(candidate);
        }
        Ok(units)
    }

    fn is_archive(&self, uri: &Iri) -> NanopubResult<bool> {
        let pattern = QuadPattern::any()
            .subject(uri.clone())
            .predicate(Iri::new(rdf::TYPE))
            .object(Term::iri(whyis::FRIR_NANOPUBLICATION));
        Ok(QuadSource::contains(&self.store, &pattern)?)
    }

    /// Head graph plus whatever part graphs the head links.
    fn unit_graphs(&self, uri: &Iri) -> NanopubResult<BTreeSet<Term>> {
        let head = Term::Iri(uri.clone());
        let mut graphs = BTreeSet::new();
        for part in Part::ALL {
            graphs.extend(
                self.store
                    .objects_of(&head, &part.link())?
                    .into_iter()
                    .filter(Term::is_resource),
            );
        }
        graphs.insert(head);
        Ok(graphs)
    }

    /// File ids recorded in the unit's assertion graphs.
    fn attached_files(&self, uri: &Iri) -> NanopubResult<Vec<String>> {
        let head = Term::Iri(uri.clone());
        let mut ids = Vec::new();
        for assertion in self.store.objects_of(&head, &Iri::new(np::HAS_ASSERTION))? {
            let pattern = QuadPattern::any()
                .predicate(Iri::new(whyis::HAS_FILE_ID))
                .graph(assertion);
            for quad in self.store.match_quads(&pattern)? {
                if let Term::Literal(id) = quad.object {
                    let id = id.lexical().to_string();
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
        Ok(ids)
    }

    fn referenced_outside(&self, file_id: &str, retiring: &HashSet<Term>) -> NanopubResult<bool> {
        let pattern = QuadPattern::any()
            .predicate(Iri::new(whyis::HAS_FILE_ID))
            .object(Term::string(file_id));
        Ok(self
            .store
            .match_quads(&pattern)?
            .iter()
            .any(|quad| !retiring.contains(&quad.graph)))
    }
}
