//! # Nanopublication Model
//!
//! A nanopublication is four named graphs sharing an identifier prefix:
//!
//! ```text
//! <id>             head: rdf:type np:Nanopublication, links to the parts
//! <id>_assertion   the factual statements
//! <id>_provenance  how the assertion was derived
//! <id>_pubinfo     statements about the act of publication
//! ```
//!
//! `Nanopublication` is a view: the identifier, the three part IRIs, and the
//! dataset holding their quads. Part IRIs are read from the head's
//! `np:hasAssertion`/`np:hasProvenance`/`np:hasPublicationInfo` links and
//! default to the fixed suffixes when a link is absent.

use shared_types::vocab::{np, rdf};
use shared_types::{Dataset, Iri, Quad, Term};

use crate::domain::errors::NanopubError;

/// Suffix of the assertion graph.
pub const ASSERTION_SUFFIX: &str = "_assertion";
/// Suffix of the provenance graph.
pub const PROVENANCE_SUFFIX: &str = "_provenance";
/// Suffix of the publication info graph.
pub const PUBINFO_SUFFIX: &str = "_pubinfo";

/// The three content parts of a nanopublication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Assertion,
    Provenance,
    PublicationInfo,
}

impl Part {
    /// All parts, in head-link order.
    pub const ALL: [Part; 3] = [Part::Assertion, Part::Provenance, Part::PublicationInfo];

    /// Fixed identifier suffix.
    pub fn suffix(&self) -> &'static str {
        match self {
            Part::Assertion => ASSERTION_SUFFIX,
            Part::Provenance => PROVENANCE_SUFFIX,
            Part::PublicationInfo => PUBINFO_SUFFIX,
        }
    }

    /// Head predicate linking to this part.
    pub fn link(&self) -> Iri {
        Iri::new(match self {
            Part::Assertion => np::HAS_ASSERTION,
            Part::Provenance => np::HAS_PROVENANCE,
            Part::PublicationInfo => np::HAS_PUBLICATION_INFO,
        })
    }

    /// Class the part graph is typed with in the head.
    pub fn class(&self) -> Iri {
        Iri::new(match self {
            Part::Assertion => np::ASSERTION,
            Part::Provenance => np::PROVENANCE,
            Part::PublicationInfo => np::PUBLICATION_INFO,
        })
    }
}

/// A nanopublication and the dataset holding its graphs.
#[derive(Debug, Clone)]
pub struct Nanopublication {
    identifier: Iri,
    assertion: Iri,
    provenance: Iri,
    pubinfo: Iri,
    dataset: Dataset,
}

impl Nanopublication {
    /// An empty unit with its head materialized.
    pub fn empty(identifier: Iri) -> Self {
        let mut nanopub = Self {
            assertion: identifier.with_suffix(ASSERTION_SUFFIX),
            provenance: identifier.with_suffix(PROVENANCE_SUFFIX),
            pubinfo: identifier.with_suffix(PUBINFO_SUFFIX),
            identifier,
            dataset: Dataset::new(),
        };
        nanopub.materialize_head();
        nanopub
    }

    /// View a unit stored in `dataset`.
    ///
    /// Part IRIs come from the head links; absent links are materialized with
    /// the default suffixes. A part link that is not an IRI is rejected.
    pub fn from_dataset(identifier: Iri, dataset: Dataset) -> Result<Self, NanopubError> {
        let head = Term::Iri(identifier.clone());
        let resolve = |part: Part| -> Result<Iri, NanopubError> {
            match dataset.value(&head, &part.link(), Some(&head)) {
                None => Ok(identifier.with_suffix(part.suffix())),
                Some(Term::Iri(iri)) => Ok(iri),
                Some(other) => Err(NanopubError::Malformed {
                    identifier: identifier.to_string(),
                    reason: format!("{} link is not an IRI: {}", part.suffix(), other),
                }),
            }
        };
        let assertion = resolve(Part::Assertion)?;
        let provenance = resolve(Part::Provenance)?;
        let pubinfo = resolve(Part::PublicationInfo)?;
        let mut nanopub = Self {
            identifier,
            assertion,
            provenance,
            pubinfo,
            dataset,
        };
        nanopub.materialize_head();
        Ok(nanopub)
    }

    /// Add the head type, part links and part types to the head graph.
    fn materialize_head(&mut self) {
        let head = Term::Iri(self.identifier.clone());
        self.dataset.add(
            head.clone(),
            Iri::new(rdf::TYPE),
            Term::iri(np::NANOPUBLICATION),
            head.clone(),
        );
        for part in Part::ALL {
            let part_iri = self.part_id(part).clone();
            self.dataset
                .add(head.clone(), part.link(), part_iri.clone(), head.clone());
            self.dataset
                .add(part_iri, Iri::new(rdf::TYPE), part.class(), head.clone());
        }
    }

    /// The unit's identifier.
    pub fn identifier(&self) -> &Iri {
        &self.identifier
    }

    /// Head identifier as a term (also the head graph name).
    pub fn head(&self) -> Term {
        Term::Iri(self.identifier.clone())
    }

    /// Assertion graph IRI.
    pub fn assertion_id(&self) -> &Iri {
        &self.assertion
    }

    /// Provenance graph IRI.
    pub fn provenance_id(&self) -> &Iri {
        &self.provenance
    }

    /// Publication info graph IRI.
    pub fn pubinfo_id(&self) -> &Iri {
        &self.pubinfo
    }

    /// IRI of one part.
    pub fn part_id(&self, part: Part) -> &Iri {
        match part {
            Part::Assertion => &self.assertion,
            Part::Provenance => &self.provenance,
            Part::PublicationInfo => &self.pubinfo,
        }
    }

    /// Head and the three part graph names.
    pub fn graph_ids(&self) -> [&Iri; 4] {
        [
            &self.identifier,
            &self.assertion,
            &self.provenance,
            &self.pubinfo,
        ]
    }

    /// Every quad of the unit.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Mutable access to every quad of the unit.
    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }

    /// Consume the view.
    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    /// Copy of one part graph.
    pub fn graph(&self, part: Part) -> Dataset {
        let name = Term::Iri(self.part_id(part).clone());
        self.dataset.graph(&name).into_iter().cloned().collect()
    }

    /// Copy of the assertion graph.
    pub fn assertion(&self) -> Dataset {
        self.graph(Part::Assertion)
    }

    /// Add a statement to a part graph.
    pub fn add(
        &mut self,
        part: Part,
        subject: impl Into<Term>,
        predicate: impl Into<Iri>,
        object: impl Into<Term>,
    ) -> bool {
        let graph = Term::Iri(self.part_id(part).clone());
        self.dataset.add(subject, predicate, object, graph)
    }

    /// Add a statement to the head graph.
    pub fn add_head(
        &mut self,
        subject: impl Into<Term>,
        predicate: impl Into<Iri>,
        object: impl Into<Term>,
    ) -> bool {
        let head = self.head();
        self.dataset.add(subject, predicate, object, head)
    }

    /// Replace the values of `(subject, predicate)` in one part graph.
    pub fn set(&mut self, part: Part, subject: &Term, predicate: &Iri, object: impl Into<Term>) {
        let graph = Term::Iri(self.part_id(part).clone());
        self.dataset.set(&graph, subject, predicate, object);
    }

    /// Objects of `subject predicate ?o` within one part graph.
    pub fn objects(&self, part: Part, subject: &Term, predicate: &Iri) -> Vec<Term> {
        let graph = Term::Iri(self.part_id(part).clone());
        self.dataset.objects(subject, predicate, Some(&graph))
    }

    /// Subjects of `?s predicate object` within one part graph.
    pub fn subjects(&self, part: Part, predicate: &Iri, object: &Term) -> Vec<Term> {
        let graph = Term::Iri(self.part_id(part).clone());
        self.dataset.subjects(predicate, object, Some(&graph))
    }

    /// Remove every `subject predicate ?o` from one part graph.
    pub fn remove_values(&mut self, part: Part, subject: &Term, predicate: &Iri) -> usize {
        let graph = Term::Iri(self.part_id(part).clone());
        self.dataset.remove_matching(
            &shared_types::QuadPattern::any()
                .graph(graph)
                .subject(subject.clone())
                .predicate(predicate.clone()),
        )
    }

    /// Quads of the unit in insertion order.
    pub fn quads(&self) -> impl Iterator<Item = &Quad> {
        self.dataset.iter()
    }
}

/// Output of `prepare`: the normalized units of one candidate dataset.
///
/// Iteration is restartable and yields units in discovery order.
#[derive(Debug, Clone, Default)]
pub struct NanopubBatch {
    units: Vec<Nanopublication>,
}

impl NanopubBatch {
    pub fn new(units: Vec<Nanopublication>) -> Self {
        Self { units }
    }

    /// Iterate without consuming the batch.
    pub fn iter(&self) -> std::slice::Iter<'_, Nanopublication> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Identifiers in discovery order.
    pub fn identifiers(&self) -> Vec<Iri> {
        self.units.iter().map(|n| n.identifier().clone()).collect()
    }
}

impl IntoIterator for NanopubBatch {
    type Item = Nanopublication;
    type IntoIter = std::vec::IntoIter<Nanopublication>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.into_iter()
    }
}

impl<'a> IntoIterator for &'a NanopubBatch {
    type Item = &'a Nanopublication;
    type IntoIter = std::slice::Iter<'a, Nanopublication>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

/// Input to `publish`.
#[derive(Debug, Clone)]
pub enum Publishable {
    /// An already-prepared unit.
    Nanopub(Nanopublication),
    /// A raw candidate dataset; expanded through `prepare`.
    Graph(Dataset),
}

impl From<Nanopublication> for Publishable {
    fn from(value: Nanopublication) -> Self {
        Publishable::Nanopub(value)
    }
}

impl From<Dataset> for Publishable {
    fn from(value: Dataset) -> Self {
        Publishable::Graph(value)
    }
}

/// Outcome of a publish call.
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    /// Units written, in processing order.
    pub published: Vec<Iri>,
    /// Units retired before the load (replacements, revisions, cascades).
    pub retired: Vec<Iri>,
    /// Blobs created from inline content.
    pub files_created: Vec<String>,
}

/// Outcome of a retire call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetireReport {
    /// Units whose graphs were removed, including cascades.
    pub retired: Vec<Iri>,
    /// Blobs deleted because no live unit referenced them any more.
    pub deleted_files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_materializes_head() {
        let np_iri = Iri::new("http://ex.org/pub/1");
        let nanopub = Nanopublication::empty(np_iri.clone());
        let head = nanopub.head();

        assert_eq!(nanopub.assertion_id().as_str(), "http://ex.org/pub/1_assertion");
        assert_eq!(nanopub.pubinfo_id().as_str(), "http://ex.org/pub/1_pubinfo");
        assert!(nanopub.dataset().contains(&Quad::new(
            head.clone(),
            Iri::new(rdf::TYPE),
            Term::iri(np::NANOPUBLICATION),
            head.clone(),
        )));
        assert!(nanopub.dataset().contains(&Quad::new(
            Term::iri("http://ex.org/pub/1_provenance"),
            Iri::new(rdf::TYPE),
            Term::iri(np::PROVENANCE),
            head,
        )));
        // 1 type + 3 links + 3 part types
        assert_eq!(nanopub.dataset().len(), 7);
    }

    #[test]
    fn test_from_dataset_honours_existing_links() {
        let id = Iri::new("http://ex.org/pub/2");
        let head = Term::Iri(id.clone());
        let mut ds = Dataset::new();
        ds.add(head.clone(), Iri::new(rdf::TYPE), Term::iri(np::NANOPUBLICATION), head.clone());
        ds.add(head.clone(), Iri::new(np::HAS_ASSERTION), Term::iri("http://ex.org/custom"), head);

        let nanopub = Nanopublication::from_dataset(id, ds).unwrap();
        assert_eq!(nanopub.assertion_id().as_str(), "http://ex.org/custom");
        assert_eq!(nanopub.provenance_id().as_str(), "http://ex.org/pub/2_provenance");
    }

    #[test]
    fn test_literal_part_link_rejected() {
        let id = Iri::new("http://ex.org/pub/3");
        let head = Term::Iri(id.clone());
        let mut ds = Dataset::new();
        ds.add(head.clone(), Iri::new(np::HAS_ASSERTION), Term::string("nope"), head);
        assert!(matches!(
            Nanopublication::from_dataset(id, ds),
            Err(NanopubError::Malformed { .. })
        ));
    }

    #[test]
    fn test_part_graph_copy() {
        let mut nanopub = Nanopublication::empty(Iri::new("http://ex.org/pub/4"));
        nanopub.add(
            Part::Assertion,
            Term::iri("http://ex.org/a"),
            Iri::new("http://ex.org/p"),
            Term::iri("http://ex.org/b"),
        );
        assert_eq!(nanopub.assertion().len(), 1);
        assert!(nanopub.graph(Part::Provenance).is_empty());
    }
}
