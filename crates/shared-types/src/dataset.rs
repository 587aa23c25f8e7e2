//! # In-Memory Dataset
//!
//! An insertion-ordered set of quads. Batches submitted for publication,
//! nanopublication views returned by the store, and the in-memory quad store
//! all sit on top of this type.
//!
//! ## Ordering
//!
//! Iteration order is insertion order. `graph_names()` reports graphs in the
//! order they were first seen, which is what makes head discovery in
//! `prepare` deterministic.

use std::collections::HashSet;

use crate::errors::SourceError;
use crate::source::QuadSource;
use crate::term::{Iri, Quad, QuadPattern, Term};

/// An ordered set of quads.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    quads: Vec<Quad>,
    index: HashSet<Quad>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of quads.
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    /// Returns true if the dataset holds no quads.
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Insert a quad. Returns false if it was already present.
    pub fn insert(&mut self, quad: Quad) -> bool {
        if self.index.contains(&quad) {
            return false;
        }
        self.index.insert(quad.clone());
        self.quads.push(quad);
        true
    }

    /// Insert a statement by components.
    pub fn add(
        &mut self,
        subject: impl Into<Term>,
        predicate: impl Into<Iri>,
        object: impl Into<Term>,
        graph: impl Into<Term>,
    ) -> bool {
        self.insert(Quad::new(subject, predicate, object, graph))
    }

    /// Remove a quad. Returns false if it was absent.
    pub fn remove(&mut self, quad: &Quad) -> bool {
        if !self.index.remove(quad) {
            return false;
        }
        self.quads.retain(|q| q != quad);
        true
    }

    /// Remove every quad matching the pattern, returning how many went.
    pub fn remove_matching(&mut self, pattern: &QuadPattern) -> usize {
        let before = self.quads.len();
        let index = &mut self.index;
        self.quads.retain(|q| {
            if pattern.matches(q) {
                index.remove(q);
                false
            } else {
                true
            }
        });
        before - self.quads.len()
    }

    /// Membership test.
    pub fn contains(&self, quad: &Quad) -> bool {
        self.index.contains(quad)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Quad> {
        self.quads.iter()
    }

    /// Iterate over quads matching a pattern.
    pub fn matching<'a>(&'a self, pattern: &'a QuadPattern) -> impl Iterator<Item = &'a Quad> + 'a {
        self.quads.iter().filter(move |q| pattern.matches(q))
    }

    /// Distinct graph names, in first-seen order.
    pub fn graph_names(&self) -> Vec<Term> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for quad in &self.quads {
            if seen.insert(&quad.graph) {
                names.push(quad.graph.clone());
            }
        }
        names
    }

    /// All quads in one graph.
    pub fn graph(&self, graph: &Term) -> Vec<&Quad> {
        self.quads.iter().filter(|q| q.graph == *graph).collect()
    }

    /// Returns true if the graph holds at least one quad.
    pub fn has_graph(&self, graph: &Term) -> bool {
        self.quads.iter().any(|q| q.graph == *graph)
    }

    /// Remove a whole graph, returning the number of quads removed.
    pub fn remove_graph(&mut self, graph: &Term) -> usize {
        self.remove_matching(&QuadPattern::any().graph(graph.clone()))
    }

    /// Subjects of `?s predicate object`, optionally within one graph.
    pub fn subjects(&self, predicate: &Iri, object: &Term, graph: Option<&Term>) -> Vec<Term> {
        let mut out: Vec<Term> = Vec::new();
        for q in &self.quads {
            if q.predicate == *predicate
                && q.object == *object
                && graph.map_or(true, |g| q.graph == *g)
                && !out.contains(&q.subject)
            {
                out.push(q.subject.clone());
            }
        }
        out
    }

    /// Objects of `subject predicate ?o`, optionally within one graph.
    pub fn objects(&self, subject: &Term, predicate: &Iri, graph: Option<&Term>) -> Vec<Term> {
        let mut out: Vec<Term> = Vec::new();
        for q in &self.quads {
            if q.subject == *subject
                && q.predicate == *predicate
                && graph.map_or(true, |g| q.graph == *g)
                && !out.contains(&q.object)
            {
                out.push(q.object.clone());
            }
        }
        out
    }

    /// First object of `subject predicate ?o`, if any.
    pub fn value(&self, subject: &Term, predicate: &Iri, graph: Option<&Term>) -> Option<Term> {
        self.quads
            .iter()
            .find(|q| {
                q.subject == *subject
                    && q.predicate == *predicate
                    && graph.map_or(true, |g| q.graph == *g)
            })
            .map(|q| q.object.clone())
    }

    /// Replace every value of `(subject, predicate)` in `graph` with `object`.
    pub fn set(
        &mut self,
        graph: &Term,
        subject: &Term,
        predicate: &Iri,
        object: impl Into<Term>,
    ) {
        self.remove_matching(
            &QuadPattern::any()
                .graph(graph.clone())
                .subject(subject.clone())
                .predicate(predicate.clone()),
        );
        self.insert(Quad {
            subject: subject.clone(),
            predicate: predicate.clone(),
            object: object.into(),
            graph: graph.clone(),
        });
    }

    /// Rewrite terms in subject, object and graph positions.
    ///
    /// `map` returns `Some(replacement)` for terms to change. Predicates are
    /// never rewritten. Quads that collapse onto each other after rewriting
    /// are merged.
    pub fn rewrite<F>(&mut self, mut map: F)
    where
        F: FnMut(&Term) -> Option<Term>,
    {
        let old = std::mem::take(&mut self.quads);
        self.index.clear();
        for quad in old {
            let subject = map(&quad.subject).unwrap_or(quad.subject);
            let object = map(&quad.object).unwrap_or(quad.object);
            let graph = map(&quad.graph).unwrap_or(quad.graph);
            self.insert(Quad {
                subject,
                predicate: quad.predicate,
                object,
                graph,
            });
        }
    }

    /// Merge every quad from another dataset.
    pub fn merge(&mut self, other: &Dataset) {
        for quad in other.iter() {
            self.insert(quad.clone());
        }
    }
}

impl QuadSource for Dataset {
    fn match_quads(&self, pattern: &QuadPattern) -> Result<Vec<Quad>, SourceError> {
        Ok(self.matching(pattern).cloned().collect())
    }
}

impl FromIterator<Quad> for Dataset {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        let mut ds = Dataset::new();
        ds.extend(iter);
        ds
    }
}

impl Extend<Quad> for Dataset {
    fn extend<I: IntoIterator<Item = Quad>>(&mut self, iter: I) {
        for quad in iter {
            self.insert(quad);
        }
    }
}

impl IntoIterator for Dataset {
    type Item = Quad;
    type IntoIter = std::vec::IntoIter<Quad>;

    fn into_iter(self) -> Self::IntoIter {
        self.quads.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Quad;
    type IntoIter = std::slice::Iter<'a, Quad>;

    fn into_iter(self) -> Self::IntoIter {
        self.quads.iter()
    }
}

impl PartialEq for Dataset {
    /// Set equality; insertion order is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for Dataset {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Literal;

    fn ex(local: &str) -> Term {
        Term::iri(format!("http://ex.org/{}", local))
    }

    fn p(local: &str) -> Iri {
        Iri::new(format!("http://ex.org/{}", local))
    }

    #[test]
    fn test_set_semantics() {
        let mut ds = Dataset::new();
        assert!(ds.add(ex("a"), p("p"), ex("b"), ex("g")));
        assert!(!ds.add(ex("a"), p("p"), ex("b"), ex("g")));
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_graph_names_in_first_seen_order() {
        let mut ds = Dataset::new();
        ds.add(ex("a"), p("p"), ex("b"), ex("g2"));
        ds.add(ex("a"), p("p"), ex("b"), ex("g1"));
        ds.add(ex("c"), p("p"), ex("d"), ex("g2"));
        assert_eq!(ds.graph_names(), vec![ex("g2"), ex("g1")]);
    }

    #[test]
    fn test_set_replaces_values() {
        let mut ds = Dataset::new();
        ds.add(ex("a"), p("p"), Term::string("old"), ex("g"));
        ds.add(ex("a"), p("p"), Term::string("older"), ex("g"));
        ds.add(ex("a"), p("p"), Term::string("other graph"), ex("h"));
        ds.set(&ex("g"), &ex("a"), &p("p"), Literal::string("new"));

        assert_eq!(
            ds.objects(&ex("a"), &p("p"), Some(&ex("g"))),
            vec![Term::string("new")]
        );
        assert_eq!(ds.objects(&ex("a"), &p("p"), Some(&ex("h"))).len(), 1);
    }

    #[test]
    fn test_rewrite_skips_predicates_and_merges() {
        let mut ds = Dataset::new();
        ds.add(Term::blank("x"), p("p"), ex("o"), ex("g"));
        ds.add(ex("y"), p("p"), ex("o"), ex("g"));
        ds.rewrite(|t| match t {
            Term::Blank(_) => Some(ex("y")),
            _ => None,
        });
        assert_eq!(ds.len(), 1);
        assert!(ds.contains(&Quad::new(ex("y"), p("p"), ex("o"), ex("g"))));
    }

    #[test]
    fn test_remove_graph() {
        let mut ds = Dataset::new();
        ds.add(ex("a"), p("p"), ex("b"), ex("g"));
        ds.add(ex("c"), p("p"), ex("d"), ex("g"));
        ds.add(ex("e"), p("p"), ex("f"), ex("h"));
        assert_eq!(ds.remove_graph(&ex("g")), 2);
        assert!(!ds.has_graph(&ex("g")));
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_equality_ignores_order() {
        let a: Dataset = vec![
            Quad::new(ex("a"), p("p"), ex("b"), ex("g")),
            Quad::new(ex("c"), p("p"), ex("d"), ex("g")),
        ]
        .into_iter()
        .collect();
        let b: Dataset = vec![
            Quad::new(ex("c"), p("p"), ex("d"), ex("g")),
            Quad::new(ex("a"), p("p"), ex("b"), ex("g")),
        ]
        .into_iter()
        .collect();
        assert_eq!(a, b);
    }
}
