//! # Quad Source
//!
//! Read-only pattern matching over quads. Implemented by `Dataset` and by
//! every quad store adapter, so inferencer selectors can run against a
//! single assertion graph or the whole store with the same code.

use std::collections::BTreeSet;

use crate::errors::SourceError;
use crate::term::{Iri, Quad, QuadPattern, Term};

/// Read port over a set of quads.
pub trait QuadSource {
    /// All quads matching the pattern.
    fn match_quads(&self, pattern: &QuadPattern) -> Result<Vec<Quad>, SourceError>;

    /// Returns true if at least one quad matches.
    fn contains(&self, pattern: &QuadPattern) -> Result<bool, SourceError> {
        Ok(!self.match_quads(pattern)?.is_empty())
    }

    /// Distinct objects of `subject predicate ?o` in any graph.
    fn objects_of(&self, subject: &Term, predicate: &Iri) -> Result<BTreeSet<Term>, SourceError> {
        let pattern = QuadPattern::any()
            .subject(subject.clone())
            .predicate(predicate.clone());
        Ok(self
            .match_quads(&pattern)?
            .into_iter()
            .map(|q| q.object)
            .collect())
    }

    /// Distinct subjects of `?s predicate object` in any graph.
    fn subjects_of(&self, predicate: &Iri, object: &Term) -> Result<BTreeSet<Term>, SourceError> {
        let pattern = QuadPattern::any()
            .predicate(predicate.clone())
            .object(object.clone());
        Ok(self
            .match_quads(&pattern)?
            .into_iter()
            .map(|q| q.subject)
            .collect())
    }
}

impl<T: QuadSource + ?Sized> QuadSource for &T {
    fn match_quads(&self, pattern: &QuadPattern) -> Result<Vec<Quad>, SourceError> {
        (**self).match_quads(pattern)
    }
}

impl<T: QuadSource + ?Sized> QuadSource for std::sync::Arc<T> {
    fn match_quads(&self, pattern: &QuadPattern) -> Result<Vec<Quad>, SourceError> {
        (**self).match_quads(pattern)
    }
}
