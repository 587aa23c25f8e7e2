//! # Skolemization
//!
//! Blank nodes are batch-local. Before bulk load they may be replaced with
//! surrogate IRIs of the form `bnode:<hex>`, and such IRIs are turned back
//! into blank nodes on read.

use std::collections::HashMap;

use shared_types::{BlankId, Iri, Quad, Term};

/// Scheme marking a skolemized blank node.
pub const BNODE_SCHEME: &str = "bnode:";

/// Rewrites blank nodes to surrogate IRIs.
///
/// One skolemizer is used per publish batch, so a blank node shared by
/// several units in the batch maps to the same surrogate.
#[derive(Debug, Default)]
pub struct Skolemizer {
    cache: HashMap<BlankId, Iri>,
}

impl Skolemizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surrogate for a term, or the term unchanged.
    pub fn skolemize(&mut self, term: &Term) -> Term {
        match term {
            Term::Blank(b) => Term::Iri(
                self.cache
                    .entry(b.clone())
                    .or_insert_with(|| {
                        Iri::new(format!("{}{}", BNODE_SCHEME, uuid::Uuid::new_v4().simple()))
                    })
                    .clone(),
            ),
            other => other.clone(),
        }
    }

    /// Skolemize subject and object. Graph names were already made stable by
    /// `prepare`; predicates cannot be blank.
    pub fn skolemize_quad(&mut self, quad: &Quad) -> Quad {
        Quad {
            subject: self.skolemize(&quad.subject),
            predicate: quad.predicate.clone(),
            object: self.skolemize(&quad.object),
            graph: quad.graph.clone(),
        }
    }

    /// Number of distinct blank nodes rewritten so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Reverse skolemization for one term.
pub fn unskolemize(term: &Term) -> Term {
    match term {
        Term::Iri(iri) => match iri.as_str().strip_prefix(BNODE_SCHEME) {
            Some(label) => Term::Blank(BlankId::new(label)),
            None => term.clone(),
        },
        other => other.clone(),
    }
}

/// Reverse skolemization for subject and object of a quad.
pub fn unskolemize_quad(quad: Quad) -> Quad {
    Quad {
        subject: unskolemize(&quad.subject),
        object: unskolemize(&quad.object),
        ..quad
    }
}
