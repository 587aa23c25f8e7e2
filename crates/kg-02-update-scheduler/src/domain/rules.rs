//! # Rule Inferencer
//!
//! Forward-chaining over one predicate: for every `?s antecedent ?o`, assert
//! a set of templated consequents in a new nanopublication whose provenance
//! points back at the graph the match came from.
//!
//! ```text
//! ?s foaf:knows ?o   ==>   ?s schema:acquaintance ?o
//! ```

use std::collections::BTreeSet;

use kg_01_nanopub_store::Part;
use shared_types::vocab::prov;
use shared_types::{Iri, Quad, QuadPattern, QuadSource, Term};

use crate::domain::errors::ServiceError;
use crate::domain::services::{InferenceContext, Inferencer, TriggerKind};

/// A position in a consequent template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// The matched subject.
    Subject,
    /// The matched object.
    Object,
    /// A constant term.
    Fixed(Term),
}

impl Slot {
    fn bind(&self, subject: &Term, object: &Term) -> Term {
        match self {
            Slot::Subject => subject.clone(),
            Slot::Object => object.clone(),
            Slot::Fixed(term) => term.clone(),
        }
    }
}

/// One templated triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consequent {
    pub subject: Slot,
    pub predicate: Iri,
    pub object: Slot,
}

impl Consequent {
    pub fn new(subject: Slot, predicate: impl Into<Iri>, object: Slot) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

/// Pattern-triggered inferencer.
#[derive(Debug, Clone)]
pub struct RuleInferencer {
    name: String,
    trigger: TriggerKind,
    antecedent: Iri,
    consequents: Vec<Consequent>,
}

impl RuleInferencer {
    pub fn new(name: impl Into<String>, antecedent: impl Into<Iri>) -> Self {
        Self {
            name: name.into(),
            trigger: TriggerKind::Unit,
            antecedent: antecedent.into(),
            consequents: Vec::new(),
        }
    }

    /// `?s antecedent ?o ==> ?s predicate ?o`.
    pub fn rename(name: impl Into<String>, antecedent: impl Into<Iri>, predicate: impl Into<Iri>) -> Self {
        Self::new(name, antecedent).with_consequent(Consequent::new(Slot::Subject, predicate, Slot::Object))
    }

    pub fn with_consequent(mut self, consequent: Consequent) -> Self {
        self.consequents.push(consequent);
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerKind) -> Self {
        self.trigger = trigger;
        self
    }

    fn matches(&self, source: &dyn QuadSource, subject: Option<&Term>) -> Result<Vec<Quad>, ServiceError> {
        let mut pattern = QuadPattern::any().predicate(self.antecedent.clone());
        if let Some(subject) = subject {
            pattern = pattern.subject(subject.clone());
        }
        Ok(source.match_quads(&pattern)?)
    }

    /// Consequent triples of one match that `source` does not already hold.
    fn missing(&self, source: &dyn QuadSource, matched: &Quad) -> Result<Vec<(Term, Iri, Term)>, ServiceError> {
        let mut missing = Vec::new();
        for consequent in &self.consequents {
            let s = consequent.subject.bind(&matched.subject, &matched.object);
            let o = consequent.object.bind(&matched.subject, &matched.object);
            let pattern = QuadPattern::any()
                .subject(s.clone())
                .predicate(consequent.predicate.clone())
                .object(o.clone());
            if !source.contains(&pattern)? {
                missing.push((s, consequent.predicate.clone(), o));
            }
        }
        Ok(missing)
    }
}

impl Inferencer for RuleInferencer {
    fn name(&self) -> &str {
        &self.name
    }

    fn trigger(&self) -> TriggerKind {
        self.trigger
    }

    fn select_instances(&self, source: &dyn QuadSource) -> Result<BTreeSet<Term>, ServiceError> {
        let mut instances = BTreeSet::new();
        for matched in self.matches(source, None)? {
            if !self.missing(source, &matched)?.is_empty() {
                instances.insert(matched.subject);
            }
        }
        Ok(instances)
    }

    fn process(&self, source: &dyn QuadSource, ctx: &InferenceContext<'_>) -> Result<(), ServiceError> {
        let mut nanopub = ctx.manager.new_nanopub();
        let mut derived_from = Vec::new();
        let mut added = 0;
        for matched in self.matches(source, Some(&ctx.instance))? {
            for (s, p, o) in self.missing(source, &matched)? {
                if nanopub.add(Part::Assertion, s, p, o) {
                    added += 1;
                }
            }
            if matched.graph.is_resource() && !derived_from.contains(&matched.graph) {
                derived_from.push(matched.graph);
            }
        }
        if added == 0 {
            return Ok(());
        }

        let assertion = Term::Iri(nanopub.assertion_id().clone());
        for graph in derived_from {
            nanopub.add(
                Part::Provenance,
                assertion.clone(),
                Iri::new(prov::WAS_DERIVED_FROM),
                graph,
            );
        }

        let report = ctx.manager.publish(&ctx.caller, vec![nanopub.into()])?;
        tracing::debug!(
            service = %self.name,
            instance = %ctx.instance,
            statements = added,
            published = ?report.published,
            "[kg-02] Rule fired"
        );
        Ok(())
    }
}
