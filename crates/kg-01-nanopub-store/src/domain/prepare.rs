//! # Batch Normalization
//!
//! Turns an arbitrary candidate dataset into well-formed nanopublications.
//!
//! ## Steps
//!
//! 1. Find every head (`?np rdf:type np:Nanopublication`) and its part graphs.
//! 2. Adopt loose graphs: each non-empty graph that is not a known head or
//!    part is moved into the assertion graph of a freshly minted unit.
//! 3. Blank heads get fresh identifiers; blank parts get the fixed suffixes
//!    of their (possibly new) head.
//! 4. All remappings are applied in one rewrite over subject, object and
//!    graph positions.
//! 5. The rewritten dataset is split into one view per head, in discovery
//!    order.

use std::collections::{HashMap, HashSet};

use shared_types::vocab::{np, rdf};
use shared_types::{Dataset, Iri, Quad, Term};
use tracing::debug;

use crate::domain::errors::NanopubError;
use crate::domain::nanopub::{Nanopublication, Part};

struct HeadInfo {
    head: Term,
    parts: [Option<Term>; 3],
}

/// Normalize `candidate`, minting identifiers with `mint`.
pub fn normalize<F>(mut candidate: Dataset, mut mint: F) -> Result<Vec<Nanopublication>, NanopubError>
where
    F: FnMut() -> Iri,
{
    let rdf_type = Iri::new(rdf::TYPE);
    let np_class = Term::iri(np::NANOPUBLICATION);

    // 1. heads and their parts
    let mut heads = Vec::new();
    for head in candidate.subjects(&rdf_type, &np_class, None) {
        let mut parts: [Option<Term>; 3] = [None, None, None];
        for (slot, part) in parts.iter_mut().zip(Part::ALL) {
            if let Some(target) = candidate.value(&head, &part.link(), None) {
                if matches!(target, Term::Literal(_)) {
                    return Err(NanopubError::Malformed {
                        identifier: head.to_string(),
                        reason: format!("{} link is a literal", part.suffix()),
                    });
                }
                *slot = Some(target);
            }
        }
        heads.push(HeadInfo { head, parts });
    }

    let mut known: HashSet<Term> = HashSet::new();
    for info in &heads {
        known.insert(info.head.clone());
        for (slot, part) in info.parts.iter().zip(Part::ALL) {
            match (slot, &info.head) {
                (Some(target), _) => {
                    known.insert(target.clone());
                }
                (None, Term::Iri(iri)) => {
                    known.insert(Term::Iri(iri.with_suffix(part.suffix())));
                }
                (None, _) => {}
            }
        }
    }

    // 2. loose graphs
    let loose: Vec<Term> = candidate
        .graph_names()
        .into_iter()
        .filter(|g| !known.contains(g))
        .collect();
    for graph in loose {
        let id = mint();
        let assertion = Term::Iri(id.with_suffix(Part::Assertion.suffix()));
        let moved = retarget_graph(&mut candidate, &graph, &assertion);
        debug!(graph = %graph, nanopub = %id, quads = moved, "[kg-01] Adopting loose graph");
        let head = Term::Iri(id);
        candidate.add(head.clone(), rdf_type.clone(), np_class.clone(), head.clone());
        heads.push(HeadInfo {
            head,
            parts: [Some(assertion), None, None],
        });
    }

    // 3. remap blank identifiers
    let mut remap: HashMap<Term, Term> = HashMap::new();
    for info in &heads {
        let id = match &info.head {
            Term::Iri(iri) => iri.clone(),
            other => {
                let fresh = mint();
                remap.insert(other.clone(), Term::Iri(fresh.clone()));
                fresh
            }
        };
        for (slot, part) in info.parts.iter().zip(Part::ALL) {
            if let Some(target @ Term::Blank(_)) = slot {
                remap.insert(target.clone(), Term::Iri(id.with_suffix(part.suffix())));
            }
        }
    }

    // 4. single rewrite pass
    if !remap.is_empty() {
        candidate.rewrite(|term| remap.get(term).cloned());
    }

    // 5. split per head
    let mut units = Vec::new();
    for head in candidate.subjects(&rdf_type, &np_class, None) {
        let Term::Iri(id) = head else {
            continue;
        };
        let probe = Nanopublication::from_dataset(id.clone(), head_graph(&candidate, &id))?;
        let names: HashSet<Term> = probe
            .graph_ids()
            .iter()
            .map(|iri| Term::Iri((*iri).clone()))
            .collect();
        let quads: Dataset = candidate
            .iter()
            .filter(|q| names.contains(&q.graph))
            .cloned()
            .collect();
        let mut unit = Nanopublication::from_dataset(id, quads)?;
        // the type triple may have been asserted outside the head graph
        let head = unit.head();
        unit.add_head(head, rdf_type.clone(), np_class.clone());
        units.push(unit);
    }
    Ok(units)
}

/// Quads of the graph named `id` plus head-level statements about `id`
/// found anywhere, used to resolve part links.
fn head_graph(dataset: &Dataset, id: &Iri) -> Dataset {
    let head = Term::Iri(id.clone());
    dataset
        .iter()
        .filter(|q| q.graph == head || q.subject == head)
        .map(|q| Quad {
            graph: head.clone(),
            ..q.clone()
        })
        .collect()
}

/// Move every quad of graph `from` into graph `to`. Returns how many moved.
fn retarget_graph(dataset: &mut Dataset, from: &Term, to: &Term) -> usize {
    let moved: Vec<Quad> = dataset.graph(from).into_iter().cloned().collect();
    dataset.remove_graph(from);
    for quad in &moved {
        dataset.insert(Quad {
            graph: to.clone(),
            ..quad.clone()
        });
    }
    moved.len()
}
