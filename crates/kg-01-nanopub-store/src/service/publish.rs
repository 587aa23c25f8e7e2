//! # Publish
//!
//! Batch pipeline: expand, check edits and inline content, extract files,
//! collect replacements, stamp pubinfo, skolemize, stage, swap the replaced
//! graphs for the staged batch, drop orphaned blobs, notify.
//!
//! Nothing in the store changes unless the staged batch parses. Blobs stored
//! for a batch that aborts are deleted again.

use chrono::{DateTime, Utc};
use shared_types::vocab::{dc, np, prov, whyis};
use shared_types::{CallerContext, Iri, Literal, Quad, Term};

use super::files::Extraction;
use super::retire::RetirePlan;
use super::NanopubManager;
use crate::domain::errors::NanopubResult;
use crate::domain::identity::IdentityAllocator;
use crate::domain::nanopub::{Nanopublication, Part, PublishReport, Publishable};
use crate::domain::prepare;
use crate::domain::skolem::Skolemizer;
use crate::ports::outbound::{BlobDepot, QuadStore, TimeSource};

fn push_unique(list: &mut Vec<Iri>, iri: Iri) {
    if !list.contains(&iri) {
        list.push(iri);
    }
}

impl<QS, BD, IA, TS> NanopubManager<QS, BD, IA, TS>
where
    QS: QuadStore,
    BD: BlobDepot,
    IA: IdentityAllocator,
    TS: TimeSource,
{
    pub(crate) fn publish_items(
        &self,
        ctx: &CallerContext,
        items: Vec<Publishable>,
    ) -> NanopubResult<PublishReport> {
        let mut units = Vec::new();
        for item in items {
            match item {
                Publishable::Nanopub(unit) => units.push(unit),
                Publishable::Graph(candidate) => {
                    units.extend(prepare::normalize(candidate, || self.mint())?)
                }
            }
        }

        if units.is_empty() {
            return Ok(PublishReport::default());
        }

        // every edit check and every data: URL is validated before the depot
        // or the store is touched
        for unit in &units {
            self.revision_targets(ctx, unit)?;
            for (entity, _) in self.inline_contents(unit)? {
                self.prior_attachments(ctx, &entity)?;
            }
        }

        let mut report = PublishReport::default();
        let plan = match self.load_batch(ctx, &mut units, &mut report) {
            Ok(plan) => plan,
            Err(e) => {
                self.discard_files(&report.files_created);
                return Err(e);
            }
        };
        if !plan.units.is_empty() {
            report.retired = self.finish_retirement(plan)?.retired;
        }

        tracing::info!(
            units = units.len(),
            retired = report.retired.len(),
            files = report.files_created.len(),
            "[kg-01] Published batch"
        );
        for unit in &units {
            self.listener.on_publish(unit.identifier());
            report.published.push(unit.identifier().clone());
        }
        Ok(report)
    }

    /// Extract content, stamp, stage, then swap the replaced graphs for the
    /// staged batch in one store call. Blobs created on the way are listed
    /// in `report.files_created` even when this fails.
    fn load_batch(
        &self,
        ctx: &CallerContext,
        units: &mut [Nanopublication],
        report: &mut PublishReport,
    ) -> NanopubResult<RetirePlan> {
        let now = self.time_source.now();
        let mut to_retire: Vec<Iri> = Vec::new();
        for unit in units.iter() {
            push_unique(&mut to_retire, unit.identifier().clone());
        }

        for unit in units.iter_mut() {
            let mut extraction = Extraction::default();
            let extracted = self.extract_content(ctx, unit, &mut extraction);
            report.files_created.append(&mut extraction.files);
            extracted?;
            for superseded in extraction.superseded {
                push_unique(&mut to_retire, superseded);
            }

            for replaced in self.replaced_by(unit)? {
                push_unique(&mut to_retire, replaced);
            }

            let revised = self.revision_targets(ctx, unit)?;
            self.stamp(unit, &revised, now);
            for old in revised {
                push_unique(&mut to_retire, old);
            }
        }

        let quads: Vec<Quad> = if self.config.bnode_rewrite {
            let mut skolemizer = Skolemizer::new();
            let quads: Vec<Quad> = units
                .iter()
                .flat_map(|u| u.quads())
                .map(|q| skolemizer.skolemize_quad(q))
                .collect();
            tracing::debug!(bnodes = skolemizer.len(), "[kg-01] Skolemized batch");
            quads
        } else {
            units.iter().flat_map(|u| u.quads()).cloned().collect()
        };
        let mut staged = self.stage(&quads)?;

        let mut plan = self.plan_retirement(&to_retire)?;
        // blobs the batch itself still describes stay
        let has_file_id = Iri::new(whyis::HAS_FILE_ID);
        plan.files.retain(|file_id| {
            !quads.iter().any(|q| {
                q.predicate == has_file_id
                    && q.object.as_literal().map(|l| l.lexical()) == Some(file_id.as_str())
            })
        });

        let loaded = self.store.replace(&plan.graphs, &mut staged.reader)?;
        tracing::debug!(
            quads = loaded,
            staged = staged.quads,
            removed_graphs = plan.graphs.len(),
            "[kg-01] Batch loaded"
        );
        Ok(plan)
    }

    pub(crate) fn discard_files(&self, file_ids: &[String]) {
        for file_id in file_ids {
            if let Err(e) = self.depot.delete(file_id) {
                tracing::warn!(file_id = %file_id, error = %e, "[kg-01] Could not discard blob of aborted batch");
            }
        }
    }

    /// Live units whose head links one of `unit`'s part graphs.
    fn replaced_by(&self, unit: &Nanopublication) -> NanopubResult<Vec<Iri>> {
        let mut replaced = Vec::new();
        for part in Part::ALL {
            let graph = Term::Iri(unit.part_id(part).clone());
            for link in Part::ALL.map(|p| p.link()) {
                for owner in self.store.subjects_of(&link, &graph)? {
                    if let Term::Iri(owner) = owner {
                        push_unique(&mut replaced, owner);
                    }
                }
            }
        }
        Ok(replaced)
    }

    /// Live units exposing an assertion that `unit`'s pubinfo says it
    /// revises. Each one is edit-checked.
    fn revision_targets(&self, ctx: &CallerContext, unit: &Nanopublication) -> NanopubResult<Vec<Iri>> {
        let assertion = Term::Iri(unit.assertion_id().clone());
        let has_assertion = Iri::new(np::HAS_ASSERTION);
        let mut targets = Vec::new();
        for prior in unit.objects(Part::PublicationInfo, &assertion, &Iri::new(prov::WAS_REVISION_OF)) {
            for owner in self.store.subjects_of(&has_assertion, &prior)? {
                let Term::Iri(owner) = owner else {
                    continue;
                };
                if owner == *unit.identifier() || !self.is_live(&owner)? {
                    continue;
                }
                self.authorize(ctx, &owner)?;
                push_unique(&mut targets, owner);
            }
        }
        Ok(targets)
    }

    /// Record invalidation of revised units and the creation or
    /// modification time of the new assertion.
    fn stamp(&self, unit: &mut Nanopublication, revised: &[Iri], now: DateTime<Utc>) {
        let assertion = Term::Iri(unit.assertion_id().clone());
        let when = Literal::date_time(now);
        for old in revised {
            unit.add(
                Part::PublicationInfo,
                old.clone(),
                Iri::new(prov::INVALIDATED_AT_TIME),
                when.clone(),
            );
        }
        let predicate = if revised.is_empty() {
            dc::CREATED
        } else {
            dc::MODIFIED
        };
        unit.set(Part::PublicationInfo, &assertion, &Iri::new(predicate), when);
    }
}
