//! # File Attachment Operations
//!
//! Depot writes, prior-attachment lookup and the inline `data:` content
//! extraction run by `publish`.

use shared_types::vocab::{dc, dcat, np, prov, rdf, whyis};
use shared_types::{CallerContext, Iri, QuadPattern, Term};

use super::NanopubManager;
use crate::domain::data_url::DataUrl;
use crate::domain::errors::{NanopubError, NanopubResult};
use crate::domain::files::{
    describe_attachment, local_name, secure_filename, Attachment, FileUpload, PriorAttachment,
    UploadKind,
};
use crate::domain::identity::IdentityAllocator;
use crate::domain::nanopub::{Nanopublication, Part, PublishReport, RetireReport};
use crate::ports::outbound::{BlobDepot, QuadStore, TimeSource};

/// Files stored and units superseded while extracting inline content.
#[derive(Debug, Default)]
pub(crate) struct Extraction {
    pub files: Vec<String>,
    pub superseded: Vec<Iri>,
}

impl<QS, BD, IA, TS> NanopubManager<QS, BD, IA, TS>
where
    QS: QuadStore,
    BD: BlobDepot,
    IA: IdentityAllocator,
    TS: TimeSource,
{
    pub(crate) fn attach(
        &self,
        ctx: &CallerContext,
        nanopub: &mut Nanopublication,
        entity: &Iri,
        upload: &FileUpload,
    ) -> NanopubResult<Attachment> {
        let superseded = self.prior_attachments(ctx, entity)?;
        let file_id = self
            .depot
            .create(&upload.bytes, &upload.filename, &upload.mime)?;
        describe_attachment(
            nanopub,
            entity,
            &file_id,
            &upload.mime,
            ctx.identifier(),
            self.time_source.now(),
        );

        tracing::info!(
            entity = %entity,
            file_id = %file_id,
            size = upload.bytes.len(),
            superseded = superseded.len(),
            "[kg-01] File attached"
        );
        Ok(Attachment {
            file_id,
            superseded,
        })
    }

    /// Live units holding a file for `entity`. Each one is edit-checked.
    pub(crate) fn prior_attachments(
        &self,
        ctx: &CallerContext,
        entity: &Iri,
    ) -> NanopubResult<Vec<PriorAttachment>> {
        let pattern = QuadPattern::any()
            .subject(entity.clone())
            .predicate(Iri::new(whyis::HAS_FILE_ID));
        let mut graphs: Vec<Term> = Vec::new();
        for quad in self.store.match_quads(&pattern)? {
            if !graphs.contains(&quad.graph) {
                graphs.push(quad.graph);
            }
        }

        let has_assertion = Iri::new(np::HAS_ASSERTION);
        let mut priors = Vec::new();
        for graph in graphs {
            let Term::Iri(assertion) = &graph else {
                continue;
            };
            for owner in self.store.subjects_of(&has_assertion, &graph)? {
                let Term::Iri(nanopub) = owner else {
                    continue;
                };
                if !self.is_live(&nanopub)? {
                    continue;
                }
                self.authorize(ctx, &nanopub)?;
                priors.push(PriorAttachment {
                    nanopub,
                    assertion: assertion.clone(),
                });
            }
        }
        Ok(priors)
    }

    pub(crate) fn delete_attachments(
        &self,
        ctx: &CallerContext,
        entity: &Iri,
    ) -> NanopubResult<RetireReport> {
        let priors = self.prior_attachments(ctx, entity)?;
        let uris: Vec<Iri> = priors.into_iter().map(|p| p.nanopub).collect();
        tracing::info!(entity = %entity, units = uris.len(), "[kg-01] Deleting file");
        self.retire_unchecked(&uris)
    }

    pub(crate) fn upload(
        &self,
        ctx: &CallerContext,
        entity: &Iri,
        uploads: Vec<FileUpload>,
        kind: UploadKind,
    ) -> NanopubResult<PublishReport> {
        let mut nanopub = Nanopublication::empty(self.mint());
        let subject = Term::Iri(entity.clone());
        nanopub.add(Part::Assertion, subject.clone(), Iri::new(rdf::TYPE), kind.class());

        let mut created = Vec::new();
        let mut priors = Vec::new();
        for upload in uploads.iter().filter(|u| !u.filename.is_empty()) {
            let target = match kind {
                UploadKind::File => entity.clone(),
                UploadKind::Collection => {
                    let part = entity.with_suffix(&format!("/{}", secure_filename(&upload.filename)));
                    nanopub.add(Part::Assertion, subject.clone(), Iri::new(dc::HAS_PART), part.clone());
                    part
                }
                UploadKind::Dataset => {
                    let dist = entity.with_suffix(&format!("/{}", secure_filename(&upload.filename)));
                    let dist_term = Term::Iri(dist.clone());
                    nanopub.add(Part::Assertion, subject.clone(), Iri::new(dcat::HAS_DISTRIBUTION), dist.clone());
                    nanopub.add(Part::Assertion, dist_term.clone(), Iri::new(rdf::TYPE), Term::iri(dcat::DISTRIBUTION));
                    nanopub.add(Part::Assertion, dist_term, Iri::new(dcat::DOWNLOAD_URL), dist.clone());
                    dist
                }
            };
            let attachment = match self.attach(ctx, &mut nanopub, &target, upload) {
                Ok(attachment) => attachment,
                Err(e) => {
                    self.discard_files(&created);
                    return Err(e);
                }
            };
            created.push(attachment.file_id);
            priors.extend(attachment.superseded);
            if kind == UploadKind::File {
                break;
            }
        }

        if created.is_empty() {
            tracing::debug!(entity = %entity, "[kg-01] Upload carried no files");
            return Ok(PublishReport::default());
        }

        let assertion = Term::Iri(nanopub.assertion_id().clone());
        for prior in &priors {
            nanopub.add(
                Part::PublicationInfo,
                assertion.clone(),
                Iri::new(prov::WAS_REVISION_OF),
                prior.assertion.clone(),
            );
        }

        let mut report = match self.publish_items(ctx, vec![nanopub.into()]) {
            Ok(report) => report,
            Err(e) => {
                self.discard_files(&created);
                return Err(e);
            }
        };
        created.append(&mut report.files_created);
        report.files_created = created;
        Ok(report)
    }

    /// Decode every `?e whyis:hasContent "data:..."` in the unit's
    /// assertion. Blank subjects are skipped.
    pub(crate) fn inline_contents(&self, unit: &Nanopublication) -> NanopubResult<Vec<(Iri, DataUrl)>> {
        let pattern = QuadPattern::any()
            .predicate(Iri::new(whyis::HAS_CONTENT))
            .graph(unit.assertion_id().clone());
        let mut contents = Vec::new();
        for quad in unit.dataset().matching(&pattern) {
            let Term::Iri(entity) = &quad.subject else {
                tracing::warn!(subject = %quad.subject, "[kg-01] Inline content on a blank node left as is");
                continue;
            };
            let Some(literal) = quad.object.as_literal() else {
                return Err(NanopubError::InvalidDataUrl {
                    entity: entity.as_str().to_string(),
                    reason: "content is not a literal".to_string(),
                });
            };
            let data = DataUrl::parse(literal.lexical()).map_err(|reason| {
                NanopubError::InvalidDataUrl {
                    entity: entity.as_str().to_string(),
                    reason,
                }
            })?;
            contents.push((entity.clone(), data));
        }
        Ok(contents)
    }

    /// Replace every inline content statement in the unit's assertion with
    /// a stored blob and its description. Stops at the first failure; the
    /// files stored so far are in `extraction.files`.
    pub(crate) fn extract_content(
        &self,
        ctx: &CallerContext,
        unit: &mut Nanopublication,
        extraction: &mut Extraction,
    ) -> NanopubResult<()> {
        let has_content = Iri::new(whyis::HAS_CONTENT);
        let assertion = Term::Iri(unit.assertion_id().clone());
        for (entity, data) in self.inline_contents(unit)? {
            let upload = FileUpload::new(secure_filename(local_name(&entity)), data.mime, data.bytes);
            let attachment = self.attach(ctx, unit, &entity, &upload)?;
            extraction.files.push(attachment.file_id);
            for prior in attachment.superseded {
                unit.add(
                    Part::PublicationInfo,
                    assertion.clone(),
                    Iri::new(prov::WAS_REVISION_OF),
                    prior.assertion,
                );
                if !extraction.superseded.contains(&prior.nanopub) {
                    extraction.superseded.push(prior.nanopub);
                }
            }
            unit.remove_values(Part::Assertion, &Term::Iri(entity), &has_content);
        }
        Ok(())
    }
}
