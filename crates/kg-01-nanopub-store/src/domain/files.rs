//! # File Attachments
//!
//! An entity may be linked to one blob in the depot. The assertion records
//! the file id and describes its format; the head records what the unit is
//! about.

use chrono::{DateTime, Utc};
use shared_types::vocab::{dc, dcat, dcmitype, media_type_classes, ov, pv, rdf, sio, whyis};
use shared_types::{Iri, Literal, Term};

use crate::domain::nanopub::{Nanopublication, Part};

/// MIME type used when an upload does not declare one.
pub const DEFAULT_UPLOAD_MIME: &str = "application/octet-stream";

/// A file to be stored in the depot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime: mime.into(),
            bytes,
        }
    }
}

/// How a multi-file upload is described.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// A single file attached to the entity itself.
    File,
    /// Each file becomes `<entity>/<name>`, linked by `dc:hasPart`.
    Collection,
    /// Each file becomes a `dcat:Distribution` of the entity.
    Dataset,
}

impl UploadKind {
    /// Class the entity is typed with.
    pub fn class(&self) -> Iri {
        Iri::new(match self {
            UploadKind::File => pv::FILE,
            UploadKind::Collection => dcmitype::COLLECTION,
            UploadKind::Dataset => dcat::DATASET,
        })
    }
}

/// A live unit holding a file for some entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriorAttachment {
    pub nanopub: Iri,
    pub assertion: Iri,
}

/// Result of attaching an upload to a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Depot id of the stored blob.
    pub file_id: String,
    /// Live units that held a file for the same entity and must be retired.
    pub superseded: Vec<PriorAttachment>,
}

/// Reduce a filename to a safe ASCII token.
///
/// Path separators, whitespace and anything outside `[A-Za-z0-9._-]` become
/// `_`; leading dots are stripped so the result is never hidden or relative.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

/// Local name of an IRI: the part after the last `#` or `/`.
pub fn local_name(iri: &Iri) -> &str {
    let s = iri.as_str();
    s.rsplit(['#', '/']).find(|part| !part.is_empty()).unwrap_or(s)
}

/// Describe a stored blob in `nanopub`.
pub fn describe_attachment(
    nanopub: &mut Nanopublication,
    entity: &Iri,
    file_id: &str,
    mime: &str,
    contributor: Option<&Iri>,
    now: DateTime<Utc>,
) {
    let subject = Term::Iri(entity.clone());
    let created = Literal::date_time(now);
    let rdf_type = Iri::new(rdf::TYPE);

    let head = nanopub.head();
    nanopub.add_head(head, Iri::new(sio::IS_ABOUT), subject.clone());

    nanopub.add(Part::Assertion, subject.clone(), Iri::new(whyis::HAS_FILE_ID), Literal::string(file_id));
    if let Some(user) = contributor {
        nanopub.add(Part::Assertion, subject.clone(), Iri::new(dc::CONTRIBUTOR), user.clone());
    }
    nanopub.add(Part::Assertion, subject.clone(), Iri::new(dc::CREATED), created.clone());
    nanopub.add(Part::Assertion, subject.clone(), Iri::new(ov::HAS_CONTENT_TYPE), Literal::string(mime));
    for class in media_type_classes(mime) {
        nanopub.add(Part::Assertion, subject.clone(), rdf_type.clone(), class.clone());
        nanopub.add(Part::Assertion, class, rdf_type.clone(), Term::iri(dc::FILE_FORMAT));
    }
    nanopub.add(Part::Assertion, subject, rdf_type, Term::iri(pv::FILE));

    let assertion = Term::Iri(nanopub.assertion_id().clone());
    if let Some(user) = contributor {
        nanopub.add(Part::PublicationInfo, assertion.clone(), Iri::new(dc::CONTRIBUTOR), user.clone());
    }
    nanopub.add(Part::PublicationInfo, assertion, Iri::new(dc::CREATED), created);
}
