//! # Vocabulary
//!
//! Namespace constants for the predicates and classes the store reads and
//! writes. Each namespace is a module of `&'static str` full IRIs plus an
//! `iri()` helper for the ones used as `Iri` values in hot paths.

use crate::term::Iri;

/// `rdf:` namespace.
pub mod rdf {
    pub const NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}

/// `xsd:` namespace.
pub mod xsd {
    pub const NS: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
}

/// Nanopublication schema.
pub mod np {
    pub const NS: &str = "http://www.nanopub.org/nschema#";
    pub const NANOPUBLICATION: &str = "http://www.nanopub.org/nschema#Nanopublication";
    pub const ASSERTION: &str = "http://www.nanopub.org/nschema#Assertion";
    pub const PROVENANCE: &str = "http://www.nanopub.org/nschema#Provenance";
    pub const PUBLICATION_INFO: &str = "http://www.nanopub.org/nschema#PublicationInfo";
    pub const HAS_ASSERTION: &str = "http://www.nanopub.org/nschema#hasAssertion";
    pub const HAS_PROVENANCE: &str = "http://www.nanopub.org/nschema#hasProvenance";
    pub const HAS_PUBLICATION_INFO: &str = "http://www.nanopub.org/nschema#hasPublicationInfo";
}

/// W3C PROV-O.
pub mod prov {
    pub const NS: &str = "http://www.w3.org/ns/prov#";
    pub const WAS_DERIVED_FROM: &str = "http://www.w3.org/ns/prov#wasDerivedFrom";
    pub const WAS_REVISION_OF: &str = "http://www.w3.org/ns/prov#wasRevisionOf";
    pub const INVALIDATED_AT_TIME: &str = "http://www.w3.org/ns/prov#invalidatedAtTime";
    pub const WAS_GENERATED_BY: &str = "http://www.w3.org/ns/prov#wasGeneratedBy";
    pub const WAS_ATTRIBUTED_TO: &str = "http://www.w3.org/ns/prov#wasAttributedTo";
}

/// Dublin Core terms.
pub mod dc {
    pub const NS: &str = "http://purl.org/dc/terms/";
    pub const CREATED: &str = "http://purl.org/dc/terms/created";
    pub const MODIFIED: &str = "http://purl.org/dc/terms/modified";
    pub const CONTRIBUTOR: &str = "http://purl.org/dc/terms/contributor";
    pub const FILE_FORMAT: &str = "http://purl.org/dc/terms/FileFormat";
    pub const HAS_PART: &str = "http://purl.org/dc/terms/hasPart";
}

/// DCMI types.
pub mod dcmitype {
    pub const COLLECTION: &str = "http://purl.org/dc/dcmitype/Collection";
}

/// Data Catalog vocabulary.
pub mod dcat {
    pub const NS: &str = "http://www.w3.org/ns/dcat#";
    pub const DATASET: &str = "http://www.w3.org/ns/dcat#Dataset";
    pub const DISTRIBUTION: &str = "http://www.w3.org/ns/dcat#Distribution";
    pub const HAS_DISTRIBUTION: &str = "http://www.w3.org/ns/dcat#distribution";
    pub const DOWNLOAD_URL: &str = "http://www.w3.org/ns/dcat#downloadURL";
}

/// Platform vocabulary.
pub mod whyis {
    pub const NS: &str = "http://vocab.rpi.edu/whyis/";
    pub const HAS_CONTENT: &str = "http://vocab.rpi.edu/whyis/hasContent";
    pub const HAS_FILE_ID: &str = "http://vocab.rpi.edu/whyis/hasFileID";
    pub const FRIR_NANOPUBLICATION: &str = "http://vocab.rpi.edu/whyis/FRIRNanopublication";
}

/// Semanticscience Integrated Ontology.
pub mod sio {
    pub const NS: &str = "http://semanticscience.org/resource/";
    pub const IS_ABOUT: &str = "http://semanticscience.org/resource/isAbout";
}

/// Open vocab terms.
pub mod ov {
    pub const NS: &str = "http://open.vocab.org/terms/";
    pub const HAS_CONTENT_TYPE: &str = "http://open.vocab.org/terms/hasContentType";
}

/// Provenance vocabulary.
pub mod pv {
    pub const NS: &str = "http://purl.org/net/provenance/ns#";
    pub const FILE: &str = "http://purl.org/net/provenance/ns#File";
}

/// IANA media type registry, used as a class namespace.
pub mod media_types {
    pub const NS: &str = "https://www.iana.org/assignments/media-types/";
}

/// FRBR core.
pub mod frbr {
    pub const NS: &str = "http://purl.org/vocab/frbr/core#";
}

/// Build an `Iri` from a vocabulary constant.
pub fn iri(constant: &str) -> Iri {
    Iri::new(constant)
}

/// The class IRIs describing a MIME type: the full type and its top-level
/// family (e.g. `text/plain` and `text`).
pub fn media_type_classes(mime: &str) -> Vec<Iri> {
    let mut classes = vec![Iri::new(format!("{}{}", media_types::NS, mime))];
    if let Some((family, _)) = mime.split_once('/') {
        classes.push(Iri::new(format!("{}{}", media_types::NS, family)));
    }
    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_classes() {
        let classes = media_type_classes("text/plain");
        assert_eq!(classes.len(), 2);
        assert_eq!(
            classes[0].as_str(),
            "https://www.iana.org/assignments/media-types/text/plain"
        );
        assert_eq!(
            classes[1].as_str(),
            "https://www.iana.org/assignments/media-types/text"
        );
    }

    #[test]
    fn test_media_type_without_family() {
        assert_eq!(media_type_classes("application").len(), 1);
    }
}
