//! # RDF Terms
//!
//! Terms are the building blocks of quads. A term can be:
//! - An IRI (always absolute, never prefixed)
//! - A blank node (label scoped to one submitted batch)
//! - A literal (lexical form + optional datatype + optional language tag)
//!
//! Quads place an IRI in predicate position and an IRI or blank node in
//! graph position. Literals only ever occur as objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::vocab::xsd;

/// An absolute IRI.
///
/// Backed by `Arc<str>` so cloning a term while rewriting a dataset does not
/// copy the string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Iri(Arc<str>);

impl Iri {
    /// Create an IRI from any string-like value.
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(Arc::from(value.as_ref()))
    }

    /// The IRI string without angle brackets.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append a suffix to this IRI (e.g. `_assertion`).
    pub fn with_suffix(&self, suffix: &str) -> Iri {
        Iri::new(format!("{}{}", self.0, suffix))
    }

    /// Returns true if this IRI starts with the given prefix.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", crate::nquads::escape_iri(&self.0))
    }
}

impl From<&str> for Iri {
    fn from(value: &str) -> Self {
        Iri::new(value)
    }
}

impl From<String> for Iri {
    fn from(value: String) -> Self {
        Iri(Arc::from(value))
    }
}

/// Blank node identifier.
///
/// Blank node labels are stable within a batch but have no global meaning.
/// The label does NOT include the `_:` prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlankId(Arc<str>);

impl BlankId {
    /// Create a blank node ID from a label.
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(Arc::from(label.as_ref()))
    }

    /// Create a blank node with a fresh random label.
    pub fn fresh() -> Self {
        Self::new(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Get the label (without `_:` prefix).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

/// An RDF literal.
///
/// A literal with a language tag is an `rdf:langString`; a literal with
/// neither datatype nor language is an `xsd:string`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    lexical: Arc<str>,
    datatype: Option<Iri>,
    language: Option<Arc<str>>,
}

impl Literal {
    /// A plain string literal.
    pub fn string(value: impl AsRef<str>) -> Self {
        Self {
            lexical: Arc::from(value.as_ref()),
            datatype: None,
            language: None,
        }
    }

    /// A typed literal. `xsd:string` is normalized to a plain literal.
    pub fn typed(value: impl AsRef<str>, datatype: Iri) -> Self {
        let datatype = if datatype.as_str() == xsd::STRING {
            None
        } else {
            Some(datatype)
        };
        Self {
            lexical: Arc::from(value.as_ref()),
            datatype,
            language: None,
        }
    }

    /// A language-tagged literal.
    pub fn lang(value: impl AsRef<str>, language: impl AsRef<str>) -> Self {
        Self {
            lexical: Arc::from(value.as_ref()),
            datatype: None,
            language: Some(Arc::from(language.as_ref().to_ascii_lowercase())),
        }
    }

    /// An `xsd:dateTime` literal in RFC 3339 form.
    pub fn date_time(value: chrono::DateTime<chrono::Utc>) -> Self {
        Self::typed(
            value.to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            Iri::new(xsd::DATE_TIME),
        )
    }

    /// Lexical form.
    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    /// Explicit datatype, if any.
    pub fn datatype(&self) -> Option<&Iri> {
        self.datatype.as_ref()
    }

    /// Language tag, if any.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Parse an `xsd:dateTime` literal.
    pub fn as_date_time(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::parse_from_rfc3339(&self.lexical)
            .ok()
            .map(|dt| dt.with_timezone(&chrono::Utc))
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", crate::nquads::escape_literal(&self.lexical))?;
        if let Some(lang) = &self.language {
            write!(f, "@{}", lang)
        } else if let Some(dt) = &self.datatype {
            write!(f, "^^{}", dt)
        } else {
            Ok(())
        }
    }
}

/// Any RDF term.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// A named resource.
    Iri(Iri),
    /// An anonymous resource.
    Blank(BlankId),
    /// A literal value.
    Literal(Literal),
}

impl Term {
    /// Shorthand for an IRI term.
    pub fn iri(value: impl AsRef<str>) -> Self {
        Term::Iri(Iri::new(value))
    }

    /// Shorthand for a blank node term.
    pub fn blank(label: impl AsRef<str>) -> Self {
        Term::Blank(BlankId::new(label))
    }

    /// Shorthand for a plain string literal.
    pub fn string(value: impl AsRef<str>) -> Self {
        Term::Literal(Literal::string(value))
    }

    /// Borrow as IRI.
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Borrow as literal.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Returns true for blank nodes.
    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank(_))
    }

    /// Returns true for IRIs and blank nodes (valid subject / graph names).
    pub fn is_resource(&self) -> bool {
        !matches!(self, Term::Literal(_))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => iri.fmt(f),
            Term::Blank(b) => b.fmt(f),
            Term::Literal(lit) => lit.fmt(f),
        }
    }
}

impl From<Iri> for Term {
    fn from(value: Iri) -> Self {
        Term::Iri(value)
    }
}

impl From<&Iri> for Term {
    fn from(value: &Iri) -> Self {
        Term::Iri(value.clone())
    }
}

impl From<BlankId> for Term {
    fn from(value: BlankId) -> Self {
        Term::Blank(value)
    }
}

impl From<Literal> for Term {
    fn from(value: Literal) -> Self {
        Term::Literal(value)
    }
}

/// A statement in a named graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quad {
    /// IRI or blank node.
    pub subject: Term,
    /// Always an IRI.
    pub predicate: Iri,
    /// Any term.
    pub object: Term,
    /// IRI or blank node naming the graph.
    pub graph: Term,
}

impl Quad {
    /// Build a quad.
    pub fn new(
        subject: impl Into<Term>,
        predicate: impl Into<Iri>,
        object: impl Into<Term>,
        graph: impl Into<Term>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph: graph.into(),
        }
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} .",
            self.subject, self.predicate, self.object, self.graph
        )
    }
}

/// A quad pattern: `None` positions are wildcards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuadPattern {
    pub subject: Option<Term>,
    pub predicate: Option<Iri>,
    pub object: Option<Term>,
    pub graph: Option<Term>,
}

impl QuadPattern {
    /// Matches every quad.
    pub fn any() -> Self {
        Self::default()
    }

    /// Bind the subject.
    pub fn subject(mut self, subject: impl Into<Term>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Bind the predicate.
    pub fn predicate(mut self, predicate: impl Into<Iri>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    /// Bind the object.
    pub fn object(mut self, object: impl Into<Term>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Bind the graph.
    pub fn graph(mut self, graph: impl Into<Term>) -> Self {
        self.graph = Some(graph.into());
        self
    }

    /// Test a quad against this pattern.
    pub fn matches(&self, quad: &Quad) -> bool {
        self.subject.as_ref().map_or(true, |s| *s == quad.subject)
            && self.predicate.as_ref().map_or(true, |p| *p == quad.predicate)
            && self.object.as_ref().map_or(true, |o| *o == quad.object)
            && self.graph.as_ref().map_or(true, |g| *g == quad.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xsd_string_normalized_to_plain() {
        let typed = Literal::typed("hello", Iri::new(xsd::STRING));
        assert_eq!(typed, Literal::string("hello"));
        assert!(typed.datatype().is_none());
    }

    #[test]
    fn test_language_tag_lowercased() {
        let lit = Literal::lang("Hallo", "DE");
        assert_eq!(lit.language(), Some("de"));
    }

    #[test]
    fn test_date_time_roundtrip() {
        let now = chrono::Utc::now();
        let lit = Literal::date_time(now);
        let parsed = lit.as_date_time().unwrap();
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }

    #[test]
    fn test_pattern_wildcards() {
        let quad = Quad::new(
            Term::iri("http://ex.org/a"),
            Iri::new("http://ex.org/p"),
            Term::string("v"),
            Term::iri("http://ex.org/g"),
        );
        assert!(QuadPattern::any().matches(&quad));
        assert!(QuadPattern::any()
            .predicate(Iri::new("http://ex.org/p"))
            .matches(&quad));
        assert!(!QuadPattern::any()
            .graph(Term::iri("http://ex.org/other"))
            .matches(&quad));
    }

    #[test]
    fn test_iri_with_suffix() {
        let iri = Iri::new("http://ex.org/pub/abc");
        assert_eq!(iri.with_suffix("_assertion").as_str(), "http://ex.org/pub/abc_assertion");
    }
}
