//! # N-Quads Codec
//!
//! Line-oriented serializer and parser for the staging artifact written
//! during `publish` and read back by the quad store's bulk loader.
//!
//! ## Supported Syntax
//!
//! - IRIs in angle brackets, blank nodes as `_:label`
//! - Characters an IRI may not carry raw (space, `<>"{}|^` and backquote,
//!   backslash, controls) written as `\uXXXX`
//! - Literals with `\"`, `\\`, `\n`, `\r`, `\t`, `\uXXXX` and `\UXXXXXXXX` escapes
//! - `^^<datatype>` and `@lang` suffixes
//! - Comment lines (`#`) and blank lines are skipped
//!
//! Every statement MUST carry a graph name; the store has no default graph.

use std::io::{BufRead, Write};

use crate::dataset::Dataset;
use crate::errors::NQuadsError;
use crate::term::{BlankId, Iri, Literal, Quad, Term};

/// Escape a literal's lexical form for output.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Characters that may not appear unescaped inside `<...>`.
fn forbidden_in_iri(c: char) -> bool {
    c <= ' ' || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
}

/// Escape an IRI for output between angle brackets.
pub fn escape_iri(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if forbidden_in_iri(c) {
            out.push_str(&format!("\\u{:04X}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// Write every quad as one N-Quads line.
pub fn write_quads<'a, W, I>(mut writer: W, quads: I) -> Result<usize, NQuadsError>
where
    W: Write,
    I: IntoIterator<Item = &'a Quad>,
{
    let mut count = 0;
    for quad in quads {
        writeln!(writer, "{}", quad)?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Serialize a dataset to a string.
pub fn to_string(dataset: &Dataset) -> String {
    let mut out = String::new();
    for quad in dataset {
        out.push_str(&quad.to_string());
        out.push('\n');
    }
    out
}

/// Read every quad from a buffered reader.
pub fn read_quads<R: BufRead>(reader: R) -> Result<Dataset, NQuadsError> {
    let mut dataset = Dataset::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(quad) = parse_line(&line, idx + 1)? {
            dataset.insert(quad);
        }
    }
    Ok(dataset)
}

/// Parse a document held in memory.
pub fn parse_str(input: &str) -> Result<Dataset, NQuadsError> {
    read_quads(input.as_bytes())
}

/// Parse one line. Returns `None` for blank and comment lines.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Quad>, NQuadsError> {
    let mut cursor = Cursor {
        chars: line.char_indices().peekable(),
        src: line,
        line: line_no,
    };
    cursor.skip_ws();
    match cursor.peek() {
        None | Some('#') => return Ok(None),
        _ => {}
    }

    let subject = cursor.term()?;
    if matches!(subject, Term::Literal(_)) {
        return Err(cursor.error("literal in subject position"));
    }
    cursor.skip_ws();
    let predicate = match cursor.term()? {
        Term::Iri(iri) => iri,
        _ => return Err(cursor.error("predicate must be an IRI")),
    };
    cursor.skip_ws();
    let object = cursor.term()?;
    cursor.skip_ws();
    if cursor.peek() == Some('.') {
        return Err(cursor.error("missing graph name"));
    }
    let graph = cursor.term()?;
    if matches!(graph, Term::Literal(_)) {
        return Err(cursor.error("literal in graph position"));
    }
    cursor.skip_ws();
    if cursor.next() != Some('.') {
        return Err(cursor.error("expected '.'"));
    }
    cursor.skip_ws();
    match cursor.peek() {
        None | Some('#') => Ok(Some(Quad {
            subject,
            predicate,
            object,
            graph,
        })),
        Some(c) => Err(cursor.error(&format!("unexpected '{}' after statement", c))),
    }
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn next(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn pos(&mut self) -> usize {
        self.chars.peek().map(|(i, _)| *i).unwrap_or(self.src.len())
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.next();
        }
    }

    fn error(&self, message: &str) -> NQuadsError {
        NQuadsError::Syntax {
            line: self.line,
            message: message.to_string(),
        }
    }

    fn term(&mut self) -> Result<Term, NQuadsError> {
        match self.peek() {
            Some('<') => Ok(Term::Iri(self.iri()?)),
            Some('_') => self.blank(),
            Some('"') => self.literal(),
            Some(c) => Err(self.error(&format!("unexpected '{}'", c))),
            None => Err(self.error("unexpected end of line")),
        }
    }

    fn iri(&mut self) -> Result<Iri, NQuadsError> {
        self.next();
        let mut text = String::new();
        loop {
            match self.next() {
                Some('>') => break,
                Some('\\') => {
                    let c = match self.next() {
                        Some('u') => self.hex_escape(4)?,
                        Some('U') => self.hex_escape(8)?,
                        _ => return Err(self.error("invalid escape in IRI")),
                    };
                    text.push(c);
                }
                None => return Err(self.error("unterminated IRI")),
                Some(c) if forbidden_in_iri(c) => {
                    return Err(self.error(&format!("'{}' not allowed in IRI", c.escape_default())))
                }
                Some(c) => text.push(c),
            }
        }
        if text.is_empty() {
            return Err(self.error("empty IRI"));
        }
        Ok(Iri::new(text))
    }

    fn blank(&mut self) -> Result<Term, NQuadsError> {
        self.next();
        if self.next() != Some(':') {
            return Err(self.error("expected ':' after '_'"));
        }
        let start = self.pos();
        let src: &'a str = self.src;
        let rest = &src[start..];
        let scanned = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-' || c == '.'))
            .unwrap_or(rest.len());
        // a trailing '.' terminates the statement, not the label
        let label = rest[..scanned].trim_end_matches('.');
        if label.is_empty() {
            return Err(self.error("empty blank node label"));
        }
        let end = start + label.len();
        while self.pos() < end {
            self.next();
        }
        Ok(Term::Blank(BlankId::new(label)))
    }

    fn literal(&mut self) -> Result<Term, NQuadsError> {
        self.next();
        let mut lexical = String::new();
        loop {
            match self.next() {
                Some('"') => break,
                Some('\\') => lexical.push(self.escape()?),
                Some(c) => lexical.push(c),
                None => return Err(self.error("unterminated literal")),
            }
        }
        match self.peek() {
            Some('@') => {
                self.next();
                let start = self.pos();
                while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '-') {
                    self.next();
                }
                let end = self.pos();
                if start == end {
                    return Err(self.error("empty language tag"));
                }
                Ok(Term::Literal(Literal::lang(lexical, &self.src[start..end])))
            }
            Some('^') => {
                self.next();
                if self.next() != Some('^') {
                    return Err(self.error("expected '^^'"));
                }
                if self.peek() != Some('<') {
                    return Err(self.error("datatype must be an IRI"));
                }
                let datatype = self.iri()?;
                Ok(Term::Literal(Literal::typed(lexical, datatype)))
            }
            _ => Ok(Term::Literal(Literal::string(lexical))),
        }
    }

    fn escape(&mut self) -> Result<char, NQuadsError> {
        match self.next() {
            Some('"') => Ok('"'),
            Some('\\') => Ok('\\'),
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('b') => Ok('\u{8}'),
            Some('f') => Ok('\u{c}'),
            Some('\'') => Ok('\''),
            Some('u') => self.hex_escape(4),
            Some('U') => self.hex_escape(8),
            _ => Err(self.error("invalid escape sequence")),
        }
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, NQuadsError> {
        let mut value = 0u32;
        for _ in 0..digits {
            let digit = self
                .next()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid hex digit in escape"))?;
            value = value * 16 + digit;
        }
        char::from_u32(value).ok_or_else(|| self.error("escape is not a valid code point"))
    }
}
