//! Query and schema-document parsing: lexer, recursive-descent grammar, and
//! the two public entry points (`parse_document_source`,
//! `parse_document_file`).

mod grammar;
mod lexer;

pub use self::grammar::Parser;
pub use self::lexer::{Lexer, LexerError, Token};

use std::fs;
use std::path::Path;

use crate::ast::Document;
use crate::error::ParseError;

/// Parses a document held entirely in memory. `file_id` lets callers tell
/// spans from different documents (e.g. a request versus its schema) apart
/// when both flow into the same error list.
pub fn parse_document_source(source: &str, file_id: u32) -> Result<Document, ParseError> {
    Parser::new(source, file_id).parse_document()
}

/// Reads `path` and parses it, mapping I/O failures into a [`ParseError`]
/// with no span rather than panicking.
pub fn parse_document_file(path: impl AsRef<Path>, file_id: u32) -> Result<Document, ParseError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)
        .map_err(|err| ParseError::new(format!("failed to read {}: {err}", path.display()), crate::span::Span::unlocated()))?;
    parse_document_source(&source, file_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_from_memory() {
        let doc = parse_document_source("{ a }", 0).unwrap();
        assert_eq!(doc.definitions.len(), 1);
    }

    #[test]
    fn reports_missing_file_as_parse_error() {
        let err = parse_document_file("/nonexistent/does-not-exist.graphql", 0).unwrap_err();
        assert!(err.message.contains("failed to read"));
    }
}
