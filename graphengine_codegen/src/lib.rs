//! Reads a schema document and emits the resolver-skeleton source pair
//! described in SPEC_FULL.md §4.7: `Classified` → `Resolved` (two-pass
//! type resolution, §11.4) feeding `emit::generate` (text rendering).
//! `graphengine-codegen` (in `src/bin/`) wraps this in a CLI.

pub mod args;
pub mod emit;
pub mod error;
pub mod model;

use graphengine::ast::Document;

use error::CodegenResult;
use model::{Classified, Resolved};

pub use emit::GeneratedArtifacts;
pub use error::CodegenError;

/// Runs the full pipeline against an already-parsed document: classify,
/// resolve, emit. Parsing is left to the caller (`bin/graphengine_codegen.rs`
/// parses both the server schema and, for the client variant, a request
/// document) so this entry point stays reusable from a test or another tool.
pub fn generate_from_document(document: &Document, namespace: &str, supports_introspection: bool) -> CodegenResult<GeneratedArtifacts> {
    let classified = Classified::build(document)?;
    let resolved = Resolved::build(document, &classified)?;
    Ok(emit::generate(&resolved, namespace, supports_introspection))
}

/// Parses `schema_source` and runs [`generate_from_document`] against it.
pub fn generate(schema_source: &str, namespace: &str, supports_introspection: bool) -> CodegenResult<GeneratedArtifacts> {
    let document = graphengine::parser::parse_document_source(schema_source, 0)?;
    generate_from_document(&document, namespace, supports_introspection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_declarations_and_definitions_for_a_minimal_schema() {
        let artifacts = generate(
            r#"
            type Query {
                greeting(name: String = "world"): String!
            }
            "#,
            "demo",
            true,
        )
        .unwrap();
        assert!(artifacts.declarations.contains("pub trait QueryResolver"));
        assert!(artifacts.definitions.contains("pub fn build_query_object"));
        assert!(artifacts.definitions.contains("pub fn build_schema"));
    }

    #[test]
    fn rejects_a_schema_with_no_query_root() {
        let err = generate("type Mutation { noop: Boolean }", "demo", true).unwrap_err();
        assert!(matches!(err, CodegenError::InvalidSchema { .. }));
    }
}
