//! Failures raised while classifying, resolving, or emitting a schema.
//! Mirrors `graphengine::error`'s style: plain structs/enums via
//! `derive_more`, no `anyhow` below the library boundary (the binary layers
//! `anyhow` on top for I/O).

use derive_more::{Display, Error, From};

use graphengine::error::{ParseError, SchemaBuildError};

/// Raised by `model::Classified`/`model::Resolved` (§4.7's `InvalidSchema`).
#[derive(Clone, Debug, Display, Error, From, PartialEq)]
pub enum CodegenError {
    #[display("schema parse error: {_0}")]
    Parse(ParseError),

    #[display("invalid schema: {message}")]
    #[from(ignore)]
    InvalidSchema { message: String },

    #[display("failed to assemble generated schema: {_0}")]
    SchemaBuild(SchemaBuildError),
}

impl CodegenError {
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        CodegenError::InvalidSchema { message: message.into() }
    }
}

pub type CodegenResult<T> = Result<T, CodegenError>;
