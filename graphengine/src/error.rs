//! Error kinds raised across the parser, schema, validator, and resolver.
//!
//! Request-level failures are modeled as `Result` returns throughout this
//! crate; field-level failures are captured as [`ExecutionError`] values and
//! folded into a response's `errors` array instead of aborting the request.

use derive_more::{Display, Error, From};

use crate::span::Span;

/// Failure raised while lexing or parsing a document.
#[derive(Clone, Debug, Display, Error, PartialEq)]
#[display("{message}")]
pub struct ParseError {
    pub message: String,
    pub spans: Vec<Span>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        ParseError { message: message.into(), spans: vec![span] }
    }
}

/// One structured error produced by the validator.
#[derive(Clone, Debug, Display, PartialEq)]
#[display("{message}")]
pub struct SchemaError {
    pub message: String,
    pub spans: Vec<Span>,
}

impl SchemaError {
    pub fn new(message: impl Into<String>, spans: Vec<Span>) -> Self {
        SchemaError { message: message.into(), spans }
    }

    pub fn at(message: impl Into<String>, span: Span) -> Self {
        SchemaError::new(message, vec![span])
    }
}

/// Failure building or querying a [`crate::schema::Schema`].
#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum SchemaBuildError {
    #[display("type not found: {name}")]
    TypeNotFound { name: String },
    #[display("type already registered: {name}")]
    DuplicateType { name: String },
    #[display("directive already registered: {name}")]
    DuplicateDirective { name: String },
}

/// Failure decoding or encoding a Base64 `ID` scalar.
#[derive(Clone, Copy, Debug, Display, Error, PartialEq, Eq)]
pub enum Base64Error {
    #[display("invalid base64 length")]
    InvalidLength,
    #[display("invalid base64 padding")]
    InvalidPadding,
    #[display("invalid base64 character")]
    InvalidCharacter,
}

/// A single field-scoped execution failure. Collected into the response
/// `errors` array; never aborts sibling resolution on its own.
#[derive(Clone, Debug, Display, PartialEq)]
#[display("{message}")]
pub struct ExecutionError {
    pub message: String,
    pub locations: Vec<Span>,
    pub path: Vec<PathSegment>,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        ExecutionError { message: message.into(), locations: vec![span], path: Vec::new() }
    }

    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }
}

/// Failure converting an AST [`crate::ast::Value`] into a Response
/// [`crate::value::Value`].
#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum ValueVisitorError {
    #[display("variable ${name} is not defined")]
    UnknownVariable { name: String, span: Span },

    #[display("input object field {name} is specified more than once")]
    DuplicateField { name: String, span: Span },
}

impl ValueVisitorError {
    pub fn span(&self) -> Span {
        match self {
            ValueVisitorError::UnknownVariable { span, .. } => *span,
            ValueVisitorError::DuplicateField { span, .. } => *span,
        }
    }
}

impl From<ValueVisitorError> for ExecutionError {
    fn from(err: ValueVisitorError) -> Self {
        let span = err.span();
        ExecutionError::new(err.to_string(), span)
    }
}

/// One segment of a response error path: either a field name or a list index.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum PathSegment {
    #[display("{_0}")]
    Field(String),
    #[display("{_0}")]
    Index(usize),
}

/// Request-level failure surfaced by the [`crate::resolve::Request`] /
/// [`crate::service::Service`] boundary. Distinct from [`ExecutionError`],
/// which is field-scoped and never aborts the whole request.
#[derive(Clone, Debug, Display, Error, From, PartialEq)]
pub enum RequestError {
    #[display("{_0}")]
    Parse(ParseError),

    #[display("validation failed with {} error(s)", _0.len())]
    Validation(#[error(not(source))] Vec<SchemaError>),

    #[display("no operation named {name:?} was found")]
    UnknownOperation { name: String },

    #[display("the document declares multiple operations named {name:?}")]
    DuplicateOperation { name: String },

    #[display("the document has more than one anonymous operation")]
    MissingOperation,

    #[display("the schema does not support the {operation} operation")]
    UnsupportedOperation { operation: &'static str },

    #[display("{_0}")]
    Base64(Base64Error),

    #[display("{message}")]
    SchemaException { message: String },
}

impl RequestError {
    pub fn schema_exception(message: impl Into<String>) -> Self {
        RequestError::SchemaException { message: message.into() }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
pub type ValidationResult = Result<(), Vec<SchemaError>>;
pub type RequestResult<T> = Result<T, RequestError>;
