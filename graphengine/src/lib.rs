//! A schema-first GraphQL service engine: parse a query document, validate
//! it against an in-memory schema, and resolve it against a tree of
//! user-registered field resolvers — plus first-class introspection and
//! subscription delivery.
//!
//! [`service::Service`] is the entry point most callers want; the other
//! modules are its building blocks and are also usable standalone (e.g. a
//! caller that only needs the parser, or wants to drive `resolve()` without
//! the subscription machinery).

pub mod ast;
pub mod base64;
pub mod error;
pub mod introspection;
pub mod parser;
pub mod resolve;
pub mod schema;
pub mod service;
pub mod span;
pub mod subscriptions;
pub mod validation;
pub mod value;
pub mod value_visitor;

pub use error::{RequestError, RequestResult};
pub use resolve::{Object, OperationRoots, ResolveMode, Response};
pub use schema::{Schema, SchemaBuilder};
pub use service::{Operations, Service};
pub use subscriptions::{SubscribeParams, SubscriptionCallback, SubscriptionKey, SubscriptionRegistry};
