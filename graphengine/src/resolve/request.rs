//! The top-level `resolve()` pipeline (§4.5 steps 1-6): collect fragments,
//! select the operation, build the variables map, dispatch to the root
//! object, and wrap the outcome in the `{"data": ..., "errors": [...] }`
//! envelope.

use std::collections::HashMap;

use crate::ast::{self, Document, OperationType};
use crate::error::{ExecutionError, RequestError, RequestResult};
use crate::value::{Object as ResponseObject, Value};
use crate::value_visitor::{self, Variables};

use super::directives::DirectiveState;
use super::object::{FragmentMap, Object};

/// Field resolution concurrency (§5). `Deferred` runs sibling fields
/// in-order on the current task; `Async` is reserved for callers that want
/// to fan sibling futures out with `futures::future::join_all` themselves —
/// the core engine's own traversal is already non-blocking either way since
/// every resolver call is awaited in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveMode {
    Deferred,
    Async,
}

/// The assembled `{"data": ..., "errors": [...] }` envelope (§6.3).
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub data: Option<Value>,
    pub errors: Vec<ExecutionError>,
}

impl Response {
    pub fn into_value(self) -> Value {
        let mut object = ResponseObject::new();
        object.add_field("data", self.data.unwrap_or(Value::Null));
        if !self.errors.is_empty() {
            let errors = self
                .errors
                .into_iter()
                .map(|err| {
                    let mut entry = ResponseObject::new();
                    entry.add_field("message", Value::String(err.message));
                    let locations: Vec<Value> = err
                        .locations
                        .into_iter()
                        .map(|span| {
                            let mut loc = ResponseObject::new();
                            loc.add_field("line", Value::Int(span.start.line as i32));
                            loc.add_field("column", Value::Int(span.start.column as i32));
                            Value::Map(loc)
                        })
                        .collect();
                    entry.add_field("locations", Value::List(locations));
                    let path: Vec<Value> = err
                        .path
                        .into_iter()
                        .map(|segment| match segment {
                            crate::error::PathSegment::Field(name) => Value::String(name),
                            crate::error::PathSegment::Index(index) => Value::Int(index as i32),
                        })
                        .collect();
                    entry.add_field("path", Value::List(path));
                    Value::Map(entry)
                })
                .collect();
            object.add_field("errors", Value::List(errors));
        }
        Value::Map(object)
    }
}

pub(crate) fn collect_fragments(document: &Document) -> FragmentMap {
    document.fragments().map(|f| (f.item.name.item.clone(), f.item.clone())).collect()
}

pub(crate) fn select_operation<'a>(document: &'a Document, operation_name: &str) -> RequestResult<&'a ast::Operation> {
    let mut operations = document.operations();
    if operation_name.is_empty() {
        let first = operations.next().map(|op| &op.item);
        if operations.next().is_some() {
            return Err(RequestError::MissingOperation);
        }
        first.ok_or(RequestError::MissingOperation)
    } else {
        let mut matches = document.operations().filter(|op| op.item.name() == operation_name);
        let first = matches.next().map(|op| &op.item);
        if matches.next().is_some() {
            return Err(RequestError::DuplicateOperation { name: operation_name.to_owned() });
        }
        first.ok_or_else(|| RequestError::UnknownOperation { name: operation_name.to_owned() })
    }
}

/// Builds the operation's variables map: caller-supplied values win, then
/// the parsed default, else `Null` (the validator has already rejected a
/// missing non-null variable with no default).
pub(crate) fn build_variables(
    operation: &ast::Operation,
    provided: &HashMap<String, Value>,
) -> RequestResult<Variables> {
    let mut variables = Variables::new();
    for def in operation.variable_definitions.iter() {
        let name = &def.name.item;
        if let Some(value) = provided.get(name) {
            variables.insert(name.clone(), value.clone());
        } else if let Some(default) = &def.default_value {
            let value = value_visitor::visit_value(&default.item, default.span, &variables)
                .map_err(|err| RequestError::schema_exception(err.to_string()))?;
            variables.insert(name.clone(), value);
        } else {
            variables.insert(name.clone(), Value::Null);
        }
    }
    Ok(variables)
}

/// The root objects a [`crate::service::Service`] registers, one per
/// operation type it supports (§6.2's `operations_map`).
pub struct OperationRoots<'a, S> {
    pub query: Option<&'a Object<S>>,
    pub mutation: Option<&'a Object<S>>,
    pub subscription: Option<&'a Object<S>>,
}

impl<'a, S> OperationRoots<'a, S> {
    fn for_operation(&self, operation_type: OperationType) -> Option<&'a Object<S>> {
        match operation_type {
            OperationType::Query => self.query,
            OperationType::Mutation => self.mutation,
            OperationType::Subscription => self.subscription,
        }
    }
}

/// Executes `document`'s `operation_name` operation (or the sole anonymous
/// one) against the root object registered for its operation type. `mode`
/// selects whether sibling fields within a selection set resolve
/// concurrently (§5).
pub async fn resolve<S>(
    roots: &OperationRoots<'_, S>,
    state: &S,
    document: &Document,
    operation_name: &str,
    provided_variables: HashMap<String, Value>,
    mode: ResolveMode,
) -> RequestResult<Response>
where
    S: Send + Sync,
{
    let fragments = collect_fragments(document);
    let operation = select_operation(document, operation_name)?;
    let variables = build_variables(operation, &provided_variables)?;

    let root = roots.for_operation(operation.operation_type).ok_or_else(|| RequestError::UnsupportedOperation {
        operation: operation.operation_type.as_str(),
    })?;

    let root_directive_state = DirectiveState { operation: to_directive_set(&operation.directives), ..Default::default() };

    let mut errors = Vec::new();
    let data = root
        .resolve(&operation.selection_set, &fragments, &variables, &root_directive_state, state, mode, &mut errors)
        .await;

    Ok(Response { data: Some(data), errors })
}

pub(crate) fn to_directive_set(directives: &ast::Directives) -> super::directives::DirectiveSet {
    directives.iter().map(|d| (d.name.item.clone(), d.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_operation_rejects_duplicate_names() {
        let document = crate::parser::parse_document_source("query A { a } query A { b }", 0).unwrap();
        let err = select_operation(&document, "A").unwrap_err();
        assert!(matches!(err, RequestError::DuplicateOperation { .. }));
    }

    #[test]
    fn select_operation_rejects_multiple_anonymous() {
        let document = crate::parser::parse_document_source("{ a } { b }", 0).unwrap();
        let err = select_operation(&document, "").unwrap_err();
        assert!(matches!(err, RequestError::MissingOperation));
    }

    #[test]
    fn select_operation_finds_named() {
        let document = crate::parser::parse_document_source("query A { a } query B { b }", 0).unwrap();
        let op = select_operation(&document, "B").unwrap();
        assert_eq!(op.name(), "B");
    }
}
