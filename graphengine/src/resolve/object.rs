//! Runtime field-resolver registry: the `Object` a request's root types (and
//! every object-typed field result) are represented as. Mirrors
//! `original_source/include/graphqlservice/GraphQLService.h`'s `Object`
//! base class, which holds a name→resolver map plus the set of type names
//! the instance satisfies, except resolvers here are plain closures rather
//! than virtual getters (there is no code-generated subclass per object
//! type at this layer; `graphengine_codegen` emits the closures instead).

use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use indexmap::IndexMap;

use crate::ast::{self, SelectionSet};
use crate::error::ExecutionError;
use crate::value::{Object as ResponseObject, Value};
use crate::value_visitor::Variables;

use super::directives::DirectiveState;
use super::request::ResolveMode;

pub type FragmentMap = IndexMap<String, ast::Fragment>;

pub type FieldFuture<'a> = BoxFuture<'a, Result<Value, ExecutionError>>;

/// The arguments passed to a field resolver closure. Borrowed for the
/// duration of the call so recursive `Object::resolve` calls into nested
/// object-typed fields can reuse the same fragment/variable tables without
/// cloning them per field.
pub struct FieldContext<'a, S> {
    pub arguments: ResponseObject,
    pub selection: Option<&'a SelectionSet>,
    pub fragments: &'a FragmentMap,
    pub variables: &'a Variables,
    pub directives: &'a DirectiveState,
    pub state: &'a S,
}

pub type FieldResolverFn<S> = Arc<dyn for<'a> Fn(FieldContext<'a, S>) -> FieldFuture<'a> + Send + Sync>;

/// The subset of [`FieldContext`] a field resolver needs to recurse into its
/// own nested selection set (`arguments` is omitted: a generated resolver
/// receives those pre-parsed as a typed argument struct instead). Used by
/// `graphengine_codegen`-emitted resolver traits for Object/Interface/Union-
/// typed fields, and by hand-written resolvers like `introspection.rs`'s
/// that recurse the same way.
pub struct SelectionContext<'a, S> {
    pub selection: Option<&'a SelectionSet>,
    pub fragments: &'a FragmentMap,
    pub variables: &'a Variables,
    pub directives: &'a DirectiveState,
    pub state: &'a S,
}

impl<'a, S> FieldContext<'a, S> {
    pub fn selection_context(&self) -> SelectionContext<'a, S> {
        SelectionContext { selection: self.selection, fragments: self.fragments, variables: self.variables, directives: self.directives, state: self.state }
    }
}

/// A resolvable object: the set of type names it satisfies (its own name
/// first, followed by interfaces/unions) and a field-name → resolver map.
/// Cheaply `Clone` (an `Arc` bump per resolver) so a root registered with a
/// [`crate::service::Service`] can also be handed to the subscription
/// registry as its default event root.
#[derive(Clone)]
pub struct Object<S> {
    type_names: Vec<String>,
    resolvers: IndexMap<String, FieldResolverFn<S>>,
}

impl<S> Object<S>
where
    S: Send + Sync,
{
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut resolvers: IndexMap<String, FieldResolverFn<S>> = IndexMap::new();
        let typename = name.clone();
        resolvers.insert(
            "__typename".to_owned(),
            Arc::new(move |_ctx: FieldContext<'_, S>| {
                let value = Value::String(typename.clone());
                Box::pin(async move { Ok(value) }) as FieldFuture<'_>
            }),
        );
        Object { type_names: vec![name], resolvers }
    }

    /// Declares that this object also satisfies `interface_or_union`, so
    /// fragments with that type condition are not skipped against it.
    pub fn implements(mut self, interface_or_union: impl Into<String>) -> Self {
        self.type_names.push(interface_or_union.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, resolver: FieldResolverFn<S>) -> Self {
        self.resolvers.insert(name.into(), resolver);
        self
    }

    pub fn name(&self) -> &str {
        &self.type_names[0]
    }

    pub fn type_names(&self) -> &[String] {
        &self.type_names
    }

    pub fn satisfies(&self, type_condition: &str) -> bool {
        self.type_names.iter().any(|n| n == type_condition)
    }

    /// Walks `selection_set` against this object, dispatching each `Field`
    /// to its registered resolver and splicing in `FragmentSpread`/
    /// `InlineFragment` children whose type condition this object satisfies.
    /// Field-level failures are appended to `errors` and surface as `Null`
    /// in the assembled map rather than aborting sibling resolution. In
    /// `ResolveMode::Async`, sibling selections within a selection set run
    /// concurrently (§5); `Deferred` runs them in selection-set order on the
    /// current task. Either way the assembled map preserves selection order
    /// regardless of completion order.
    pub fn resolve<'a>(
        &'a self,
        selection_set: &'a SelectionSet,
        fragments: &'a FragmentMap,
        variables: &'a Variables,
        directive_state: &'a DirectiveState,
        state: &'a S,
        mode: ResolveMode,
        errors: &'a mut Vec<ExecutionError>,
    ) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let mut result = ResponseObject::new();
            self.resolve_into(selection_set, fragments, variables, directive_state, state, mode, errors, &mut result)
                .await;
            Value::Map(result)
        })
    }

    fn resolve_into<'a>(
        &'a self,
        selection_set: &'a SelectionSet,
        fragments: &'a FragmentMap,
        variables: &'a Variables,
        directive_state: &'a DirectiveState,
        state: &'a S,
        mode: ResolveMode,
        errors: &'a mut Vec<ExecutionError>,
        result: &'a mut ResponseObject,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            match mode {
                ResolveMode::Deferred => {
                    for selection in selection_set {
                        self.resolve_selection(selection, fragments, variables, directive_state, state, mode, errors, result)
                            .await;
                    }
                }
                ResolveMode::Async => {
                    let parts = join_all(selection_set.iter().map(|selection| async move {
                        let mut local_result = ResponseObject::new();
                        let mut local_errors = Vec::new();
                        self.resolve_selection(
                            selection,
                            fragments,
                            variables,
                            directive_state,
                            state,
                            mode,
                            &mut local_errors,
                            &mut local_result,
                        )
                        .await;
                        (local_result, local_errors)
                    }))
                    .await;
                    for (local_result, mut local_errors) in parts {
                        for (name, value) in local_result {
                            result.add_field(name, value);
                        }
                        errors.append(&mut local_errors);
                    }
                }
            }
        })
    }

    fn resolve_selection<'a>(
        &'a self,
        selection: &'a ast::Selection,
        fragments: &'a FragmentMap,
        variables: &'a Variables,
        directive_state: &'a DirectiveState,
        state: &'a S,
        mode: ResolveMode,
        errors: &'a mut Vec<ExecutionError>,
        result: &'a mut ResponseObject,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            match selection {
                ast::Selection::Field(field) => {
                    self.resolve_field(field, fragments, variables, directive_state, state, errors, result).await;
                }
                ast::Selection::FragmentSpread(spread) => {
                    self.resolve_fragment_spread(spread, fragments, variables, directive_state, state, mode, errors, result)
                        .await;
                }
                ast::Selection::InlineFragment(inline) => {
                    self.resolve_inline_fragment(inline, fragments, variables, directive_state, state, mode, errors, result)
                        .await;
                }
            }
        })
    }

    async fn resolve_field<'a>(
        &'a self,
        field: &'a crate::span::Spanning<ast::Field>,
        fragments: &'a FragmentMap,
        variables: &'a Variables,
        directive_state: &'a DirectiveState,
        state: &'a S,
        errors: &mut Vec<ExecutionError>,
        result: &mut ResponseObject,
    ) {
        let f = &field.item;
        match super::directives::should_skip(&f.directives, variables) {
            Ok(true) => return,
            Ok(false) => {}
            Err(err) => {
                errors.push(super::directives::field_level(err));
                return;
            }
        }

        // The field's own children selection set starts a fresh nesting level
        // (§4.5): fragment-definition/fragment-spread directive sets reset,
        // inline-fragment survives, then the field's own directives apply.
        let field_state = directive_state.descend().with_field(&f.directives);

        let Some(resolver) = self.resolvers.get(f.name.item.as_str()) else {
            errors.push(
                ExecutionError::new(format!("Unknown field {} on {}", f.name.item, self.name()), field.span)
                    .with_path(vec![crate::error::PathSegment::Field(f.response_key().to_owned())]),
            );
            result.add_field(f.response_key(), Value::Null);
            return;
        };

        let mut arguments = ResponseObject::new();
        let mut argument_error = None;
        for arg in f.arguments.iter() {
            match crate::value_visitor::visit_value(&arg.value.item, arg.value.span, variables) {
                Ok(v) => {
                    arguments.add_field(arg.name.item.clone(), v);
                }
                Err(err) => {
                    argument_error = Some(err);
                    break;
                }
            }
        }
        if let Some(err) = argument_error {
            errors.push(err.into());
            result.add_field(f.response_key(), Value::Null);
            return;
        }

        let ctx = FieldContext {
            arguments,
            selection: f.selection_set.as_ref(),
            fragments,
            variables,
            directives: &field_state,
            state,
        };

        match resolver(ctx).await {
            Ok(value) => {
                result.add_field(f.response_key(), value);
            }
            Err(mut err) => {
                if err.path.is_empty() {
                    err = err.with_path(vec![crate::error::PathSegment::Field(f.response_key().to_owned())]);
                }
                errors.push(err);
                result.add_field(f.response_key(), Value::Null);
            }
        }
    }

    async fn resolve_fragment_spread<'a>(
        &'a self,
        spread: &'a crate::span::Spanning<ast::FragmentSpread>,
        fragments: &'a FragmentMap,
        variables: &'a Variables,
        directive_state: &'a DirectiveState,
        state: &'a S,
        mode: ResolveMode,
        errors: &mut Vec<ExecutionError>,
        result: &mut ResponseObject,
    ) {
        let s = &spread.item;
        match super::directives::should_skip(&s.directives, variables) {
            Ok(true) => return,
            Ok(false) => {}
            Err(err) => {
                errors.push(super::directives::field_level(err));
                return;
            }
        }

        let Some(fragment) = fragments.get(s.name.item.as_str()) else {
            errors.push(ExecutionError::new(format!("Unknown fragment {}", s.name.item), spread.span));
            return;
        };

        if !self.satisfies(&fragment.type_condition.item) {
            return;
        }

        let nested_state = directive_state
            .merge_fragment_spread(&s.directives)
            .merge_fragment_definition(&fragment.directives);

        self.resolve_into(&fragment.selection_set, fragments, variables, &nested_state, state, mode, errors, result)
            .await;
    }

    async fn resolve_inline_fragment<'a>(
        &'a self,
        inline: &'a crate::span::Spanning<ast::InlineFragment>,
        fragments: &'a FragmentMap,
        variables: &'a Variables,
        directive_state: &'a DirectiveState,
        state: &'a S,
        mode: ResolveMode,
        errors: &mut Vec<ExecutionError>,
        result: &mut ResponseObject,
    ) {
        let i = &inline.item;
        match super::directives::should_skip(&i.directives, variables) {
            Ok(true) => return,
            Ok(false) => {}
            Err(err) => {
                errors.push(super::directives::field_level(err));
                return;
            }
        }

        if let Some(type_condition) = &i.type_condition {
            if !self.satisfies(&type_condition.item) {
                return;
            }
        }

        let nested_state = directive_state.merge_inline_fragment(&i.directives);
        self.resolve_into(&i.selection_set, fragments, variables, &nested_state, state, mode, errors, result).await;
    }
}
