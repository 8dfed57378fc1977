//! First-class `__schema`/`__type` resolvers built directly off the in-memory
//! [`Schema`] model (§9's Open Question, resolved per SPEC_FULL.md §11.3:
//! ordinary [`Object`] resolvers rather than a self-issued introspection
//! query). Method names below (`get_types`, `get_query_type`, `get_kind`,
//! `get_fields`, `get_of_type`, ...) carry over
//! `original_source/Introspection.h`'s virtual-getter names, translated into
//! plain functions over `&Schema`.

use std::sync::Arc;

use crate::resolve::object::FieldFuture;
use crate::resolve::{FieldContext, Object};
use crate::schema::{DirectiveDef, EnumValueDef, Field, InputValueDef, Schema, TypeDef, TypeRef, TypeShape};
use crate::value::{Object as ResponseObject, Value};

fn get_kind(schema: &Schema, type_ref: TypeRef) -> &'static str {
    match schema.shape(type_ref) {
        TypeShape::Scalar(_) => "SCALAR",
        TypeShape::Object(_) => "OBJECT",
        TypeShape::Interface(_) => "INTERFACE",
        TypeShape::Union(_) => "UNION",
        TypeShape::Enum(_) => "ENUM",
        TypeShape::InputObject(_) => "INPUT_OBJECT",
        TypeShape::List(_) => "LIST",
        TypeShape::NonNull(_) => "NON_NULL",
    }
}

fn get_name(schema: &Schema, type_ref: TypeRef) -> Option<String> {
    schema.type_def(type_ref).map(|t| t.name().to_owned())
}

fn get_description(schema: &Schema, type_ref: TypeRef) -> Option<String> {
    match schema.type_def(type_ref)? {
        TypeDef::Scalar(t) => t.description.clone(),
        TypeDef::Object(t) => t.description.clone(),
        TypeDef::Interface(t) => t.description.clone(),
        TypeDef::Union(t) => t.description.clone(),
        TypeDef::Enum(t) => t.description.clone(),
        TypeDef::InputObject(t) => t.description.clone(),
    }
}

fn get_fields(schema: &Schema, type_ref: TypeRef) -> Vec<Field> {
    schema.type_def(type_ref).and_then(TypeDef::fields).map(<[Field]>::to_vec).unwrap_or_default()
}

fn get_interfaces(schema: &Schema, type_ref: TypeRef) -> Vec<TypeRef> {
    match schema.type_def(type_ref) {
        Some(TypeDef::Object(t)) => t.interfaces.clone(),
        _ => Vec::new(),
    }
}

fn get_possible_types(schema: &Schema, type_ref: TypeRef) -> Vec<TypeRef> {
    match schema.type_def(type_ref) {
        Some(TypeDef::Union(t)) => t.possible_types.clone(),
        Some(TypeDef::Interface(_)) => schema
            .type_names()
            .filter_map(|name| schema.lookup(name).ok())
            .filter(|&candidate| get_interfaces(schema, candidate).contains(&type_ref))
            .collect(),
        _ => Vec::new(),
    }
}

fn get_enum_values(schema: &Schema, type_ref: TypeRef) -> Vec<EnumValueDef> {
    match schema.type_def(type_ref) {
        Some(TypeDef::Enum(t)) => t.values.clone(),
        _ => Vec::new(),
    }
}

fn get_input_fields(schema: &Schema, type_ref: TypeRef) -> Vec<InputValueDef> {
    match schema.type_def(type_ref) {
        Some(TypeDef::InputObject(t)) => t.fields.clone(),
        _ => Vec::new(),
    }
}

fn get_of_type(schema: &Schema, type_ref: TypeRef) -> Option<TypeRef> {
    match schema.shape(type_ref) {
        TypeShape::List(inner) | TypeShape::NonNull(inner) => Some(inner),
        _ => None,
    }
}

/// Builds the `__Type` object for `type_ref`. Generic over the request
/// state `S` purely so it composes with the caller's `Object<S>` tree; the
/// closures here never touch it, only the captured `Arc<Schema>`.
pub fn type_object<S>(schema: Arc<Schema>, type_ref: TypeRef) -> Object<S>
where
    S: Send + Sync + 'static,
{
    let object = Object::new("__Type");

    let s = schema.clone();
    let object = object.field(
        "kind",
        std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let value = Value::Enum(get_kind(&s, type_ref).to_owned());
            Box::pin(async move { Ok(value) })
        }),
    );

    let s = schema.clone();
    let object = object.field(
        "name",
        std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let value = get_name(&s, type_ref).map(Value::String).unwrap_or(Value::Null);
            Box::pin(async move { Ok(value) })
        }),
    );

    let s = schema.clone();
    let object = object.field(
        "description",
        std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let value = get_description(&s, type_ref).map(Value::String).unwrap_or(Value::Null);
            Box::pin(async move { Ok(value) })
        }),
    );

    let s = schema.clone();
    let object = object.field(
        "fields",
        std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let schema = s.clone();
            let fields = get_fields(&schema, type_ref);
            Box::pin(async move {
                if fields.is_empty() && !matches!(schema.shape(type_ref), TypeShape::Object(_) | TypeShape::Interface(_)) {
                    return Ok(Value::Null);
                }
                let mut errors = Vec::new();
                let mut items = Vec::with_capacity(fields.len());
                for field in &fields {
                    let child = field_object::<S>(schema.clone(), field.clone());
                    let value = match ctx.selection {
                        Some(selection) => {
                            child.resolve(selection, ctx.fragments, ctx.variables, ctx.directives, ctx.state, crate::resolve::ResolveMode::Deferred, &mut errors).await
                        }
                        None => Value::Null,
                    };
                    items.push(value);
                }
                Ok(Value::List(items))
            })
        }),
    );

    let s = schema.clone();
    let object = object.field(
        "interfaces",
        std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let schema = s.clone();
            let interfaces = get_interfaces(&schema, type_ref);
            Box::pin(resolve_type_list(schema, interfaces, ctx))
        }),
    );

    let s = schema.clone();
    let object = object.field(
        "possibleTypes",
        std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let schema = s.clone();
            let possible = get_possible_types(&schema, type_ref);
            Box::pin(resolve_type_list(schema, possible, ctx))
        }),
    );

    let s = schema.clone();
    let object = object.field(
        "enumValues",
        std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let schema = s.clone();
            let values = get_enum_values(&schema, type_ref);
            Box::pin(async move {
                let mut errors = Vec::new();
                let mut items = Vec::with_capacity(values.len());
                for value in &values {
                    let child = enum_value_object::<S>(value.clone());
                    let v = match ctx.selection {
                        Some(selection) => {
                            child.resolve(selection, ctx.fragments, ctx.variables, ctx.directives, ctx.state, crate::resolve::ResolveMode::Deferred, &mut errors).await
                        }
                        None => Value::Null,
                    };
                    items.push(v);
                }
                Ok(Value::List(items))
            })
        }),
    );

    let s = schema.clone();
    let object = object.field(
        "inputFields",
        std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let schema = s.clone();
            let fields = get_input_fields(&schema, type_ref);
            Box::pin(async move {
                let mut errors = Vec::new();
                let mut items = Vec::with_capacity(fields.len());
                for field in &fields {
                    let child = input_value_object::<S>(schema.clone(), field.clone());
                    let v = match ctx.selection {
                        Some(selection) => {
                            child.resolve(selection, ctx.fragments, ctx.variables, ctx.directives, ctx.state, crate::resolve::ResolveMode::Deferred, &mut errors).await
                        }
                        None => Value::Null,
                    };
                    items.push(v);
                }
                Ok(Value::List(items))
            })
        }),
    );

    let s = schema.clone();
    object.field(
        "ofType",
        std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let schema = s.clone();
            let of_type = get_of_type(&schema, type_ref);
            Box::pin(async move {
                match of_type {
                    Some(inner) => {
                        let child = type_object::<S>(schema, inner);
                        let mut errors = Vec::new();
                        match ctx.selection {
                            Some(selection) => Ok(child
                                .resolve(selection, ctx.fragments, ctx.variables, ctx.directives, ctx.state, crate::resolve::ResolveMode::Deferred, &mut errors)
                                .await),
                            None => Ok(Value::Null),
                        }
                    }
                    None => Ok(Value::Null),
                }
            })
        }),
    )
}

async fn resolve_type_list<S>(
    schema: Arc<Schema>,
    type_refs: Vec<TypeRef>,
    ctx: FieldContext<'_, S>,
) -> Result<Value, crate::error::ExecutionError>
where
    S: Send + Sync + 'static,
{
    let mut errors = Vec::new();
    let mut items = Vec::with_capacity(type_refs.len());
    for type_ref in type_refs {
        let child = type_object::<S>(schema.clone(), type_ref);
        let value = match ctx.selection {
            Some(selection) => {
                child.resolve(selection, ctx.fragments, ctx.variables, ctx.directives, ctx.state, crate::resolve::ResolveMode::Deferred, &mut errors).await
            }
            None => Value::Null,
        };
        items.push(value);
    }
    Ok(Value::List(items))
}

fn field_object<S>(schema: Arc<Schema>, field: Field) -> Object<S>
where
    S: Send + Sync + 'static,
{
    let name = field.name.clone();
    let description = field.description.clone();
    let deprecation_reason = field.deprecation_reason.clone();
    let args = field.args.clone();
    let return_type = field.return_type;

    Object::new("__Field")
        .field("name", std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let value = Value::String(name.clone());
            Box::pin(async move { Ok(value) })
        }))
        .field("description", {
            let description = description.clone();
            std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
                let value = description.clone().map(Value::String).unwrap_or(Value::Null);
                Box::pin(async move { Ok(value) })
            })
        })
        .field("isDeprecated", {
            let deprecated = deprecation_reason.is_some();
            std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| Box::pin(async move { Ok(Value::Bool(deprecated)) }))
        })
        .field("deprecationReason", {
            let deprecation_reason = deprecation_reason.clone();
            std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
                let value = deprecation_reason.clone().map(Value::String).unwrap_or(Value::Null);
                Box::pin(async move { Ok(value) })
            })
        })
        .field("args", {
            let schema = schema.clone();
            let args = args.clone();
            std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
                let schema = schema.clone();
                let args = args.clone();
                Box::pin(async move {
                    let mut errors = Vec::new();
                    let mut items = Vec::with_capacity(args.len());
                    for arg in &args {
                        let child = input_value_object::<S>(schema.clone(), arg.clone());
                        let v = match ctx.selection {
                            Some(selection) => child
                                .resolve(selection, ctx.fragments, ctx.variables, ctx.directives, ctx.state, crate::resolve::ResolveMode::Deferred, &mut errors)
                                .await,
                            None => Value::Null,
                        };
                        items.push(v);
                    }
                    Ok(Value::List(items))
                })
            })
        })
        .field("type", {
            let schema = schema.clone();
            std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
                let child = type_object::<S>(schema.clone(), return_type);
                Box::pin(async move {
                    let mut errors = Vec::new();
                    match ctx.selection {
                        Some(selection) => Ok(child
                            .resolve(selection, ctx.fragments, ctx.variables, ctx.directives, ctx.state, crate::resolve::ResolveMode::Deferred, &mut errors)
                            .await),
                        None => Ok(Value::Null),
                    }
                })
            })
        })
}

fn input_value_object<S>(schema: Arc<Schema>, input_value: InputValueDef) -> Object<S>
where
    S: Send + Sync + 'static,
{
    let name = input_value.name.clone();
    let description = input_value.description.clone();
    let default_value = input_value.default_value.clone();
    let value_type = input_value.value_type;

    Object::new("__InputValue")
        .field("name", std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let value = Value::String(name.clone());
            Box::pin(async move { Ok(value) })
        }))
        .field("description", {
            let description = description.clone();
            std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
                let value = description.clone().map(Value::String).unwrap_or(Value::Null);
                Box::pin(async move { Ok(value) })
            })
        })
        .field("defaultValue", {
            let default_value = default_value.clone();
            std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
                let value = default_value.clone().map(|v| Value::String(v.to_string())).unwrap_or(Value::Null);
                Box::pin(async move { Ok(value) })
            })
        })
        .field("type", {
            let schema = schema.clone();
            std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
                let child = type_object::<S>(schema.clone(), value_type);
                Box::pin(async move {
                    let mut errors = Vec::new();
                    match ctx.selection {
                        Some(selection) => Ok(child
                            .resolve(selection, ctx.fragments, ctx.variables, ctx.directives, ctx.state, crate::resolve::ResolveMode::Deferred, &mut errors)
                            .await),
                        None => Ok(Value::Null),
                    }
                })
            })
        })
}

fn enum_value_object<S>(value: EnumValueDef) -> Object<S>
where
    S: Send + Sync + 'static,
{
    let name = value.name.clone();
    let description = value.description.clone();
    let deprecation_reason = value.deprecation_reason.clone();

    Object::new("__EnumValue")
        .field("name", std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let value = Value::String(name.clone());
            Box::pin(async move { Ok(value) })
        }))
        .field("description", {
            let description = description.clone();
            std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
                let value = description.clone().map(Value::String).unwrap_or(Value::Null);
                Box::pin(async move { Ok(value) })
            })
        })
        .field("isDeprecated", {
            let deprecated = deprecation_reason.is_some();
            std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| Box::pin(async move { Ok(Value::Bool(deprecated)) }))
        })
        .field("deprecationReason", {
            let deprecation_reason = deprecation_reason.clone();
            std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
                let value = deprecation_reason.clone().map(Value::String).unwrap_or(Value::Null);
                Box::pin(async move { Ok(value) })
            })
        })
}

fn directive_object<S>(schema: Arc<Schema>, directive: DirectiveDef) -> Object<S>
where
    S: Send + Sync + 'static,
{
    let name = directive.name.clone();
    let description = directive.description.clone();
    let locations = directive.locations.clone();
    let args = directive.args.clone();

    Object::new("__Directive")
        .field("name", std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let value = Value::String(name.clone());
            Box::pin(async move { Ok(value) })
        }))
        .field("description", {
            let description = description.clone();
            std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
                let value = description.clone().map(Value::String).unwrap_or(Value::Null);
                Box::pin(async move { Ok(value) })
            })
        })
        .field("locations", {
            let locations = locations.clone();
            std::sync::Arc::new(move |_ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
                let value = Value::List(locations.iter().map(|l| Value::Enum(l.as_str().to_owned())).collect());
                Box::pin(async move { Ok(value) })
            })
        })
        .field("args", {
            let schema = schema.clone();
            let args = args.clone();
            std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
                let schema = schema.clone();
                let args = args.clone();
                Box::pin(async move {
                    let mut errors = Vec::new();
                    let mut items = Vec::with_capacity(args.len());
                    for arg in &args {
                        let child = input_value_object::<S>(schema.clone(), arg.clone());
                        let v = match ctx.selection {
                            Some(selection) => child
                                .resolve(selection, ctx.fragments, ctx.variables, ctx.directives, ctx.state, crate::resolve::ResolveMode::Deferred, &mut errors)
                                .await,
                            None => Value::Null,
                        };
                        items.push(v);
                    }
                    Ok(Value::List(items))
                })
            })
        })
}

/// Builds the `__Schema` object (the `__schema` field's result type).
pub fn schema_object<S>(schema: Arc<Schema>) -> Object<S>
where
    S: Send + Sync + 'static,
{
    let object = Object::new("__Schema");

    let s = schema.clone();
    let object = object.field(
        "types",
        std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let schema = s.clone();
            let type_refs: Vec<TypeRef> = schema.type_names().filter_map(|name| schema.lookup(name).ok()).collect();
            Box::pin(resolve_type_list(schema, type_refs, ctx))
        }),
    );

    let s = schema.clone();
    let object = object.field(
        "queryType",
        std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let schema = s.clone();
            let child = type_object::<S>(schema.clone(), schema.query_type());
            Box::pin(async move {
                let mut errors = Vec::new();
                match ctx.selection {
                    Some(selection) => Ok(child
                        .resolve(selection, ctx.fragments, ctx.variables, ctx.directives, ctx.state, crate::resolve::ResolveMode::Deferred, &mut errors)
                        .await),
                    None => Ok(Value::Null),
                }
            })
        }),
    );

    let s = schema.clone();
    let object = object.field(
        "mutationType",
        std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let schema = s.clone();
            Box::pin(async move {
                match schema.mutation_type() {
                    Some(type_ref) => {
                        let child = type_object::<S>(schema.clone(), type_ref);
                        let mut errors = Vec::new();
                        match ctx.selection {
                            Some(selection) => Ok(child
                                .resolve(selection, ctx.fragments, ctx.variables, ctx.directives, ctx.state, crate::resolve::ResolveMode::Deferred, &mut errors)
                                .await),
                            None => Ok(Value::Null),
                        }
                    }
                    None => Ok(Value::Null),
                }
            })
        }),
    );

    let s = schema.clone();
    let object = object.field(
        "subscriptionType",
        std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let schema = s.clone();
            Box::pin(async move {
                match schema.subscription_type() {
                    Some(type_ref) => {
                        let child = type_object::<S>(schema.clone(), type_ref);
                        let mut errors = Vec::new();
                        match ctx.selection {
                            Some(selection) => Ok(child
                                .resolve(selection, ctx.fragments, ctx.variables, ctx.directives, ctx.state, crate::resolve::ResolveMode::Deferred, &mut errors)
                                .await),
                            None => Ok(Value::Null),
                        }
                    }
                    None => Ok(Value::Null),
                }
            })
        }),
    );

    let s = schema.clone();
    object.field(
        "directives",
        std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {
            let schema = s.clone();
            let directives = schema.directives().to_vec();
            Box::pin(async move {
                let mut errors = Vec::new();
                let mut items = Vec::with_capacity(directives.len());
                for directive in &directives {
                    let child = directive_object::<S>(schema.clone(), directive.clone());
                    let value = match ctx.selection {
                        Some(selection) => {
                            child.resolve(selection, ctx.fragments, ctx.variables, ctx.directives, ctx.state, crate::resolve::ResolveMode::Deferred, &mut errors).await
                        }
                        None => Value::Null,
                    };
                    items.push(value);
                }
                Ok(Value::List(items))
            })
        }),
    )
}

/// Looks up a named type for the `__type(name:)` query-root field.
pub fn find_type<S>(schema: Arc<Schema>, name: &str) -> Option<Object<S>>
where
    S: Send + Sync + 'static,
{
    schema.lookup(name).ok().map(|type_ref| type_object(schema, type_ref))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{DirectiveState, FragmentMap};
    use crate::schema::SchemaBuilder;
    use std::collections::HashMap;

    fn sample_schema() -> Arc<Schema> {
        let mut builder = SchemaBuilder::new();
        let query = builder.add_object("Query", None);
        let string_type = builder.lookup("String").unwrap();
        builder.add_fields(query, vec![Field::new("greeting", string_type)]).unwrap();
        builder.add_query_type(query);
        Arc::new(builder.build().unwrap())
    }

    #[tokio::test]
    async fn schema_object_reports_query_type_name() {
        let schema = sample_schema();
        let object: Object<()> = schema_object(schema.clone());
        let document = crate::parser::parse_document_source("{ queryType { name } }", 0).unwrap();
        let op = document.operations().next().unwrap();
        let fragments = FragmentMap::new();
        let variables = HashMap::new();
        let directive_state = DirectiveState::default();
        let mut errors = Vec::new();
        let value = object
            .resolve(&op.item.selection_set, &fragments, &variables, &directive_state, &(), crate::resolve::ResolveMode::Deferred, &mut errors)
            .await;
        assert!(errors.is_empty());
        let map = value.as_object().unwrap();
        let query_type = map.get_field_value("queryType").unwrap().as_object().unwrap();
        assert_eq!(query_type.get_field_value("name"), Some(&Value::String("Query".to_owned())));
    }

    #[tokio::test]
    async fn find_type_resolves_kind_object() {
        let schema = sample_schema();
        let object: Object<()> = find_type(schema, "Query").unwrap();
        let document = crate::parser::parse_document_source("{ kind }", 0).unwrap();
        let op = document.operations().next().unwrap();
        let fragments = FragmentMap::new();
        let variables = HashMap::new();
        let directive_state = DirectiveState::default();
        let mut errors = Vec::new();
        let value = object
            .resolve(&op.item.selection_set, &fragments, &variables, &directive_state, &(), crate::resolve::ResolveMode::Deferred, &mut errors)
            .await;
        let map = value.as_object().unwrap();
        assert_eq!(map.get_field_value("kind"), Some(&Value::Enum("OBJECT".to_owned())));
    }

    #[tokio::test]
    async fn skip_and_include_directives_apply_to_introspection_fields() {
        let schema = sample_schema();
        let object: Object<()> = schema_object(schema);
        let document = crate::parser::parse_document_source(
            "{ queryType @skip(if: false) { name } mutationType @skip(if: true) { name } }",
            0,
        )
        .unwrap();
        let op = document.operations().next().unwrap();
        let fragments = FragmentMap::new();
        let variables = HashMap::new();
        let directive_state = DirectiveState::default();
        let mut errors = Vec::new();
        let value = object
            .resolve(&op.item.selection_set, &fragments, &variables, &directive_state, &(), crate::resolve::ResolveMode::Deferred, &mut errors)
            .await;
        assert!(errors.is_empty());
        let map = value.as_object().unwrap();
        assert!(map.get_field_value("queryType").is_some());
        assert!(map.get_field_value("mutationType").is_none());
    }
}
