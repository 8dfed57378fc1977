//! Renders a [`crate::model::Resolved`] schema into the two artifacts §4.7
//! calls for: `declarations` (enums, input structs, and per-object resolver
//! traits — the "header" equivalent) and `definitions` (argument parsing,
//! `Object` registration closures, and the schema-registration function —
//! the "source" equivalent). Both are plain Rust source text; nothing here
//! touches the filesystem, that's `bin/graphengine_codegen.rs`'s job.
//!
//! Object-valued fields (object/interface/union return types) are emitted
//! as `graphengine::value::Value` rather than a generated struct: unlike
//! the C++ generator's virtual-getter classes, this engine resolves nested
//! objects through the same `FieldContext`/`Object` closures at every
//! depth, so there is no static return type to generate for them. Their
//! trait getters additionally take a `graphengine::resolve::SelectionContext`
//! (selection set, fragments, variables, directives) instead of a bare
//! `&S`, so the implementation can build its own child `Object<S>` and
//! recurse into it the same way `introspection.rs`'s hand-written
//! resolvers do.

use crate::model::{Resolved, ResolvedArgument, ResolvedField, ResolvedObject, ResolvedType, TypeKind};

pub struct GeneratedArtifacts {
    pub declarations: String,
    pub definitions: String,
}

pub fn generate(resolved: &Resolved, namespace: &str, supports_introspection: bool) -> GeneratedArtifacts {
    GeneratedArtifacts {
        declarations: emit_declarations(resolved, namespace),
        definitions: emit_definitions(resolved, namespace, supports_introspection),
    }
}

fn rust_type(ty: &ResolvedType) -> String {
    match ty {
        ResolvedType::NonNull(inner) => rust_type_non_null(inner),
        other => format!("Option<{}>", rust_type_non_null(other)),
    }
}

fn rust_type_non_null(ty: &ResolvedType) -> String {
    match ty {
        ResolvedType::NonNull(inner) => rust_type_non_null(inner),
        ResolvedType::List(inner) => format!("Vec<{}>", rust_type(inner)),
        ResolvedType::Named(name, kind) => named_rust_type(name, *kind),
    }
}

fn named_rust_type(name: &str, kind: TypeKind) -> String {
    match kind {
        TypeKind::Scalar => match name {
            "Int" => "i32".to_owned(),
            "Float" => "f64".to_owned(),
            "String" | "ID" => "String".to_owned(),
            "Boolean" => "bool".to_owned(),
            _ => "graphengine::value::Value".to_owned(),
        },
        TypeKind::Enum | TypeKind::InputObject => name.to_owned(),
        TypeKind::Object | TypeKind::Interface | TypeKind::Union => "graphengine::value::Value".to_owned(),
    }
}

fn render_ast_value(value: &graphengine::ast::Value) -> String {
    use graphengine::ast::Value as AstValue;
    match value {
        AstValue::Variable(name) => format!("graphengine::ast::Value::Variable({name:?}.to_owned())"),
        AstValue::IntValue(raw) => format!("graphengine::ast::Value::IntValue({raw:?}.to_owned())"),
        AstValue::FloatValue(raw) => format!("graphengine::ast::Value::FloatValue({raw:?}.to_owned())"),
        AstValue::StringValue(raw) => format!("graphengine::ast::Value::StringValue({raw:?}.to_owned())"),
        AstValue::BooleanValue(b) => format!("graphengine::ast::Value::BooleanValue({b})"),
        AstValue::NullValue => "graphengine::ast::Value::NullValue".to_owned(),
        AstValue::EnumValue(name) => format!("graphengine::ast::Value::EnumValue({name:?}.to_owned())"),
        AstValue::ListValue(items) => {
            let items = items.iter().map(|v| format!("graphengine::span::Spanning::unlocated({})", render_ast_value(&v.item))).collect::<Vec<_>>().join(", ");
            format!("graphengine::ast::Value::ListValue(vec![{items}])")
        }
        AstValue::ObjectValue(fields) => {
            let fields = fields
                .iter()
                .map(|(name, value)| {
                    format!(
                        "(graphengine::span::Spanning::unlocated({:?}.to_owned()), graphengine::span::Spanning::unlocated({}))",
                        name.item,
                        render_ast_value(&value.item)
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("graphengine::ast::Value::ObjectValue(vec![{fields}])")
        }
    }
}

/// A Rust expression parsing `value` (a `&graphengine::value::Value`) into
/// `rust_type(&argument.value_type)`, erroring with `ExecutionError` on a
/// type mismatch.
fn render_value_conversion(ty: &ResolvedType, value_expr: &str) -> String {
    match ty {
        ResolvedType::NonNull(inner) => render_value_conversion_non_null(inner, value_expr),
        other => format!(
            "if matches!({value_expr}, graphengine::value::Value::Null) {{ None }} else {{ Some({}) }}",
            render_value_conversion_non_null(other, value_expr)
        ),
    }
}

fn render_value_conversion_non_null(ty: &ResolvedType, value_expr: &str) -> String {
    match ty {
        ResolvedType::NonNull(inner) => render_value_conversion_non_null(inner, value_expr),
        ResolvedType::List(inner) => {
            let element = render_value_conversion(inner, "element");
            format!(
                "{value_expr}.as_list().ok_or_else(|| graphengine::error::ExecutionError::new(\"expected a list\", graphengine::span::Span::unlocated()))?.iter().map(|element| Ok::<_, graphengine::error::ExecutionError>({element})).collect::<Result<Vec<_>, _>>()?"
            )
        }
        ResolvedType::Named(name, kind) => match (kind, name.as_str()) {
            (TypeKind::Scalar, "Int") => format!(
                "{value_expr}.as_int().ok_or_else(|| graphengine::error::ExecutionError::new(\"expected an Int\", graphengine::span::Span::unlocated()))?"
            ),
            (TypeKind::Scalar, "Float") => format!(
                "{value_expr}.as_float().ok_or_else(|| graphengine::error::ExecutionError::new(\"expected a Float\", graphengine::span::Span::unlocated()))?"
            ),
            (TypeKind::Scalar, "Boolean") => format!(
                "{value_expr}.as_bool().ok_or_else(|| graphengine::error::ExecutionError::new(\"expected a Boolean\", graphengine::span::Span::unlocated()))?"
            ),
            (TypeKind::Scalar, "String") | (TypeKind::Scalar, "ID") => format!(
                "{value_expr}.as_str().ok_or_else(|| graphengine::error::ExecutionError::new(\"expected a String\", graphengine::span::Span::unlocated()))?.to_owned()"
            ),
            (TypeKind::Scalar, _) => format!("{value_expr}.clone()"),
            (TypeKind::Enum, enum_name) => format!(
                "{value_expr}.as_str().and_then({enum_name}::from_str).ok_or_else(|| graphengine::error::ExecutionError::new(\"invalid {enum_name} value\", graphengine::span::Span::unlocated()))?"
            ),
            (TypeKind::InputObject, input_name) => format!(
                "{input_name}::from_object({value_expr}.as_object().ok_or_else(|| graphengine::error::ExecutionError::new(\"expected an input object\", graphengine::span::Span::unlocated()))?)?"
            ),
            (TypeKind::Object | TypeKind::Interface | TypeKind::Union, _) => format!("{value_expr}.clone()"),
        },
    }
}

fn doc_comment(description: &Option<String>) -> String {
    match description {
        Some(text) => text.lines().map(|line| format!("/// {line}\n")).collect(),
        None => String::new(),
    }
}

fn emit_declarations(resolved: &Resolved, namespace: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("//! Generated resolver declarations for the `{namespace}` schema.\n//! Do not edit by hand; re-run `graphengine-codegen`.\n\n"));

    for e in &resolved.enums {
        out.push_str(&doc_comment(&e.description));
        out.push_str(&format!("#[derive(Clone, Copy, Debug, PartialEq, Eq)]\npub enum {} {{\n", e.name));
        for value in &e.values {
            out.push_str(&format!("    {value},\n"));
        }
        out.push_str("}\n\n");
    }

    for input in &resolved.input_objects {
        out.push_str(&doc_comment(&input.description));
        out.push_str(&format!("#[derive(Clone, Debug)]\npub struct {} {{\n", input.name));
        for field in &input.fields {
            out.push_str(&format!("    pub {}: {},\n", field.name, rust_type(&field.value_type)));
        }
        out.push_str("}\n\n");
    }

    for object in resolved.objects.iter().chain(resolved.interfaces.iter().map(interface_as_object_view).collect::<Vec<_>>().iter()) {
        emit_args_structs(&mut out, object);
        out.push_str(&doc_comment(&object.description));
        out.push_str(&format!("pub trait {}Resolver<S>: Send + Sync {{\n", object.name));
        for field in &object.fields {
            let args_type = args_struct_name(object, field);
            let second_param = if field_needs_selection_context(field) {
                "selection: graphengine::resolve::SelectionContext<'_, S>".to_owned()
            } else {
                "state: &S".to_owned()
            };
            out.push_str(&format!(
                "    fn {}(&self, args: {args_type}, {second_param}) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<{}, graphengine::error::ExecutionError>> + Send + '_>>;\n",
                field.name,
                rust_type(&field.field_type)
            ));
        }
        out.push_str("}\n\n");
    }

    out
}

/// Interfaces share the object-trait shape (one getter per field, no
/// registered fields of their own to fix up) so declarations/definitions
/// render them through the same helpers as a borrowed, owned view.
fn interface_as_object_view(interface: &crate::model::ResolvedInterface) -> ResolvedObject {
    ResolvedObject { name: interface.name.clone(), description: interface.description.clone(), interfaces: Vec::new(), fields: interface.fields.clone() }
}

/// Object/Interface/Union-typed fields need the caller's selection context
/// to recurse into their own nested selection set (see the module doc
/// comment); every other field kind is a leaf value and only needs `&S`.
fn field_needs_selection_context(field: &ResolvedField) -> bool {
    let (_, kind) = field.field_type.innermost();
    matches!(kind, TypeKind::Object | TypeKind::Interface | TypeKind::Union)
}

fn args_struct_name(object: &ResolvedObject, field: &ResolvedField) -> String {
    if field.arguments.is_empty() {
        "()".to_owned()
    } else {
        format!("{}{}Args", object.name, capitalize(&field.name))
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn emit_args_structs(out: &mut String, object: &ResolvedObject) {
    for field in &object.fields {
        if field.arguments.is_empty() {
            continue;
        }
        out.push_str(&format!("#[derive(Clone, Debug)]\npub struct {}{}Args {{\n", object.name, capitalize(&field.name)));
        for arg in &field.arguments {
            out.push_str(&format!("    pub {}: {},\n", arg.name, rust_type(&arg.value_type)));
        }
        out.push_str("}\n\n");
    }
}

fn emit_definitions(resolved: &Resolved, namespace: &str, supports_introspection: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "//! Generated resolver registration for the `{namespace}` schema.\n//! Do not edit by hand; re-run `graphengine-codegen`.\n\nuse graphengine::resolve::{{FieldContext, FieldFuture, Object}};\n\n"
    ));

    for input in &resolved.input_objects {
        out.push_str(&format!("impl {} {{\n    pub fn from_object(object: &graphengine::value::Object) -> Result<Self, graphengine::error::ExecutionError> {{\n", input.name));
        out.push_str(&format!("        Ok({} {{\n", input.name));
        for field in &input.fields {
            out.push_str(&emit_field_parse(&field.name, &field.value_type, &field.default_value, &format!("object.get_field_value({:?})", field.name)));
        }
        out.push_str("        })\n    }\n}\n\n");
    }

    for e in &resolved.enums {
        out.push_str(&format!("impl {} {{\n    pub fn as_str(&self) -> &'static str {{\n        match self {{\n", e.name));
        for value in &e.values {
            out.push_str(&format!("            {}::{value} => {value:?},\n", e.name));
        }
        out.push_str("        }\n    }\n\n");
        out.push_str(&format!("    pub fn from_str(s: &str) -> Option<Self> {{\n        match s {{\n"));
        for value in &e.values {
            out.push_str(&format!("            {value:?} => Some({}::{value}),\n", e.name));
        }
        out.push_str("            _ => None,\n        }\n    }\n}\n\n");
    }

    let all_objects: Vec<ResolvedObject> = resolved.objects.iter().cloned().chain(resolved.interfaces.iter().map(interface_as_object_view)).collect();
    for object in &all_objects {
        emit_args_parse_fns(&mut out, object);
        out.push_str(&format!(
            "pub fn build_{}_object<S: Send + Sync + 'static>(resolver: std::sync::Arc<dyn {}Resolver<S>>) -> Object<S> {{\n",
            snake_case(&object.name),
            object.name
        ));
        out.push_str(&format!("    let mut object = Object::new({:?});\n", object.name));
        for interface in &object.interfaces {
            out.push_str(&format!("    object = object.implements({interface:?});\n"));
        }
        for field in &object.fields {
            let args_expr = if field.arguments.is_empty() {
                "()".to_owned()
            } else {
                format!("parse_{}_{}_args(&ctx.arguments)?", snake_case(&object.name), snake_case(&field.name))
            };
            out.push_str(&format!("    {{\n        let resolver = resolver.clone();\n"));
            out.push_str(&format!(
                "        object = object.field({:?}, std::sync::Arc::new(move |ctx: FieldContext<'_, S>| -> FieldFuture<'_> {{\n",
                field.name
            ));
            out.push_str("            let resolver = resolver.clone();\n");
            out.push_str("            Box::pin(async move {\n");
            out.push_str(&format!("                let args = {args_expr};\n"));
            let second_arg = if field_needs_selection_context(field) { "ctx.selection_context()" } else { "ctx.state" };
            out.push_str(&format!("                let value = resolver.{}(args, {second_arg}).await?;\n", field.name));
            out.push_str(&format!("                Ok({})\n", emit_value_wrap(&field.field_type)));
            out.push_str("            })\n");
            out.push_str("        }));\n    }\n");
        }
        out.push_str("    object\n}\n\n");
    }

    out.push_str(&emit_schema_builder(resolved, supports_introspection));
    out
}

fn snake_case(name: &str) -> String {
    let mut out = String::new();
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn emit_args_parse_fns(out: &mut String, object: &ResolvedObject) {
    for field in &object.fields {
        if field.arguments.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "fn parse_{}_{}_args(arguments: &graphengine::value::Object) -> Result<{}{}Args, graphengine::error::ExecutionError> {{\n",
            snake_case(&object.name),
            snake_case(&field.name),
            object.name,
            capitalize(&field.name)
        ));
        out.push_str(&format!("    Ok({}{}Args {{\n", object.name, capitalize(&field.name)));
        for arg in &field.arguments {
            out.push_str(&emit_field_parse(&arg.name, &arg.value_type, &arg.default_value, &format!("arguments.get_field_value({:?})", arg.name)));
        }
        out.push_str("    })\n}\n\n");
    }
}

/// Emits one `name: <expr>,` struct-literal line parsing `lookup_expr`
/// (an `Option<&graphengine::value::Value>`) against `ty`, falling back to
/// `default` (if present) or an owned `Value::Null` when absent.
fn emit_field_parse(name: &str, ty: &ResolvedType, default: &Option<graphengine::ast::Value>, lookup_expr: &str) -> String {
    let fallback = match default {
        Some(value) => format!(
            "graphengine::value_visitor::visit_value(&{}, graphengine::span::Span::unlocated(), &Default::default()).expect(\"default value literal\")",
            render_ast_value(value)
        ),
        None => "graphengine::value::Value::Null".to_owned(),
    };
    let conversion = render_value_conversion(ty, "value");
    format!(
        "            {name}: {{ let value = &{lookup_expr}.cloned().unwrap_or_else(|| {fallback}); {conversion} }},\n"
    )
}

/// Wraps `value` (the trait getter's typed return value, already bound to
/// `rust_type(ty)` by the generated resolver signature) back into a
/// `graphengine::value::Value` for the `Object` field closure's `Ok(...)`.
/// Builtin scalars go through their native `Value` variant; custom scalars
/// and object/interface/union fields are already `Value` (see
/// [`named_rust_type`]) and pass through unchanged.
fn emit_value_wrap(ty: &ResolvedType) -> String {
    render_value_wrap(ty, "value")
}

fn render_value_wrap(ty: &ResolvedType, expr: &str) -> String {
    match ty {
        ResolvedType::NonNull(inner) => render_value_wrap_non_null(inner, expr),
        other => format!("match {expr} {{ Some(inner) => {}, None => graphengine::value::Value::Null }}", render_value_wrap_non_null(other, "inner")),
    }
}

fn render_value_wrap_non_null(ty: &ResolvedType, expr: &str) -> String {
    match ty {
        ResolvedType::NonNull(inner) => render_value_wrap_non_null(inner, expr),
        ResolvedType::List(inner) => {
            format!("graphengine::value::Value::List({expr}.into_iter().map(|element| {}).collect())", render_value_wrap(inner, "element"))
        }
        ResolvedType::Named(name, kind) => match (kind, name.as_str()) {
            (TypeKind::Scalar, "Int") => format!("graphengine::value::Value::Int({expr})"),
            (TypeKind::Scalar, "Float") => format!("graphengine::value::Value::Float({expr})"),
            (TypeKind::Scalar, "Boolean") => format!("graphengine::value::Value::Bool({expr})"),
            (TypeKind::Scalar, "String") | (TypeKind::Scalar, "ID") => format!("graphengine::value::Value::String({expr})"),
            (TypeKind::Scalar, _) => expr.to_owned(),
            (TypeKind::Enum, _) => format!("graphengine::value::Value::Enum({expr}.as_str().to_owned())"),
            (TypeKind::Object | TypeKind::Interface | TypeKind::Union, _) => expr.to_owned(),
            (TypeKind::InputObject, _) => expr.to_owned(),
        },
    }
}

fn emit_schema_builder(resolved: &Resolved, supports_introspection: bool) -> String {
    let mut out = String::new();
    out.push_str("pub fn build_schema() -> Result<graphengine::schema::Schema, graphengine::error::SchemaBuildError> {\n");
    out.push_str("    let mut builder = graphengine::schema::SchemaBuilder::new();\n");
    out.push_str(&format!("    builder.supports_introspection({supports_introspection});\n"));

    for e in &resolved.enums {
        out.push_str(&format!("    let {}_ref = builder.add_enum({:?}, None);\n", snake_case(&e.name), e.name));
    }
    for input in &resolved.input_objects {
        out.push_str(&format!("    let {}_ref = builder.add_input_object({:?}, None);\n", snake_case(&input.name), input.name));
    }
    for interface in &resolved.interfaces {
        out.push_str(&format!("    let {}_ref = builder.add_interface({:?}, None);\n", snake_case(&interface.name), interface.name));
    }
    for union in &resolved.unions {
        out.push_str(&format!("    let {}_ref = builder.add_union({:?}, None);\n", snake_case(&union.name), union.name));
    }
    for object in &resolved.objects {
        out.push_str(&format!("    let {}_ref = builder.add_object({:?}, None);\n", snake_case(&object.name), object.name));
    }

    for e in &resolved.enums {
        let values = e.values.iter().map(|v| format!("graphengine::schema::EnumValueDef::new({v:?})")).collect::<Vec<_>>().join(", ");
        out.push_str(&format!("    builder.add_enum_values({}_ref, vec![{values}])?;\n", snake_case(&e.name)));
    }
    for input in &resolved.input_objects {
        out.push_str(&format!("    builder.add_input_values({}_ref, vec![\n", snake_case(&input.name)));
        for field in &input.fields {
            out.push_str(&emit_input_value_def_literal(field));
        }
        out.push_str("    ])?;\n");
    }
    for union in &resolved.unions {
        let members = union.members.iter().map(|m| format!("{}_ref", snake_case(m))).collect::<Vec<_>>().join(", ");
        out.push_str(&format!("    builder.add_possible_types({}_ref, vec![{members}])?;\n", snake_case(&union.name)));
    }
    for interface in &resolved.interfaces {
        out.push_str(&format!("    builder.add_fields({}_ref, vec![\n", snake_case(&interface.name)));
        for field in &interface.fields {
            out.push_str(&emit_field_def_literal(field));
        }
        out.push_str("    ])?;\n");
    }
    for object in &resolved.objects {
        let interfaces = object.interfaces.iter().map(|i| format!("{}_ref", snake_case(i))).collect::<Vec<_>>().join(", ");
        if !object.interfaces.is_empty() {
            out.push_str(&format!("    builder.add_interfaces({}_ref, vec![{interfaces}])?;\n", snake_case(&object.name)));
        }
        out.push_str(&format!("    builder.add_fields({}_ref, vec![\n", snake_case(&object.name)));
        for field in &object.fields {
            out.push_str(&emit_field_def_literal(field));
        }
        out.push_str("    ])?;\n");
    }

    if let Some(query) = &resolved.query_root {
        out.push_str(&format!("    builder.add_query_type({}_ref);\n", snake_case(query)));
    }
    if let Some(mutation) = &resolved.mutation_root {
        out.push_str(&format!("    builder.add_mutation_type({}_ref);\n", snake_case(mutation)));
    }
    if let Some(subscription) = &resolved.subscription_root {
        out.push_str(&format!("    builder.add_subscription_type({}_ref);\n", snake_case(subscription)));
    }

    out.push_str("    builder.build()\n}\n");
    out
}

fn emit_type_ref_expr(ty: &ResolvedType) -> String {
    match ty {
        ResolvedType::NonNull(inner) => format!("builder.wrap(graphengine::schema::WrapperKind::NonNull, {})", emit_type_ref_expr(inner)),
        ResolvedType::List(inner) => format!("builder.wrap(graphengine::schema::WrapperKind::List, {})", emit_type_ref_expr(inner)),
        ResolvedType::Named(name, _) => format!("builder.lookup({name:?})?"),
    }
}

fn emit_field_def_literal(field: &ResolvedField) -> String {
    let mut out = format!("        graphengine::schema::Field::new({:?}, {})", field.name, emit_type_ref_expr(&field.field_type));
    for arg in &field.arguments {
        out.push_str(&format!(".argument({})", emit_input_value_def_expr(arg)));
    }
    out.push_str(",\n");
    out
}

fn emit_input_value_def_expr(arg: &ResolvedArgument) -> String {
    let mut expr = format!("graphengine::schema::InputValueDef::new({:?}, {})", arg.name, emit_type_ref_expr(&arg.value_type));
    if let Some(default) = &arg.default_value {
        expr.push_str(&format!(
            ".default_value(graphengine::value_visitor::visit_value(&{}, graphengine::span::Span::unlocated(), &Default::default()).expect(\"default value literal\"))",
            render_ast_value(default)
        ));
    }
    expr
}

fn emit_input_value_def_literal(arg: &ResolvedArgument) -> String {
    format!("        {},\n", emit_input_value_def_expr(arg))
}
