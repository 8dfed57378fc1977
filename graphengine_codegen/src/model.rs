//! Two-pass schema model (§11.4): [`Classified`] records every named type's
//! kind from a single scan of the document, so a field referencing a type
//! declared later in the file still type-checks; [`Resolved`] walks the
//! fields, arguments, interfaces, and union members a second time against
//! that map. Mirrors `original_source/SchemaGenerator.h`'s `SchemaTypeMap`
//! classification pass followed by its `fixupOutputFieldList`/
//! `fixupInputFieldList` resolution pass, and the same two-pass shape
//! `graphengine::schema::SchemaBuilder` uses at runtime.

use std::collections::HashMap;

use graphengine::ast::{self, Document, TypeDefinition};

use crate::error::{CodegenError, CodegenResult};

pub const BUILTIN_SCALARS: &[&str] = &["Int", "Float", "String", "Boolean", "ID"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Enum,
    InputObject,
    Union,
    Interface,
    Object,
}

/// Pass 1: a name → kind map built from the built-in scalars plus every
/// type definition in the document.
pub struct Classified {
    kinds: HashMap<String, TypeKind>,
}

impl Classified {
    pub fn build(document: &Document) -> CodegenResult<Self> {
        let mut kinds = HashMap::new();
        for scalar in BUILTIN_SCALARS {
            kinds.insert((*scalar).to_owned(), TypeKind::Scalar);
        }

        for def in document.type_definitions() {
            let (name, kind) = match &def.item {
                TypeDefinition::Scalar(t) => (&t.name.item, TypeKind::Scalar),
                TypeDefinition::Object(t) => (&t.name.item, TypeKind::Object),
                TypeDefinition::Interface(t) => (&t.name.item, TypeKind::Interface),
                TypeDefinition::Union(t) => (&t.name.item, TypeKind::Union),
                TypeDefinition::Enum(t) => (&t.name.item, TypeKind::Enum),
                TypeDefinition::InputObject(t) => (&t.name.item, TypeKind::InputObject),
            };

            if BUILTIN_SCALARS.contains(&name.as_str()) {
                return Err(CodegenError::invalid_schema(format!("{name} collides with a built-in scalar name")));
            }
            if kinds.insert(name.clone(), kind).is_some() {
                return Err(CodegenError::invalid_schema(format!("{name} is declared more than once")));
            }
        }

        Ok(Classified { kinds })
    }

    pub fn kind_of(&self, name: &str) -> Option<TypeKind> {
        self.kinds.get(name).copied()
    }
}

/// A type reference resolved against a [`Classified`] map: every `Named`
/// leaf is guaranteed to exist.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedType {
    Named(String, TypeKind),
    List(Box<ResolvedType>),
    NonNull(Box<ResolvedType>),
}

impl ResolvedType {
    pub fn innermost(&self) -> (&str, TypeKind) {
        match self {
            ResolvedType::Named(name, kind) => (name, *kind),
            ResolvedType::List(inner) | ResolvedType::NonNull(inner) => inner.innermost(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, ResolvedType::NonNull(_))
    }
}

fn resolve_type(ty: &ast::Type, classified: &Classified) -> CodegenResult<ResolvedType> {
    match ty {
        ast::Type::Named(name) => {
            let kind = classified
                .kind_of(name)
                .ok_or_else(|| CodegenError::invalid_schema(format!("reference to undeclared type {name}")))?;
            Ok(ResolvedType::Named(name.clone(), kind))
        }
        ast::Type::List(inner) => Ok(ResolvedType::List(Box::new(resolve_type(inner, classified)?))),
        ast::Type::NonNull(inner) => Ok(ResolvedType::NonNull(Box::new(resolve_type(inner, classified)?))),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedArgument {
    pub name: String,
    pub value_type: ResolvedType,
    pub default_value: Option<ast::Value>,
}

fn resolve_input_value(value: &ast::InputValueDefinition, classified: &Classified) -> CodegenResult<ResolvedArgument> {
    let value_type = resolve_type(&value.value_type.item, classified)?;
    let (_, kind) = value_type.innermost();
    if !matches!(kind, TypeKind::Scalar | TypeKind::Enum | TypeKind::InputObject) {
        return Err(CodegenError::invalid_schema(format!(
            "{} cannot be an input value type; only scalars, enums, and input objects may be",
            value.name.item
        )));
    }
    Ok(ResolvedArgument {
        name: value.name.item.clone(),
        value_type,
        default_value: value.default_value.as_ref().map(|v| v.item.clone()),
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<ResolvedArgument>,
    pub field_type: ResolvedType,
}

fn resolve_field(field: &ast::FieldDefinition, classified: &Classified) -> CodegenResult<ResolvedField> {
    let field_type = resolve_type(&field.field_type.item, classified)?;
    let arguments = field.arguments.iter().map(|a| resolve_input_value(a, classified)).collect::<CodegenResult<_>>()?;
    Ok(ResolvedField { name: field.name.item.clone(), description: field.description.clone(), arguments, field_type })
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedObject {
    pub name: String,
    pub description: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ResolvedField>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedInterface {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<ResolvedField>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedUnion {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEnum {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedInputObject {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<ResolvedArgument>,
}

/// Pass 2: the fully-typed schema description `emit` renders from. Every
/// type-name reference inside it has already been checked against
/// [`Classified`] — `emit` never needs to re-validate.
#[derive(Default)]
pub struct Resolved {
    pub scalars: Vec<String>,
    pub enums: Vec<ResolvedEnum>,
    pub input_objects: Vec<ResolvedInputObject>,
    pub interfaces: Vec<ResolvedInterface>,
    pub unions: Vec<ResolvedUnion>,
    pub objects: Vec<ResolvedObject>,
    pub query_root: Option<String>,
    pub mutation_root: Option<String>,
    pub subscription_root: Option<String>,
}

impl Resolved {
    pub fn build(document: &Document, classified: &Classified) -> CodegenResult<Self> {
        let mut resolved = Resolved::default();

        for def in document.type_definitions() {
            match &def.item {
                TypeDefinition::Scalar(t) => resolved.scalars.push(t.name.item.clone()),
                TypeDefinition::Enum(t) => resolved.enums.push(ResolvedEnum {
                    name: t.name.item.clone(),
                    description: t.description.clone(),
                    values: t.values.iter().map(|v| v.name.item.clone()).collect(),
                }),
                TypeDefinition::InputObject(t) => {
                    let fields = t.fields.iter().map(|f| resolve_input_value(f, classified)).collect::<CodegenResult<_>>()?;
                    resolved.input_objects.push(ResolvedInputObject { name: t.name.item.clone(), description: t.description.clone(), fields });
                }
                TypeDefinition::Interface(t) => {
                    let fields = t.fields.iter().map(|f| resolve_field(f, classified)).collect::<CodegenResult<_>>()?;
                    resolved.interfaces.push(ResolvedInterface { name: t.name.item.clone(), description: t.description.clone(), fields });
                }
                TypeDefinition::Union(t) => {
                    for member in &t.members {
                        if !matches!(classified.kind_of(&member.item), Some(TypeKind::Object)) {
                            return Err(CodegenError::invalid_schema(format!(
                                "union {} member {} is not a declared object type",
                                t.name.item, member.item
                            )));
                        }
                    }
                    resolved.unions.push(ResolvedUnion {
                        name: t.name.item.clone(),
                        description: t.description.clone(),
                        members: t.members.iter().map(|m| m.item.clone()).collect(),
                    });
                }
                TypeDefinition::Object(t) => {
                    for interface in &t.interfaces {
                        if !matches!(classified.kind_of(&interface.item), Some(TypeKind::Interface)) {
                            return Err(CodegenError::invalid_schema(format!(
                                "object {} implements undeclared interface {}",
                                t.name.item, interface.item
                            )));
                        }
                    }
                    let fields = t.fields.iter().map(|f| resolve_field(f, classified)).collect::<CodegenResult<_>>()?;
                    resolved.objects.push(ResolvedObject {
                        name: t.name.item.clone(),
                        description: t.description.clone(),
                        interfaces: t.interfaces.iter().map(|i| i.item.clone()).collect(),
                        fields,
                    });
                }
            }
        }

        let schema_definition = document.definitions.iter().find_map(|d| match d {
            ast::Definition::Schema(s) => Some(&s.item),
            _ => None,
        });
        match schema_definition {
            Some(s) => {
                resolved.query_root = s.query.as_ref().map(|n| n.item.clone());
                resolved.mutation_root = s.mutation.as_ref().map(|n| n.item.clone());
                resolved.subscription_root = s.subscription.as_ref().map(|n| n.item.clone());
            }
            None => {
                resolved.query_root = resolved.objects.iter().find(|o| o.name == "Query").map(|o| o.name.clone());
                resolved.mutation_root = resolved.objects.iter().find(|o| o.name == "Mutation").map(|o| o.name.clone());
                resolved.subscription_root = resolved.objects.iter().find(|o| o.name == "Subscription").map(|o| o.name.clone());
            }
        }

        if resolved.query_root.is_none() {
            return Err(CodegenError::invalid_schema("schema declares no query root"));
        }

        Ok(resolved)
    }

    pub fn object_by_name(&self, name: &str) -> Option<&ResolvedObject> {
        self.objects.iter().find(|o| o.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Document {
        graphengine::parser::parse_document_source(source, 0).unwrap()
    }

    #[test]
    fn classifies_forward_references() {
        let document = parse("type Query { node: Node } type Node { id: ID! }");
        let classified = Classified::build(&document).unwrap();
        assert_eq!(classified.kind_of("Node"), Some(TypeKind::Object));
        assert_eq!(classified.kind_of("ID"), Some(TypeKind::Scalar));
    }

    #[test]
    fn rejects_builtin_collision() {
        let document = parse("scalar String type Query { ping: String }");
        assert!(Classified::build(&document).is_err());
    }

    #[test]
    fn resolves_object_fields_and_defaults() {
        let document = parse(
            r#"
            type Query {
                greeting(name: String = "world"): String!
            }
            "#,
        );
        let classified = Classified::build(&document).unwrap();
        let resolved = Resolved::build(&document, &classified).unwrap();
        let query = resolved.object_by_name("Query").unwrap();
        let field = &query.fields[0];
        assert_eq!(field.name, "greeting");
        assert!(field.field_type.is_non_null());
        assert_eq!(field.arguments[0].name, "name");
        assert!(field.arguments[0].default_value.is_some());
    }

    #[test]
    fn rejects_object_implementing_undeclared_interface() {
        let document = parse("type Query implements Node { ping: String }");
        let classified = Classified::build(&document).unwrap();
        assert!(Resolved::build(&document, &classified).is_err());
    }

    #[test]
    fn rejects_union_member_that_is_not_an_object() {
        let document = parse("scalar Custom union Result = Custom type Query { ping: String }");
        let classified = Classified::build(&document).unwrap();
        assert!(Resolved::build(&document, &classified).is_err());
    }
}
