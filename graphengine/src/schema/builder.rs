//! The mutating builder used to assemble a [`Schema`] before it is frozen.
//!
//! Types are registered by name first (so forward references type-check)
//! and filled in afterwards via `add_fields`/`add_interfaces`/
//! `add_possible_types`/`add_enum_values`/`add_input_values`, mirroring the
//! code generator's own two-pass classify-then-resolve approach (see
//! `graphengine_codegen::model`).

use indexmap::IndexMap;

use super::meta::{DirectiveDef, EnumValueDef, Field, InputValueDef};
use super::model::{
    new_wrapper_arena, EnumType, InputObjectType, InterfaceType, ObjectType, Schema, ScalarType, TypeDef, TypeRef,
    UnionType, WrapperArena, WrapperKind,
};
use crate::error::SchemaBuildError;

pub const BUILT_IN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

pub struct SchemaBuilder {
    type_defs: Vec<TypeDef>,
    by_name: IndexMap<String, TypeRef>,
    wrappers: WrapperArena,
    directives: Vec<DirectiveDef>,
    query: Option<TypeRef>,
    mutation: Option<TypeRef>,
    subscription: Option<TypeRef>,
    supports_introspection: bool,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        let mut builder = SchemaBuilder {
            type_defs: Vec::new(),
            by_name: IndexMap::new(),
            wrappers: new_wrapper_arena(),
            directives: Vec::new(),
            query: None,
            mutation: None,
            subscription: None,
            supports_introspection: true,
        };
        for name in BUILT_IN_SCALARS {
            builder.add_scalar(name, None);
        }
        builder.add_directive(DirectiveDef::new(
            "skip",
            vec![super::meta::DirectiveLocation::Field, super::meta::DirectiveLocation::FragmentSpread, super::meta::DirectiveLocation::InlineFragment],
        ));
        builder.add_directive(DirectiveDef::new(
            "include",
            vec![super::meta::DirectiveLocation::Field, super::meta::DirectiveLocation::FragmentSpread, super::meta::DirectiveLocation::InlineFragment],
        ));
        builder
    }

    fn register(&mut self, name: &str, def: TypeDef) -> TypeRef {
        let idx = self.type_defs.len();
        self.type_defs.push(def);
        let type_ref = TypeRef::Named(idx);
        self.by_name.insert(name.to_owned(), type_ref);
        type_ref
    }

    pub fn add_scalar(&mut self, name: impl Into<String>, description: Option<String>) -> TypeRef {
        let name = name.into();
        self.register(&name.clone(), TypeDef::Scalar(ScalarType { name, description }))
    }

    pub fn add_object(&mut self, name: impl Into<String>, description: Option<String>) -> TypeRef {
        let name = name.into();
        self.register(&name.clone(), TypeDef::Object(ObjectType { name, description, ..Default::default() }))
    }

    pub fn add_interface(&mut self, name: impl Into<String>, description: Option<String>) -> TypeRef {
        let name = name.into();
        self.register(&name.clone(), TypeDef::Interface(InterfaceType { name, description, ..Default::default() }))
    }

    pub fn add_union(&mut self, name: impl Into<String>, description: Option<String>) -> TypeRef {
        let name = name.into();
        self.register(&name.clone(), TypeDef::Union(UnionType { name, description, ..Default::default() }))
    }

    pub fn add_enum(&mut self, name: impl Into<String>, description: Option<String>) -> TypeRef {
        let name = name.into();
        self.register(&name.clone(), TypeDef::Enum(EnumType { name, description, ..Default::default() }))
    }

    pub fn add_input_object(&mut self, name: impl Into<String>, description: Option<String>) -> TypeRef {
        let name = name.into();
        self.register(&name.clone(), TypeDef::InputObject(InputObjectType { name, description, ..Default::default() }))
    }

    pub fn add_fields(&mut self, type_ref: TypeRef, fields: Vec<Field>) -> Result<(), SchemaBuildError> {
        match self.type_def_mut(type_ref)? {
            TypeDef::Object(t) => t.fields.extend(fields),
            TypeDef::Interface(t) => t.fields.extend(fields),
            other => return Err(SchemaBuildError::TypeNotFound { name: other.name().to_owned() }),
        }
        Ok(())
    }

    pub fn add_interfaces(&mut self, object_ref: TypeRef, interfaces: Vec<TypeRef>) -> Result<(), SchemaBuildError> {
        match self.type_def_mut(object_ref)? {
            TypeDef::Object(t) => t.interfaces.extend(interfaces),
            other => return Err(SchemaBuildError::TypeNotFound { name: other.name().to_owned() }),
        }
        Ok(())
    }

    pub fn add_possible_types(&mut self, union_ref: TypeRef, members: Vec<TypeRef>) -> Result<(), SchemaBuildError> {
        match self.type_def_mut(union_ref)? {
            TypeDef::Union(t) => t.possible_types.extend(members),
            other => return Err(SchemaBuildError::TypeNotFound { name: other.name().to_owned() }),
        }
        Ok(())
    }

    pub fn add_enum_values(&mut self, enum_ref: TypeRef, values: Vec<EnumValueDef>) -> Result<(), SchemaBuildError> {
        match self.type_def_mut(enum_ref)? {
            TypeDef::Enum(t) => t.values.extend(values),
            other => return Err(SchemaBuildError::TypeNotFound { name: other.name().to_owned() }),
        }
        Ok(())
    }

    pub fn add_input_values(&mut self, input_ref: TypeRef, values: Vec<InputValueDef>) -> Result<(), SchemaBuildError> {
        match self.type_def_mut(input_ref)? {
            TypeDef::InputObject(t) => t.fields.extend(values),
            other => return Err(SchemaBuildError::TypeNotFound { name: other.name().to_owned() }),
        }
        Ok(())
    }

    fn type_def_mut(&mut self, type_ref: TypeRef) -> Result<&mut TypeDef, SchemaBuildError> {
        match type_ref {
            TypeRef::Named(idx) => {
                self.type_defs.get_mut(idx).ok_or(SchemaBuildError::TypeNotFound { name: "<unknown>".into() })
            }
            TypeRef::Wrapper(_) => Err(SchemaBuildError::TypeNotFound { name: "<wrapper>".into() }),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<TypeRef, SchemaBuildError> {
        self.by_name.get(name).copied().ok_or_else(|| SchemaBuildError::TypeNotFound { name: name.to_owned() })
    }

    /// Interns a `List`/`NonNull` wrapper around `inner`, for callers (e.g.
    /// `graphengine_codegen::emit`) that need to register a field whose
    /// type carries list or non-null modifiers before the schema is frozen.
    /// Repeated calls with the same `(kind, inner)` return the same `TypeRef`.
    pub fn wrap(&mut self, kind: WrapperKind, inner: TypeRef) -> TypeRef {
        self.wrappers.wrap(kind, inner)
    }

    pub fn add_directive(&mut self, directive: DirectiveDef) {
        self.directives.push(directive);
    }

    pub fn add_query_type(&mut self, type_ref: TypeRef) {
        self.query = Some(type_ref);
    }

    pub fn add_mutation_type(&mut self, type_ref: TypeRef) {
        self.mutation = Some(type_ref);
    }

    pub fn add_subscription_type(&mut self, type_ref: TypeRef) {
        self.subscription = Some(type_ref);
    }

    pub fn supports_introspection(&mut self, enabled: bool) {
        self.supports_introspection = enabled;
    }

    /// Freezes the builder into a [`Schema`], implicitly adding `__typename`
    /// to every object/interface and, when introspection is enabled,
    /// `__schema`/`__type` to the query root.
    pub fn build(mut self) -> Result<Schema, SchemaBuildError> {
        let string_type = self.lookup("String")?;
        let non_null_string = self.wrap(WrapperKind::NonNull, string_type);

        for type_def in &mut self.type_defs {
            let typename_field = Field::new("__typename", non_null_string);
            match type_def {
                TypeDef::Object(t) => t.fields.push(typename_field),
                TypeDef::Interface(t) => t.fields.push(typename_field),
                _ => {}
            }
        }

        let query = self.query.ok_or(SchemaBuildError::TypeNotFound { name: "Query".into() })?;

        if self.supports_introspection {
            if let Some(TypeDef::Object(q)) = self.type_defs.get_mut(match query {
                TypeRef::Named(idx) => idx,
                TypeRef::Wrapper(_) => unreachable!("query root is always a named object"),
            }) {
                q.fields.push(Field::new("__schema", query));
                let name_arg = InputValueDef::new("name", non_null_string);
                q.fields.push(Field::new("__type", string_type).argument(name_arg));
            }
        }

        Ok(Schema::new(
            self.type_defs,
            self.by_name,
            self.wrappers,
            self.directives,
            query,
            self.mutation,
            self.subscription,
            self.supports_introspection,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_built_in_scalars() {
        let builder = SchemaBuilder::new();
        for name in BUILT_IN_SCALARS {
            assert!(builder.lookup(name).is_ok());
        }
    }

    #[test]
    fn build_requires_a_query_root() {
        let builder = SchemaBuilder::new();
        assert!(builder.build().is_err());
    }

    #[test]
    fn build_adds_typename_and_introspection_fields() {
        let mut builder = SchemaBuilder::new();
        let query = builder.add_object("Query", None);
        let string_type = builder.lookup("String").unwrap();
        builder.add_fields(query, vec![Field::new("ping", string_type)]).unwrap();
        builder.add_query_type(query);

        let schema = builder.build().unwrap();
        let object = match schema.type_def(schema.query_type()).unwrap() {
            TypeDef::Object(o) => o,
            _ => panic!("expected object"),
        };
        let names: Vec<_> = object.fields.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"__typename"));
        assert!(names.contains(&"__schema"));
        assert!(names.contains(&"__type"));
        assert!(names.contains(&"ping"));
    }
}
