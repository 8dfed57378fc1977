//! The frozen, read-only type registry a validated document is checked
//! against. List and non-null wrappers are interned: repeated calls to
//! [`Schema::wrap_type`] with the same `(kind, inner)` pair hand back the
//! identical [`TypeRef`].

use std::collections::HashMap;
use std::sync::Mutex;

use indexmap::IndexMap;

use super::meta::{DirectiveDef, EnumValueDef, Field, InputValueDef};
use crate::error::SchemaBuildError;

/// An interned handle into a [`Schema`]'s type arena. Cheap to copy and
/// compare; equality is identity, not structural.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(usize),
    Wrapper(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WrapperKind {
    List,
    NonNull,
}

#[derive(Clone, Copy, Debug)]
struct WrapperDef {
    kind: WrapperKind,
    inner: TypeRef,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<Field>,
    pub interfaces: Vec<TypeRef>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<Field>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub possible_types: Vec<TypeRef>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValueDef>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<InputValueDef>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeDef {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Scalar(t) => &t.name,
            TypeDef::Object(t) => &t.name,
            TypeDef::Interface(t) => &t.name,
            TypeDef::Union(t) => &t.name,
            TypeDef::Enum(t) => &t.name,
            TypeDef::InputObject(t) => &t.name,
        }
    }

    pub fn fields(&self) -> Option<&[Field]> {
        match self {
            TypeDef::Object(t) => Some(&t.fields),
            TypeDef::Interface(t) => Some(&t.fields),
            _ => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, TypeDef::Object(_) | TypeDef::Interface(_) | TypeDef::Union(_))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TypeDef::Scalar(_) | TypeDef::Enum(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(self, TypeDef::Scalar(_) | TypeDef::Enum(_) | TypeDef::InputObject(_))
    }
}

/// A `TypeRef` resolved one level: either a reference to a named type
/// definition, or a wrapper carrying the `TypeRef` it wraps.
pub enum TypeShape<'a> {
    Scalar(&'a ScalarType),
    Object(&'a ObjectType),
    Interface(&'a InterfaceType),
    Union(&'a UnionType),
    Enum(&'a EnumType),
    InputObject(&'a InputObjectType),
    List(TypeRef),
    NonNull(TypeRef),
}

#[derive(Default)]
pub(super) struct WrapperArena {
    defs: Vec<WrapperDef>,
    cache: HashMap<(WrapperKind, TypeRef), TypeRef>,
}

impl WrapperArena {
    pub(super) fn wrap(&mut self, kind: WrapperKind, inner: TypeRef) -> TypeRef {
        if let Some(&cached) = self.cache.get(&(kind, inner)) {
            return cached;
        }
        let idx = self.defs.len();
        self.defs.push(WrapperDef { kind, inner });
        let r = TypeRef::Wrapper(idx);
        self.cache.insert((kind, inner), r);
        r
    }
}

/// The frozen schema: read-only after [`super::builder::SchemaBuilder::build`],
/// freely shared across resolver threads.
pub struct Schema {
    type_defs: Vec<TypeDef>,
    by_name: IndexMap<String, TypeRef>,
    wrappers: Mutex<WrapperArena>,
    directives: Vec<DirectiveDef>,
    query: TypeRef,
    mutation: Option<TypeRef>,
    subscription: Option<TypeRef>,
    supports_introspection: bool,
}

impl Schema {
    pub(super) fn new(
        type_defs: Vec<TypeDef>,
        by_name: IndexMap<String, TypeRef>,
        wrappers: WrapperArena,
        directives: Vec<DirectiveDef>,
        query: TypeRef,
        mutation: Option<TypeRef>,
        subscription: Option<TypeRef>,
        supports_introspection: bool,
    ) -> Self {
        Schema {
            type_defs,
            by_name,
            wrappers: Mutex::new(wrappers),
            directives,
            query,
            mutation,
            subscription,
            supports_introspection,
        }
    }

    pub fn lookup(&self, name: &str) -> Result<TypeRef, SchemaBuildError> {
        self.by_name.get(name).copied().ok_or_else(|| SchemaBuildError::TypeNotFound { name: name.to_owned() })
    }

    /// Returns the canonical wrapper `TypeRef` for `(kind, inner)`, creating
    /// and caching it on first use. Safe to call after the schema has been
    /// frozen: base type definitions never change, but new wrapper
    /// combinations (e.g. a request's variable declaring `[[Int]]!`) are
    /// still interned lazily.
    pub fn wrap_type(&self, kind: WrapperKind, inner: TypeRef) -> TypeRef {
        self.wrappers.lock().expect("wrapper arena lock poisoned").wrap(kind, inner)
    }

    pub fn shape(&self, type_ref: TypeRef) -> TypeShape<'_> {
        match type_ref {
            TypeRef::Named(idx) => match &self.type_defs[idx] {
                TypeDef::Scalar(t) => TypeShape::Scalar(t),
                TypeDef::Object(t) => TypeShape::Object(t),
                TypeDef::Interface(t) => TypeShape::Interface(t),
                TypeDef::Union(t) => TypeShape::Union(t),
                TypeDef::Enum(t) => TypeShape::Enum(t),
                TypeDef::InputObject(t) => TypeShape::InputObject(t),
            },
            TypeRef::Wrapper(idx) => {
                let def = self.wrappers.lock().expect("wrapper arena lock poisoned").defs[idx];
                match def.kind {
                    WrapperKind::List => TypeShape::List(def.inner),
                    WrapperKind::NonNull => TypeShape::NonNull(def.inner),
                }
            }
        }
    }

    pub fn type_def(&self, type_ref: TypeRef) -> Option<&TypeDef> {
        match type_ref {
            TypeRef::Named(idx) => self.type_defs.get(idx),
            TypeRef::Wrapper(_) => None,
        }
    }

    /// Unwraps `List`/`NonNull` layers and returns the innermost named
    /// type's name.
    pub fn innermost_name(&self, mut type_ref: TypeRef) -> &str {
        loop {
            match self.shape(type_ref) {
                TypeShape::List(inner) | TypeShape::NonNull(inner) => type_ref = inner,
                _ => return self.type_def(type_ref).expect("named TypeRef must resolve").name(),
            }
        }
    }

    pub fn is_non_null(&self, type_ref: TypeRef) -> bool {
        matches!(self.shape(type_ref), TypeShape::NonNull(_))
    }

    /// Strips a single leading `NonNull` wrapper, if present.
    pub fn nullable_of(&self, type_ref: TypeRef) -> TypeRef {
        match self.shape(type_ref) {
            TypeShape::NonNull(inner) => inner,
            _ => type_ref,
        }
    }

    pub fn query_type(&self) -> TypeRef {
        self.query
    }

    pub fn mutation_type(&self) -> Option<TypeRef> {
        self.mutation
    }

    pub fn subscription_type(&self) -> Option<TypeRef> {
        self.subscription
    }

    pub fn supports_introspection(&self) -> bool {
        self.supports_introspection
    }

    pub fn directives(&self) -> &[DirectiveDef] {
        &self.directives
    }

    pub fn directive_by_name(&self, name: &str) -> Option<&DirectiveDef> {
        self.directives.iter().find(|d| d.name == name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(|s| s.as_str())
    }

    /// Is `possible` a member of the union/interface named `abstract_type`
    /// (or the same concrete type)?
    pub fn is_possible_type(&self, abstract_type: TypeRef, possible: TypeRef) -> bool {
        if abstract_type == possible {
            return true;
        }
        match self.type_def(abstract_type) {
            Some(TypeDef::Union(u)) => u.possible_types.contains(&possible),
            Some(TypeDef::Interface(_)) => self.type_defs.iter().enumerate().any(|(idx, def)| {
                TypeRef::Named(idx) == possible
                    && matches!(def, TypeDef::Object(o) if o.interfaces.contains(&abstract_type))
            }),
            _ => false,
        }
    }
}

pub(super) fn new_wrapper_arena() -> WrapperArena {
    WrapperArena::default()
}

#[cfg(test)]
mod tests {
    use super::super::builder::SchemaBuilder;
    use super::*;

    #[test]
    fn wrap_type_interns_repeated_calls() {
        let mut builder = SchemaBuilder::new();
        let query = builder.add_object("Query", None);
        builder.add_query_type(query);
        let schema = builder.build().unwrap();

        let string_type = schema.lookup("String").unwrap();
        let a = schema.wrap_type(WrapperKind::NonNull, string_type);
        let b = schema.wrap_type(WrapperKind::NonNull, string_type);
        assert_eq!(a, b);

        let list_a = schema.wrap_type(WrapperKind::List, a);
        let list_b = schema.wrap_type(WrapperKind::List, a);
        assert_eq!(list_a, list_b);
    }
}
