//! The validator's own type model. Kept distinct from
//! [`crate::schema::model::TypeDef`] per `original_source/include/Validation.h`'s
//! `ValidateType` hierarchy, so the same validation code could in principle
//! run against a schema built purely from introspection JSON (§9's open
//! question on the two parallel original implementations) — this repo feeds
//! it from a live [`Schema`] (§11.2).

use crate::ast;
use crate::schema::{Schema, TypeRef, TypeShape, WrapperKind};

#[derive(Clone, Debug, PartialEq)]
pub enum ValidateType {
    Scalar(String),
    Object(String),
    Interface(String),
    Union(String),
    Enum(String),
    InputObject(String),
    List(Box<ValidateType>),
    NonNull(Box<ValidateType>),
}

impl ValidateType {
    pub fn name(&self) -> Option<&str> {
        match self {
            ValidateType::Scalar(n)
            | ValidateType::Object(n)
            | ValidateType::Interface(n)
            | ValidateType::Union(n)
            | ValidateType::Enum(n)
            | ValidateType::InputObject(n) => Some(n),
            ValidateType::List(_) | ValidateType::NonNull(_) => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, ValidateType::Object(_) | ValidateType::Interface(_) | ValidateType::Union(_))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, ValidateType::Scalar(_) | ValidateType::Enum(_))
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, ValidateType::NonNull(_))
    }

    pub fn nullable(&self) -> &ValidateType {
        match self {
            ValidateType::NonNull(inner) => inner,
            other => other,
        }
    }

    pub fn innermost_name(&self) -> Option<&str> {
        match self {
            ValidateType::List(inner) | ValidateType::NonNull(inner) => inner.innermost_name(),
            other => other.name(),
        }
    }
}

impl std::fmt::Display for ValidateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidateType::List(inner) => write!(f, "[{inner}]"),
            ValidateType::NonNull(inner) => write!(f, "{inner}!"),
            other => write!(f, "{}", other.name().unwrap_or("?")),
        }
    }
}

/// Resolves names against a frozen [`Schema`] and caches the one handle the
/// original's `ValidationContext` keeps around for `__typename`-shaped
/// argument checks (§11.2).
pub struct ValidationContext<'a> {
    schema: &'a Schema,
    pub non_null_string: ValidateType,
}

impl<'a> ValidationContext<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        ValidationContext {
            schema,
            non_null_string: ValidateType::NonNull(Box::new(ValidateType::Scalar("String".to_owned()))),
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn validate_type_of(&self, type_ref: TypeRef) -> ValidateType {
        match self.schema.shape(type_ref) {
            TypeShape::Scalar(t) => ValidateType::Scalar(t.name.clone()),
            TypeShape::Object(t) => ValidateType::Object(t.name.clone()),
            TypeShape::Interface(t) => ValidateType::Interface(t.name.clone()),
            TypeShape::Union(t) => ValidateType::Union(t.name.clone()),
            TypeShape::Enum(t) => ValidateType::Enum(t.name.clone()),
            TypeShape::InputObject(t) => ValidateType::InputObject(t.name.clone()),
            TypeShape::List(inner) => ValidateType::List(Box::new(self.validate_type_of(inner))),
            TypeShape::NonNull(inner) => ValidateType::NonNull(Box::new(self.validate_type_of(inner))),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<ValidateType> {
        self.schema.lookup(name).ok().map(|r| self.validate_type_of(r))
    }

    pub fn type_ref_by_name(&self, name: &str) -> Option<TypeRef> {
        self.schema.lookup(name).ok()
    }

    /// Resolves a variable-definition's `ast::Type` into a [`TypeRef`],
    /// interning list/non-null wrappers as needed. `None` if the named base
    /// type doesn't exist.
    pub fn resolve_ast_type(&self, ty: &ast::Type) -> Option<TypeRef> {
        match ty {
            ast::Type::Named(name) => self.schema.lookup(name).ok(),
            ast::Type::List(inner) => {
                let inner_ref = self.resolve_ast_type(inner)?;
                Some(self.schema.wrap_type(WrapperKind::List, inner_ref))
            }
            ast::Type::NonNull(inner) => {
                let inner_ref = self.resolve_ast_type(inner)?;
                Some(self.schema.wrap_type(WrapperKind::NonNull, inner_ref))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaBuilder;

    #[test]
    fn resolve_ast_type_wraps_list_and_non_null() {
        let mut builder = SchemaBuilder::new();
        let query = builder.add_object("Query", None);
        builder.add_query_type(query);
        let schema = builder.build().unwrap();
        let ctx = ValidationContext::new(&schema);

        let ty = ast::Type::NonNull(Box::new(ast::Type::List(Box::new(ast::Type::Named("String".into())))));
        let resolved = ctx.resolve_ast_type(&ty).unwrap();
        let validate_type = ctx.validate_type_of(resolved);
        assert_eq!(validate_type, ValidateType::NonNull(Box::new(ValidateType::List(Box::new(ValidateType::Scalar("String".into()))))));
    }

    #[test]
    fn non_null_string_is_cached_on_construction() {
        let mut builder = SchemaBuilder::new();
        let query = builder.add_object("Query", None);
        builder.add_query_type(query);
        let schema = builder.build().unwrap();
        let ctx = ValidationContext::new(&schema);
        assert!(ctx.non_null_string.is_non_null());
        assert_eq!(ctx.non_null_string.nullable().name(), Some("String"));
    }
}
