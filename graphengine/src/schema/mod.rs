//! The schema model: building blocks ([`meta`]), the frozen registry
//! ([`model`]), and the mutable [`builder::SchemaBuilder`] used to produce it.

pub mod builder;
pub mod meta;
pub mod model;

pub use builder::SchemaBuilder;
pub use meta::{DirectiveDef, DirectiveLocation, EnumValueDef, Field, InputValueDef};
pub use model::{
    EnumType, InputObjectType, InterfaceType, ObjectType, Schema, ScalarType, TypeDef, TypeRef, TypeShape, UnionType,
    WrapperKind,
};
