//! The pieces a [`super::model::TypeDef`] is built from: fields, input
//! values, enum values, and directive definitions.

use crate::value::Value;

use super::model::TypeRef;

#[derive(Clone, Debug, PartialEq)]
pub struct InputValueDef {
    pub name: String,
    pub description: Option<String>,
    pub value_type: TypeRef,
    pub default_value: Option<Value>,
}

impl InputValueDef {
    pub fn new(name: impl Into<String>, value_type: TypeRef) -> Self {
        InputValueDef { name: name.into(), description: None, value_type, default_value: None }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    pub args: Vec<InputValueDef>,
    pub return_type: TypeRef,
    pub deprecation_reason: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, return_type: TypeRef) -> Self {
        Field { name: name.into(), description: None, args: Vec::new(), return_type, deprecation_reason: None }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn argument(mut self, arg: InputValueDef) -> Self {
        self.args.push(arg);
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    pub fn argument_by_name(&self, name: &str) -> Option<&InputValueDef> {
        self.args.iter().find(|a| a.name == name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
}

impl EnumValueDef {
    pub fn new(name: impl Into<String>) -> Self {
        EnumValueDef { name: name.into(), description: None, deprecation_reason: None }
    }
}

/// The site a directive is legal at, per the June-2018 spec's
/// `__DirectiveLocation` enum (executable plus type-system locations).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

impl DirectiveLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveLocation::Query => "QUERY",
            DirectiveLocation::Mutation => "MUTATION",
            DirectiveLocation::Subscription => "SUBSCRIPTION",
            DirectiveLocation::Field => "FIELD",
            DirectiveLocation::FragmentDefinition => "FRAGMENT_DEFINITION",
            DirectiveLocation::FragmentSpread => "FRAGMENT_SPREAD",
            DirectiveLocation::InlineFragment => "INLINE_FRAGMENT",
            DirectiveLocation::Schema => "SCHEMA",
            DirectiveLocation::Scalar => "SCALAR",
            DirectiveLocation::Object => "OBJECT",
            DirectiveLocation::FieldDefinition => "FIELD_DEFINITION",
            DirectiveLocation::ArgumentDefinition => "ARGUMENT_DEFINITION",
            DirectiveLocation::Interface => "INTERFACE",
            DirectiveLocation::Union => "UNION",
            DirectiveLocation::Enum => "ENUM",
            DirectiveLocation::EnumValue => "ENUM_VALUE",
            DirectiveLocation::InputObject => "INPUT_OBJECT",
            DirectiveLocation::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DirectiveDef {
    pub name: String,
    pub description: Option<String>,
    pub locations: Vec<DirectiveLocation>,
    pub args: Vec<InputValueDef>,
}

impl DirectiveDef {
    pub fn new(name: impl Into<String>, locations: Vec<DirectiveLocation>) -> Self {
        DirectiveDef { name: name.into(), description: None, locations, args: Vec::new() }
    }

    pub fn argument(mut self, arg: InputValueDef) -> Self {
        self.args.push(arg);
        self
    }
}
