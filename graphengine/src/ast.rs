//! The typed parse tree produced by [`crate::parser`].
//!
//! Node kinds correspond one-to-one to the grammar productions of the
//! June 2018 GraphQL specification. Every span-bearing node is wrapped in
//! [`Spanning`] so validation and error reporting can point back at source.

use crate::span::Spanning;

/// A type reference as written in source — carries no semantic information
/// and may name a type that does not exist.
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Named(String),
    List(Box<Type>),
    NonNull(Box<Type>),
}

impl Type {
    pub fn innermost_name(&self) -> &str {
        match self {
            Type::Named(name) => name,
            Type::List(inner) | Type::NonNull(inner) => inner.innermost_name(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Type::NonNull(_))
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Named(name) => write!(f, "{name}"),
            Type::List(inner) => write!(f, "[{inner}]"),
            Type::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// A literal or variable value as written in a document. Unlike
/// [`crate::value::Value`], this may still contain variable references and
/// carries source spans on its list/object children.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Variable(String),
    IntValue(String),
    FloatValue(String),
    StringValue(String),
    BooleanValue(bool),
    NullValue,
    EnumValue(String),
    ListValue(Vec<Spanning<Value>>),
    ObjectValue(Vec<(Spanning<String>, Spanning<Value>)>),
}

impl Value {
    pub fn is_variable(&self) -> bool {
        matches!(self, Value::Variable(_))
    }

    /// Recursively collects the names of every variable referenced by this
    /// value (without the leading `$`).
    pub fn referenced_variables(&self) -> Vec<&str> {
        match self {
            Value::Variable(name) => vec![name.as_str()],
            Value::ListValue(items) => items.iter().flat_map(|v| v.item.referenced_variables()).collect(),
            Value::ObjectValue(fields) => {
                fields.iter().flat_map(|(_, v)| v.item.referenced_variables()).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Argument {
    pub name: Spanning<String>,
    pub value: Spanning<Value>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    pub items: Vec<Argument>,
}

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&Spanning<Value>> {
        self.items.iter().find(|arg| arg.name.item == name).map(|arg| &arg.value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
        self.items.iter()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Directive {
    pub name: Spanning<String>,
    pub arguments: Arguments,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Directives {
    pub items: Vec<Spanning<Directive>>,
}

impl Directives {
    pub fn get(&self, name: &str) -> Option<&Directive> {
        self.items.iter().map(|d| &d.item).find(|d| d.name.item == name)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.items.iter().map(|d| &d.item)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableDefinition {
    pub name: Spanning<String>,
    pub var_type: Spanning<Type>,
    pub default_value: Option<Spanning<Value>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariableDefinitions {
    pub items: Vec<VariableDefinition>,
}

impl VariableDefinitions {
    pub fn iter(&self) -> std::slice::Iter<'_, VariableDefinition> {
        self.items.iter()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub alias: Option<Spanning<String>>,
    pub name: Spanning<String>,
    pub arguments: Arguments,
    pub directives: Directives,
    pub selection_set: Option<SelectionSet>,
}

impl Field {
    /// The name this field's result is keyed under in the response: the
    /// alias if present, otherwise the field name.
    pub fn response_key(&self) -> &str {
        self.alias.as_ref().map(|a| a.item.as_str()).unwrap_or(&self.name.item)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FragmentSpread {
    pub name: Spanning<String>,
    pub directives: Directives,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InlineFragment {
    pub type_condition: Option<Spanning<String>>,
    pub directives: Directives,
    pub selection_set: SelectionSet,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    Field(Spanning<Field>),
    FragmentSpread(Spanning<FragmentSpread>),
    InlineFragment(Spanning<InlineFragment>),
}

pub type SelectionSet = Vec<Selection>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub operation_type: OperationType,
    pub name: Option<Spanning<String>>,
    pub variable_definitions: VariableDefinitions,
    pub directives: Directives,
    pub selection_set: SelectionSet,
}

impl Operation {
    pub fn name(&self) -> &str {
        self.name.as_ref().map(|n| n.item.as_str()).unwrap_or("")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    pub name: Spanning<String>,
    pub type_condition: Spanning<String>,
    pub directives: Directives,
    pub selection_set: SelectionSet,
}

/// A type-system definition. The spec surfaces these node kinds so a schema
/// document can itself be parsed by the same grammar the generator reads
/// from, but the executable resolver only ever consumes `Operation` and
/// `Fragment` definitions.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeDefinition {
    Scalar(ScalarTypeDefinition),
    Object(ObjectTypeDefinition),
    Interface(InterfaceTypeDefinition),
    Union(UnionTypeDefinition),
    Enum(EnumTypeDefinition),
    InputObject(InputObjectTypeDefinition),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScalarTypeDefinition {
    pub name: Spanning<String>,
    pub description: Option<String>,
    pub directives: Directives,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDefinition {
    pub name: Spanning<String>,
    pub description: Option<String>,
    pub arguments: Vec<InputValueDefinition>,
    pub field_type: Spanning<Type>,
    pub directives: Directives,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputValueDefinition {
    pub name: Spanning<String>,
    pub description: Option<String>,
    pub value_type: Spanning<Type>,
    pub default_value: Option<Spanning<Value>>,
    pub directives: Directives,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectTypeDefinition {
    pub name: Spanning<String>,
    pub description: Option<String>,
    pub interfaces: Vec<Spanning<String>>,
    pub directives: Directives,
    pub fields: Vec<FieldDefinition>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceTypeDefinition {
    pub name: Spanning<String>,
    pub description: Option<String>,
    pub directives: Directives,
    pub fields: Vec<FieldDefinition>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnionTypeDefinition {
    pub name: Spanning<String>,
    pub description: Option<String>,
    pub directives: Directives,
    pub members: Vec<Spanning<String>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumValueDefinition {
    pub name: Spanning<String>,
    pub description: Option<String>,
    pub directives: Directives,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumTypeDefinition {
    pub name: Spanning<String>,
    pub description: Option<String>,
    pub directives: Directives,
    pub values: Vec<EnumValueDefinition>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputObjectTypeDefinition {
    pub name: Spanning<String>,
    pub description: Option<String>,
    pub directives: Directives,
    pub fields: Vec<InputValueDefinition>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DirectiveDefinition {
    pub name: Spanning<String>,
    pub description: Option<String>,
    pub arguments: Vec<InputValueDefinition>,
    pub locations: Vec<Spanning<String>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SchemaDefinition {
    pub directives: Directives,
    pub query: Option<Spanning<String>>,
    pub mutation: Option<Spanning<String>>,
    pub subscription: Option<Spanning<String>>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Definition {
    Operation(Spanning<Operation>),
    Fragment(Spanning<Fragment>),
    Schema(Spanning<SchemaDefinition>),
    Type(Spanning<TypeDefinition>),
    Directive(Spanning<DirectiveDefinition>),
}

/// The root of a parsed document: one entry per top-level definition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub definitions: Vec<Definition>,
}

impl Document {
    pub fn operations(&self) -> impl Iterator<Item = &Spanning<Operation>> {
        self.definitions.iter().filter_map(|d| match d {
            Definition::Operation(op) => Some(op),
            _ => None,
        })
    }

    pub fn fragments(&self) -> impl Iterator<Item = &Spanning<Fragment>> {
        self.definitions.iter().filter_map(|d| match d {
            Definition::Fragment(f) => Some(f),
            _ => None,
        })
    }

    pub fn type_definitions(&self) -> impl Iterator<Item = &Spanning<TypeDefinition>> {
        self.definitions.iter().filter_map(|d| match d {
            Definition::Type(t) => Some(t),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innermost_name_unwraps_list_and_non_null() {
        let ty = Type::NonNull(Box::new(Type::List(Box::new(Type::Named("Int".into())))));
        assert_eq!(ty.innermost_name(), "Int");
        assert!(ty.is_non_null());
    }

    #[test]
    fn response_key_prefers_alias() {
        let field = Field {
            alias: Some(Spanning::unlocated("aliased".into())),
            name: Spanning::unlocated("real".into()),
            arguments: Arguments::default(),
            directives: Directives::default(),
            selection_set: None,
        };
        assert_eq!(field.response_key(), "aliased");
    }

    #[test]
    fn referenced_variables_recurses_into_lists_and_objects() {
        let value = Value::ListValue(vec![
            Spanning::unlocated(Value::Variable("a".into())),
            Spanning::unlocated(Value::ObjectValue(vec![(
                Spanning::unlocated("k".into()),
                Spanning::unlocated(Value::Variable("b".into())),
            )])),
        ]);
        assert_eq!(value.referenced_variables(), vec!["a", "b"]);
    }
}
