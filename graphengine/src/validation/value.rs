//! `ValidateArgumentValueVisitor` (`original_source/include/Validation.h`):
//! turns an argument's AST value into a structurally-comparable
//! representation, used by the field-selection-merging rule to decide
//! whether two selections sharing a response key pass identical arguments.
//! Variables compare by name, not by the value they might resolve to — two
//! fields are mergeable only if they reference the *same* variable.

use crate::ast::Value;

#[derive(Clone, Debug, PartialEq)]
pub enum ValidateArgumentVariant {
    Variable(String),
    Int(String),
    Float(String),
    String(String),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<ValidateArgumentVariant>),
    Object(Vec<(String, ValidateArgumentVariant)>),
}

pub fn visit_argument_value(value: &Value) -> ValidateArgumentVariant {
    match value {
        Value::Variable(name) => ValidateArgumentVariant::Variable(name.clone()),
        Value::IntValue(text) => ValidateArgumentVariant::Int(text.clone()),
        Value::FloatValue(text) => ValidateArgumentVariant::Float(text.clone()),
        Value::StringValue(text) => ValidateArgumentVariant::String(text.clone()),
        Value::BooleanValue(b) => ValidateArgumentVariant::Boolean(*b),
        Value::NullValue => ValidateArgumentVariant::Null,
        Value::EnumValue(name) => ValidateArgumentVariant::Enum(name.clone()),
        Value::ListValue(items) => {
            ValidateArgumentVariant::List(items.iter().map(|v| visit_argument_value(&v.item)).collect())
        }
        Value::ObjectValue(fields) => ValidateArgumentVariant::Object(
            fields.iter().map(|(k, v)| (k.item.clone(), visit_argument_value(&v.item))).collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Spanning;

    #[test]
    fn same_variable_name_compares_equal() {
        let a = visit_argument_value(&Value::Variable("id".into()));
        let b = visit_argument_value(&Value::Variable("id".into()));
        assert_eq!(a, b);
    }

    #[test]
    fn different_literal_values_compare_unequal() {
        let a = visit_argument_value(&Value::IntValue("1".into()));
        let b = visit_argument_value(&Value::IntValue("2".into()));
        assert_ne!(a, b);
    }

    #[test]
    fn object_field_order_does_not_matter_for_the_caller_to_sort() {
        let value = Value::ObjectValue(vec![
            (Spanning::unlocated("a".into()), Spanning::unlocated(Value::IntValue("1".into()))),
            (Spanning::unlocated("b".into()), Spanning::unlocated(Value::BooleanValue(true))),
        ]);
        let visited = visit_argument_value(&value);
        assert_eq!(
            visited,
            ValidateArgumentVariant::Object(vec![
                ("a".into(), ValidateArgumentVariant::Int("1".into())),
                ("b".into(), ValidateArgumentVariant::Boolean(true)),
            ])
        );
    }
}
