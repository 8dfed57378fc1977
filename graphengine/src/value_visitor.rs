//! Converts an AST [`ast::Value`] into a Response [`Value`], substituting
//! variables from the operation's variables map along the way.
//!
//! Canonical int/float text is parsed here rather than at lex time:
//! [`crate::parser`] keeps `IntValue`/`FloatValue` as source text so this is
//! the single place overflow-to-float fallback and variable resolution meet.

use std::collections::HashMap;

use crate::ast;
use crate::error::ValueVisitorError;
use crate::span::Span;
use crate::value::{Object, Value};

pub type Variables = HashMap<String, Value>;

/// Visits `value` against `variables`, producing the Response Value it
/// denotes. Variables are looked up by name; a name with no entry in
/// `variables` is an error rather than treated as null, since the resolver
/// engine always pre-populates the map with declared defaults (see
/// [`crate::resolve::request`]).
pub fn visit_value(value: &ast::Value, span: Span, variables: &Variables) -> Result<Value, ValueVisitorError> {
    match value {
        ast::Value::Variable(name) => variables
            .get(name)
            .cloned()
            .ok_or_else(|| ValueVisitorError::UnknownVariable { name: name.clone(), span }),
        ast::Value::IntValue(text) => Ok(visit_int(text)),
        ast::Value::FloatValue(text) => Ok(Value::Float(text.parse().expect("lexer only emits valid float text"))),
        ast::Value::StringValue(s) => Ok(Value::String(s.clone())),
        ast::Value::BooleanValue(b) => Ok(Value::Bool(*b)),
        ast::Value::NullValue => Ok(Value::Null),
        ast::Value::EnumValue(name) => Ok(Value::Enum(name.clone())),
        ast::Value::ListValue(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(visit_value(&item.item, item.span, variables)?);
            }
            Ok(Value::List(out))
        }
        ast::Value::ObjectValue(fields) => {
            let mut object = Object::new();
            for (name, value) in fields {
                if object.contains_field(&name.item) {
                    return Err(ValueVisitorError::DuplicateField { name: name.item.clone(), span: name.span });
                }
                let visited = visit_value(&value.item, value.span, variables)?;
                object.add_field(name.item.clone(), visited);
            }
            Ok(Value::Map(object))
        }
    }
}

/// Parses canonical integer text, falling back to `Float` on overflow since
/// the schema's expected type is not known at this layer (the resolver's
/// `ModifiedArgument` conversions reject a `Float` where an `Int` was
/// required).
fn visit_int(text: &str) -> Value {
    match text.parse::<i32>() {
        Ok(i) => Value::Int(i),
        Err(_) => Value::Float(text.parse().expect("lexer only emits valid integer text")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Spanning;

    fn vars() -> Variables {
        let mut variables = Variables::new();
        variables.insert("name".to_owned(), Value::String("ada".to_owned()));
        variables
    }

    #[test]
    fn substitutes_variables_by_name() {
        let value = ast::Value::Variable("name".to_owned());
        assert_eq!(visit_value(&value, Span::unlocated(), &vars()).unwrap(), Value::String("ada".to_owned()));
    }

    #[test]
    fn unknown_variable_carries_span() {
        let value = ast::Value::Variable("missing".to_owned());
        let err = visit_value(&value, Span::unlocated(), &vars()).unwrap_err();
        assert!(matches!(err, ValueVisitorError::UnknownVariable { name, .. } if name == "missing"));
    }

    #[test]
    fn overflowing_int_falls_back_to_float() {
        let value = ast::Value::IntValue("99999999999999999999".to_owned());
        assert_eq!(visit_value(&value, Span::unlocated(), &vars()).unwrap(), Value::Float(1e20));
    }

    #[test]
    fn object_rejects_duplicate_fields() {
        let value = ast::Value::ObjectValue(vec![
            (Spanning::unlocated("a".to_owned()), Spanning::unlocated(ast::Value::IntValue("1".to_owned()))),
            (Spanning::unlocated("a".to_owned()), Spanning::unlocated(ast::Value::IntValue("2".to_owned()))),
        ]);
        let err = visit_value(&value, Span::unlocated(), &vars()).unwrap_err();
        assert!(matches!(err, ValueVisitorError::DuplicateField { name, .. } if name == "a"));
    }

    #[test]
    fn list_and_object_visit_children_in_order() {
        let value = ast::Value::ListValue(vec![
            Spanning::unlocated(ast::Value::IntValue("1".to_owned())),
            Spanning::unlocated(ast::Value::BooleanValue(true)),
        ]);
        let result = visit_value(&value, Span::unlocated(), &vars()).unwrap();
        assert_eq!(result, Value::List(vec![Value::Int(1), Value::Bool(true)]));
    }
}
