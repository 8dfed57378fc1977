//! The Response Value: the discriminated value type produced by the parser's
//! value visitor and by resolvers, and assembled into the final response.

mod object;

pub use self::object::Object;

use std::fmt;

/// A GraphQL response value.
///
/// `String` values arriving from a JSON-like boundary are not distinguished
/// from `Enum` values at this layer; the resolver engine coerces a `String`
/// into `Enum` when the schema's expected type demands it (see
/// [`crate::value_visitor`]).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Float(f64),
    String(String),
    Enum(String),
    Scalar(Box<Value>),
    List(Vec<Value>),
    Map(Object),
}

impl Value {
    pub fn null() -> Self {
        Value::Null
    }

    pub fn object(object: Object) -> Self {
        Value::Map(object)
    }

    pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
        Value::List(values.into_iter().collect())
    }

    pub fn scalar(value: Value) -> Self {
        Value::Scalar(Box::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Map(object) => Some(object),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<Object> {
        match self {
            Value::Map(object) => Some(object),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Enum(s) => write!(f, "{s}"),
            Value::Scalar(inner) => write!(f, "{inner}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(object) => {
                write!(f, "{{")?;
                for (i, (name, value)) in object.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_nested_structures() {
        let mut object = Object::new();
        object.add_field("a", Value::Int(1));
        object.add_field("b", Value::list(vec![Value::Bool(true), Value::Null]));
        assert_eq!(Value::Map(object).to_string(), "{a: 1, b: [true, null]}");
    }

    #[test]
    fn option_none_becomes_null() {
        let value: Value = Option::<i32>::None.into();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn equality_is_structural() {
        let mut a = Object::new();
        a.add_field("x", Value::Int(1));
        let mut b = Object::new();
        b.add_field("x", Value::Int(1));
        assert_eq!(Value::Map(a), Value::Map(b));
    }
}
