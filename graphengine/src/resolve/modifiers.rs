//! Typed argument/result conversions (§4.5's `ModifiedArgument<T>` /
//! `ModifiedResult<T>`).
//!
//! The original implementation layers `Nullable`/`List` wrappers around a
//! base type through template specialization. Per §9's re-architecture note
//! ("generic parameters... over a single reusable conversion routine"), this
//! is expressed here as two small traits implemented once for each base
//! scalar and blanket-implemented for `Option<T>`/`Vec<T>`, so any chain of
//! nullable/list wrapping composes for free instead of being hand-enumerated.

use crate::base64;
use crate::error::RequestError;
use crate::value::{Object, Value};

/// Converts an argument [`Value`] into `Self`. Implemented for the base
/// scalars and, via blanket impls, for any nesting of `Option`/`Vec` around
/// them — this is what makes a chain of `Nullable`/`List` wrappers "just
/// work" without enumerating every combination by hand.
pub trait FromArgumentValue: Sized {
    fn from_argument_value(value: &Value) -> Result<Self, RequestError>;
}

impl FromArgumentValue for i32 {
    fn from_argument_value(value: &Value) -> Result<Self, RequestError> {
        value.as_int().ok_or_else(|| RequestError::schema_exception("expected an Int"))
    }
}

impl FromArgumentValue for f64 {
    fn from_argument_value(value: &Value) -> Result<Self, RequestError> {
        value.as_float().ok_or_else(|| RequestError::schema_exception("expected a Float"))
    }
}

impl FromArgumentValue for String {
    fn from_argument_value(value: &Value) -> Result<Self, RequestError> {
        value.as_str().map(str::to_owned).ok_or_else(|| RequestError::schema_exception("expected a String"))
    }
}

impl FromArgumentValue for bool {
    fn from_argument_value(value: &Value) -> Result<Self, RequestError> {
        value.as_bool().ok_or_else(|| RequestError::schema_exception("expected a Boolean"))
    }
}

/// The `ID` scalar: Base64-decoded into its raw bytes.
impl FromArgumentValue for Vec<u8> {
    fn from_argument_value(value: &Value) -> Result<Self, RequestError> {
        let text = value.as_str().ok_or_else(|| RequestError::schema_exception("expected an ID"))?;
        base64::decode(text).map_err(RequestError::from)
    }
}

/// Generic `Scalar`: passed through untouched.
impl FromArgumentValue for Value {
    fn from_argument_value(value: &Value) -> Result<Self, RequestError> {
        Ok(value.clone())
    }
}

impl<T: FromArgumentValue> FromArgumentValue for Option<T> {
    fn from_argument_value(value: &Value) -> Result<Self, RequestError> {
        if value.is_null() {
            Ok(None)
        } else {
            Ok(Some(T::from_argument_value(value)?))
        }
    }
}

impl<T: FromArgumentValue> FromArgumentValue for Vec<T> {
    fn from_argument_value(value: &Value) -> Result<Self, RequestError> {
        let items = value.as_list().ok_or_else(|| RequestError::schema_exception("expected a list"))?;
        items.iter().map(T::from_argument_value).collect()
    }
}

/// Parses arguments out of an already-visited [`Object`] (the arguments map
/// a field resolver receives in its [`super::object::FieldContext`]).
pub struct ModifiedArgument<T>(std::marker::PhantomData<T>);

impl<T: FromArgumentValue> ModifiedArgument<T> {
    /// Returns the argument's value or fails if absent. Combine with
    /// `T = Option<U>` to make absence legal and yield `None`.
    pub fn require(name: &str, arguments: &Object) -> Result<T, RequestError> {
        let value = arguments
            .get_field_value(name)
            .ok_or_else(|| RequestError::schema_exception(format!("missing required argument {name}")))?;
        T::from_argument_value(value)
    }

    /// Like [`Self::require`] but also reports whether `name` was present at
    /// all, so callers can distinguish "absent" (use the declared default)
    /// from "present and null".
    pub fn find(name: &str, arguments: &Object) -> Result<(T, bool), RequestError> {
        match arguments.get_field_value(name) {
            Some(value) => Ok((T::from_argument_value(value)?, true)),
            None => Ok((T::from_argument_value(&Value::Null)?, false)),
        }
    }
}

/// Serializes a resolver's return value into a Response [`Value`].
pub trait ToResultValue {
    fn to_result_value(&self) -> Value;
}

impl ToResultValue for i32 {
    fn to_result_value(&self) -> Value {
        Value::Int(*self)
    }
}

impl ToResultValue for f64 {
    fn to_result_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToResultValue for String {
    fn to_result_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl ToResultValue for bool {
    fn to_result_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToResultValue for Vec<u8> {
    fn to_result_value(&self) -> Value {
        Value::String(base64::encode(self))
    }
}

impl ToResultValue for Value {
    fn to_result_value(&self) -> Value {
        self.clone()
    }
}

impl<T: ToResultValue> ToResultValue for Option<T> {
    fn to_result_value(&self) -> Value {
        match self {
            Some(v) => v.to_result_value(),
            None => Value::Null,
        }
    }
}

impl<T: ToResultValue> ToResultValue for Vec<T> {
    fn to_result_value(&self) -> Value {
        Value::List(self.iter().map(ToResultValue::to_result_value).collect())
    }
}

pub struct ModifiedResult<T>(std::marker::PhantomData<T>);

impl<T: ToResultValue> ModifiedResult<T> {
    pub fn convert(value: &T) -> Value {
        value.to_result_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_reads_a_plain_int() {
        let mut args = Object::new();
        args.add_field("count", Value::Int(3));
        let count: i32 = ModifiedArgument::require("count", &args).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn require_fails_when_absent() {
        let args = Object::new();
        let result: Result<i32, _> = ModifiedArgument::require("count", &args);
        assert!(result.is_err());
    }

    #[test]
    fn nullable_find_distinguishes_absent_from_null() {
        let mut args = Object::new();
        args.add_field("name", Value::Null);
        let (present_null, found) = ModifiedArgument::<Option<String>>::find("name", &args).unwrap();
        assert_eq!(present_null, None);
        assert!(found);

        let empty = Object::new();
        let (absent, found) = ModifiedArgument::<Option<String>>::find("name", &empty).unwrap();
        assert_eq!(absent, None);
        assert!(!found);
    }

    #[test]
    fn id_scalar_round_trips_through_base64() {
        let mut args = Object::new();
        args.add_field("id", Value::String("ZmFrZVRhc2tJZA==".to_owned()));
        let bytes: Vec<u8> = ModifiedArgument::require("id", &args).unwrap();
        assert_eq!(ModifiedResult::convert(&bytes), Value::String("ZmFrZVRhc2tJZA==".to_owned()));
    }

    #[test]
    fn list_of_nullable_ints_round_trips() {
        let mut args = Object::new();
        args.add_field("values", Value::List(vec![Value::Int(1), Value::Null, Value::Int(3)]));
        let values: Vec<Option<i32>> = ModifiedArgument::require("values", &args).unwrap();
        assert_eq!(values, vec![Some(1), None, Some(3)]);
        assert_eq!(ModifiedResult::convert(&values), Value::List(vec![Value::Int(1), Value::Null, Value::Int(3)]));
    }
}
