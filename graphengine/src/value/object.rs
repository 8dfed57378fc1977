//! An insertion-order-preserving string-keyed map, the backing store of
//! [`super::Value::Map`].

use indexmap::IndexMap;

use super::Value;

/// A response object: an ordered `name -> Value` map that forbids silently
/// overwriting a field and instead merges nested objects on key collision,
/// mirroring how overlapping field selections are merged by the resolver.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object {
    fields: IndexMap<String, Value>,
}

impl Object {
    pub fn new() -> Self {
        Object { fields: IndexMap::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Object { fields: IndexMap::with_capacity(capacity) }
    }

    /// Inserts `value` under `name`. If `name` is already present and both the
    /// existing and new values are objects, the two are merged recursively
    /// instead of the new value replacing the old one. Returns `true` if a
    /// genuine name collision occurred (merged or otherwise), which callers
    /// use to detect duplicate-field errors at build time.
    pub fn add_field(&mut self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        match self.fields.get_mut(&name) {
            Some(Value::Map(existing)) => {
                if let Value::Map(new_fields) = value {
                    for (k, v) in new_fields.fields {
                        existing.add_field(k, v);
                    }
                } else {
                    *self.fields.get_mut(&name).unwrap() = value;
                }
                true
            }
            Some(existing) => {
                *existing = value;
                true
            }
            None => {
                self.fields.insert(name, value);
                false
            }
        }
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get_field_value(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> indexmap::map::IterMut<'_, String, Value> {
        self.fields.iter_mut()
    }
}

impl IntoIterator for Object {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl FromIterator<(String, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut object = Object::new();
        for (k, v) in iter {
            object.add_field(k, v);
        }
        object
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Map(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut object = Object::new();
        object.add_field("b", Value::Int(1));
        object.add_field("a", Value::Int(2));
        let names: Vec<_> = object.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn merges_nested_objects_on_collision() {
        let mut object = Object::new();
        let mut inner1 = Object::new();
        inner1.add_field("x", Value::Int(1));
        object.add_field("node", Value::Map(inner1));

        let mut inner2 = Object::new();
        inner2.add_field("y", Value::Int(2));
        object.add_field("node", Value::Map(inner2));

        let node = object.get_field_value("node").unwrap();
        match node {
            Value::Map(merged) => {
                assert_eq!(merged.get_field_value("x"), Some(&Value::Int(1)));
                assert_eq!(merged.get_field_value("y"), Some(&Value::Int(2)));
            }
            _ => panic!("expected merged object"),
        }
    }
}
