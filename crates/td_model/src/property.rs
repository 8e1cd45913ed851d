//! The name → value property bag carried by every stage.

use td_codec::{FieldError, Mapping, Value};

/// An ordered property map.
///
/// Values may be anything the registry can represent, including domain
/// objects. Setting an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap(Vec<(String, Value)>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// The engine-facing mapping form.
    pub fn to_value(&self) -> Value {
        Value::Map(
            self.0
                .iter()
                .map(|(n, v)| (Value::Str(n.clone()), v.clone()))
                .collect::<Mapping>(),
        )
    }

    /// Rebuilds a property map from a decoded mapping.
    ///
    /// Keys must be strings. Null-valued entries are dropped: an absent
    /// property and a null property are the same thing to a stage.
    pub fn from_value(value: Value, type_name: &str) -> Result<Self, FieldError> {
        let map = match value {
            Value::Map(map) => map,
            other => {
                return Err(FieldError::Mismatch {
                    type_name: type_name.to_owned(),
                    field: "properties".to_owned(),
                    found: other.kind_name(),
                });
            }
        };
        let mut properties = Self::new();
        for (key, value) in &map {
            let name = key.as_str().ok_or_else(|| FieldError::Mismatch {
                type_name: type_name.to_owned(),
                field: "properties".to_owned(),
                found: key.kind_name(),
            })?;
            if !value.is_null() {
                properties.set(name, value.clone());
            }
        }
        Ok(properties)
    }
}

impl FromIterator<(String, Value)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.set(name, value);
        }
        map
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let mut props = PropertyMap::new();
        props.set("velocity", 0.5);
        props.set("group", "arm");
        props.set("velocity", 0.9);
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("velocity"), Some(&Value::Float(0.9)));
        assert_eq!(props.iter().next().unwrap().0, "velocity");
    }

    #[test]
    fn round_trips_through_value_form() {
        let mut props = PropertyMap::new();
        props.set("a", 1i64);
        props.set("b", "text");
        let rebuilt = PropertyMap::from_value(props.to_value(), "Stage").unwrap();
        assert_eq!(rebuilt, props);
    }

    #[test]
    fn null_properties_are_dropped() {
        let mut map = Mapping::new();
        map.insert("keep", 1i64);
        map.insert("drop", Value::Null);
        let props = PropertyMap::from_value(Value::Map(map), "Stage").unwrap();
        assert_eq!(props.len(), 1);
        assert!(props.get("drop").is_none());
    }

    #[test]
    fn non_string_keys_are_rejected() {
        let mut map = Mapping::new();
        map.insert(Value::Int(1), 2i64);
        assert!(matches!(
            PropertyMap::from_value(Value::Map(map), "Stage"),
            Err(FieldError::Mismatch { .. })
        ));
    }
}
