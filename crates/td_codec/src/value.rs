use core::any::Any;
use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use std::rc::Rc;

use thiserror::Error;

// -----------------------------------------------------------------------------
// FieldError

/// Failure of the named-field accessor interface of [`DomainObject`].
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("type `{type_name}` has no field `{field}`")]
    NotFound { type_name: String, field: String },
    #[error("field `{field}` of `{type_name}` cannot hold a {found} value")]
    Mismatch {
        type_name: String,
        field: String,
        found: &'static str,
    },
    #[error("type `{type_name}` is immutable once constructed")]
    Immutable { type_name: String },
}

// -----------------------------------------------------------------------------
// DomainObject

/// The capability a domain type exposes to the engine.
///
/// This is deliberately narrow: a name for tagging, an explicitly declared
/// family chain for representer fallback, and read/write access to named
/// fields as [`Value`]s. The engine itself never names a concrete field;
/// only the per-family adapters do.
pub trait DomainObject: Any + fmt::Debug {
    /// Concrete type name, used as the suffix of the emitted tag
    /// (e.g. `"Time"`, `"plan_msgs/Header"`, `"FixedState"`).
    fn type_name(&self) -> &str;

    /// Family ids this type belongs to, nearest first.
    ///
    /// A representer registered for any of these ids handles the type when
    /// no exact-type representer exists.
    fn families(&self) -> &'static [&'static str] {
        &[]
    }

    /// The ordered set of readable fields.
    fn field_names(&self) -> &'static [&'static str];

    fn get_field(&self, name: &str) -> Result<Value, FieldError>;

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError>;

    /// Domain equality, used by the round-trip contract.
    fn object_eq(&self, other: &dyn DomainObject) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// -----------------------------------------------------------------------------
// ObjRef

/// A shared, interior-mutable handle to a domain object.
///
/// Values hold objects behind `Rc<RefCell<..>>` so a two-phase constructor
/// can hand out a stable identity before the object's fields are populated;
/// the queued completion later mutates the same allocation every holder
/// already sees.
#[derive(Clone)]
pub struct ObjRef(Rc<RefCell<dyn DomainObject>>);

impl ObjRef {
    pub fn new<T: DomainObject>(object: T) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    #[inline]
    pub fn borrow(&self) -> Ref<'_, dyn DomainObject> {
        self.0.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, dyn DomainObject> {
        self.0.borrow_mut()
    }

    /// Identity comparison: both handles refer to the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &ObjRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn is<T: DomainObject>(&self) -> bool {
        self.0.borrow().as_any().is::<T>()
    }

    /// Borrows the object downcast to its concrete type.
    pub fn downcast<T: DomainObject>(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.0.borrow(), |object| object.as_any().downcast_ref::<T>()).ok()
    }

    /// Concrete type name of the held object.
    pub fn type_name(&self) -> String {
        self.0.borrow().type_name().to_owned()
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(object) => fmt::Debug::fmt(&*object, f),
            Err(_) => f.write_str("<object under construction>"),
        }
    }
}

impl PartialEq for ObjRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0.borrow().object_eq(&*other.0.borrow())
    }
}

// -----------------------------------------------------------------------------
// Value

/// A decoded value: the plain shapes of the notation plus domain objects.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
    Map(Mapping),
    Object(ObjRef),
}

impl Value {
    /// Wraps a domain object in a fresh shared handle.
    pub fn object<T: DomainObject>(object: T) -> Self {
        Value::Object(ObjRef::new(object))
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

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric read; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Shape name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "mapping",
            Value::Object(_) => "object",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Seq(v)
    }
}

// -----------------------------------------------------------------------------
// Mapping

/// An ordered list of key/value entries.
///
/// Keys are full [`Value`]s (the notation allows it); the common
/// string-keyed access goes through [`get`](Mapping::get).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping(Vec<(Value, Value)>);

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        self.0.push((key.into(), value.into()));
    }

    /// First entry whose key is the given string.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    pub fn entries(&self) -> &[(Value, Value)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Value, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = &'a (Value, Value);
    type IntoIter = core::slice::Iter<'a, (Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Probe {
        level: i64,
    }

    impl DomainObject for Probe {
        fn type_name(&self) -> &str {
            "Probe"
        }

        fn field_names(&self) -> &'static [&'static str] {
            &["level"]
        }

        fn get_field(&self, name: &str) -> Result<Value, FieldError> {
            match name {
                "level" => Ok(Value::Int(self.level)),
                _ => Err(FieldError::NotFound {
                    type_name: "Probe".into(),
                    field: name.into(),
                }),
            }
        }

        fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
            match name {
                "level" => {
                    self.level = value.as_i64().ok_or(FieldError::Mismatch {
                        type_name: "Probe".into(),
                        field: "level".into(),
                        found: value.kind_name(),
                    })?;
                    Ok(())
                }
                _ => Err(FieldError::NotFound {
                    type_name: "Probe".into(),
                    field: name.into(),
                }),
            }
        }

        fn object_eq(&self, other: &dyn DomainObject) -> bool {
            other
                .as_any()
                .downcast_ref::<Self>()
                .is_some_and(|o| self == o)
        }

        fn as_any(&self) -> &dyn core::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
            self
        }
    }

    #[test]
    fn object_handles_share_mutation() {
        let a = ObjRef::new(Probe { level: 1 });
        let b = a.clone();
        b.borrow_mut().set_field("level", Value::Int(7)).unwrap();
        assert_eq!(a.borrow().get_field("level").unwrap(), Value::Int(7));
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn object_equality_is_domain_equality() {
        let a = Value::object(Probe { level: 3 });
        let b = Value::object(Probe { level: 3 });
        let c = Value::object(Probe { level: 4 });
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn downcast_borrows_concrete_type() {
        let obj = ObjRef::new(Probe { level: 9 });
        assert!(obj.is::<Probe>());
        assert_eq!(obj.downcast::<Probe>().unwrap().level, 9);
    }

    #[test]
    fn mapping_preserves_order_and_looks_up_strings() {
        let mut map = Mapping::new();
        map.insert("b", 2i64);
        map.insert("a", 1i64);
        assert_eq!(map.get("a"), Some(&Value::Int(1)));
        assert_eq!(map.entries()[0].0, Value::Str("b".into()));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn numeric_widening() {
        assert_eq!(Value::Int(5).as_f64(), Some(5.0));
        assert_eq!(Value::Float(5.5).as_i64(), None);
    }
}
