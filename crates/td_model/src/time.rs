//! Timestamped values: wall-clock instants and signed spans.

use core::any::Any;

use td_codec::{DomainObject, FieldError, Value};

use crate::field::{FieldType, mismatch};

/// Family id shared by [`Time`] and [`Duration`].
pub const FAMILY: &str = "time";

const NSECS_PER_SEC: i64 = 1_000_000_000;

macro_rules! time_value {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        ///
        /// Immutable once constructed; the sub-second part is canonicalized
        /// into `0..1_000_000_000`, carrying overflow (Euclidean, so negative
        /// spans normalize the same way).
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            secs: i64,
            nsecs: i64,
        }

        impl $name {
            pub fn new(secs: i64, nsecs: i64) -> Self {
                Self {
                    secs: secs + nsecs.div_euclid(NSECS_PER_SEC),
                    nsecs: nsecs.rem_euclid(NSECS_PER_SEC),
                }
            }

            #[inline]
            pub fn secs(&self) -> i64 {
                self.secs
            }

            #[inline]
            pub fn nsecs(&self) -> i64 {
                self.nsecs
            }
        }

        impl DomainObject for $name {
            fn type_name(&self) -> &str {
                stringify!($name)
            }

            fn families(&self) -> &'static [&'static str] {
                &[FAMILY]
            }

            fn field_names(&self) -> &'static [&'static str] {
                &["secs", "nsecs"]
            }

            fn get_field(&self, name: &str) -> Result<Value, FieldError> {
                match name {
                    "secs" => Ok(Value::Int(self.secs)),
                    "nsecs" => Ok(Value::Int(self.nsecs)),
                    _ => Err(FieldError::NotFound {
                        type_name: stringify!($name).to_owned(),
                        field: name.to_owned(),
                    }),
                }
            }

            fn set_field(&mut self, _: &str, _: Value) -> Result<(), FieldError> {
                Err(FieldError::Immutable {
                    type_name: stringify!($name).to_owned(),
                })
            }

            fn object_eq(&self, other: &dyn DomainObject) -> bool {
                other
                    .as_any()
                    .downcast_ref::<Self>()
                    .is_some_and(|o| self == o)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }

        impl FieldType for $name {
            fn to_value(&self) -> Value {
                Value::object(*self)
            }

            fn from_value(
                value: Value,
                type_name: &str,
                field: &'static str,
            ) -> Result<Self, FieldError> {
                match value.as_object().and_then(|o| o.downcast::<$name>()) {
                    Some(v) => Ok(*v),
                    None => Err(mismatch(&value, type_name, field)),
                }
            }
        }
    };
}

time_value! {
    /// A point in time as whole seconds plus nanoseconds.
    Time
}

time_value! {
    /// A signed span of time as whole seconds plus nanoseconds.
    Duration
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_nanosecond_overflow() {
        let t = Time::new(1, 1_500_000_000);
        assert_eq!((t.secs(), t.nsecs()), (2, 500_000_000));
    }

    #[test]
    fn canonicalizes_negative_spans() {
        let d = Duration::new(0, -250);
        assert_eq!((d.secs(), d.nsecs()), (-1, NSECS_PER_SEC - 250));
        assert_eq!(d, Duration::new(-1, NSECS_PER_SEC - 250));
    }

    #[test]
    fn immutable_through_the_accessor() {
        let mut t = Time::new(5, 250);
        assert_eq!(t.get_field("secs").unwrap(), Value::Int(5));
        assert!(matches!(
            t.set_field("secs", Value::Int(9)),
            Err(FieldError::Immutable { .. })
        ));
    }

    #[test]
    fn time_and_duration_never_compare_equal() {
        let t = Time::new(1, 0);
        let d = Duration::new(1, 0);
        assert!(!DomainObject::object_eq(&t, &d));
    }
}
