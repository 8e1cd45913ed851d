//! Conversions between record field types and engine [`Value`]s.

use td_codec::{FieldError, Value};

/// A type that can live in a named field of a domain object.
///
/// `from_value` takes the owning type and field names so a failed conversion
/// reports where it happened.
pub trait FieldType: Sized {
    fn to_value(&self) -> Value;

    fn from_value(
        value: Value,
        type_name: &str,
        field: &'static str,
    ) -> Result<Self, FieldError>;
}

/// Builds the standard field type-mismatch error. Used by the record macros.
#[doc(hidden)]
pub fn mismatch(value: &Value, type_name: &str, field: &'static str) -> FieldError {
    FieldError::Mismatch {
        type_name: type_name.to_owned(),
        field: field.to_owned(),
        found: value.kind_name(),
    }
}

impl FieldType for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value, type_name: &str, field: &'static str) -> Result<Self, FieldError> {
        value.as_bool().ok_or_else(|| mismatch(&value, type_name, field))
    }
}

impl FieldType for i64 {
    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: Value, type_name: &str, field: &'static str) -> Result<Self, FieldError> {
        value.as_i64().ok_or_else(|| mismatch(&value, type_name, field))
    }
}

impl FieldType for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    // Integers widen: older documents write whole floats without a fraction.
    fn from_value(value: Value, type_name: &str, field: &'static str) -> Result<Self, FieldError> {
        value.as_f64().ok_or_else(|| mismatch(&value, type_name, field))
    }
}

impl FieldType for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn from_value(value: Value, type_name: &str, field: &'static str) -> Result<Self, FieldError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(mismatch(&other, type_name, field)),
        }
    }
}

impl<T: FieldType> FieldType for Vec<T> {
    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(FieldType::to_value).collect())
    }

    fn from_value(value: Value, type_name: &str, field: &'static str) -> Result<Self, FieldError> {
        match value {
            Value::Seq(items) => items
                .into_iter()
                .map(|item| T::from_value(item, type_name, field))
                .collect(),
            other => Err(mismatch(&other, type_name, field)),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_fields_widen_integers() {
        let x = f64::from_value(Value::Int(5), "T", "x").unwrap();
        assert_eq!(x, 5.0);
    }

    #[test]
    fn mismatches_name_the_field() {
        let err = i64::from_value(Value::Str("no".into()), "plan_msgs/Header", "seq").unwrap_err();
        assert_eq!(
            err.to_string(),
            "field `seq` of `plan_msgs/Header` cannot hold a string value"
        );
    }

    #[test]
    fn vectors_convert_element_wise() {
        let v = vec![1.5f64, 2.0];
        let value = v.to_value();
        assert_eq!(Vec::<f64>::from_value(value, "T", "xs").unwrap(), v);
    }
}
