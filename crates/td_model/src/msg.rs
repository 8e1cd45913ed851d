//! Message records: wire-named, reflectable field bundles.
//!
//! A record is defined with [`message_record!`], which generates the struct,
//! its [`DomainObject`](td_codec::DomainObject) and
//! [`FieldType`](crate::field::FieldType) impls, and a catalog submission.
//! The catalog is the type locator the decode side resolves wire names
//! against; records unknown to the catalog fail decoding with a
//! type-resolution error, not a panic.

use std::collections::HashMap;
use std::sync::OnceLock;

use td_codec::ObjRef;

/// Family id shared by every message record.
pub const FAMILY: &str = "msg";

// -----------------------------------------------------------------------------
// Catalog

/// One catalog entry: a wire name and a default-instance factory.
pub struct MessageDescriptor {
    pub type_name: &'static str,
    pub make: fn() -> ObjRef,
}

inventory::collect!(MessageDescriptor);

/// Every linked record descriptor.
pub fn descriptors() -> impl Iterator<Item = &'static MessageDescriptor> {
    inventory::iter::<MessageDescriptor>.into_iter()
}

/// Looks a record factory up by wire name.
pub fn locate_message(type_name: &str) -> Option<fn() -> ObjRef> {
    static INDEX: OnceLock<HashMap<&'static str, fn() -> ObjRef>> = OnceLock::new();
    INDEX
        .get_or_init(|| descriptors().map(|d| (d.type_name, d.make)).collect())
        .get(type_name)
        .copied()
}

// -----------------------------------------------------------------------------
// message_record!

/// Defines a message record type.
///
/// ```ignore
/// message_record! {
///     /// A labelled scalar parameter.
///     pub struct Property : "plan_msgs/Property" {
///         name: String,
///         value: String,
///     }
/// }
/// ```
#[macro_export]
macro_rules! message_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident : $wire:literal {
            $( $(#[$field_meta:meta])* $field:ident : $ty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $( $(#[$field_meta])* pub $field: $ty, )+
        }

        impl $crate::codec::DomainObject for $name {
            fn type_name(&self) -> &str {
                $wire
            }

            fn families(&self) -> &'static [&'static str] {
                &[$crate::msg::FAMILY]
            }

            fn field_names(&self) -> &'static [&'static str] {
                &[$(stringify!($field)),+]
            }

            fn get_field(
                &self,
                name: &str,
            ) -> Result<$crate::codec::Value, $crate::codec::FieldError> {
                match name {
                    $(stringify!($field) => Ok($crate::field::FieldType::to_value(&self.$field)),)+
                    _ => Err($crate::codec::FieldError::NotFound {
                        type_name: $wire.to_owned(),
                        field: name.to_owned(),
                    }),
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: $crate::codec::Value,
            ) -> Result<(), $crate::codec::FieldError> {
                match name {
                    $(stringify!($field) => {
                        self.$field = $crate::field::FieldType::from_value(
                            value,
                            $wire,
                            stringify!($field),
                        )?;
                        Ok(())
                    })+
                    _ => Err($crate::codec::FieldError::NotFound {
                        type_name: $wire.to_owned(),
                        field: name.to_owned(),
                    }),
                }
            }

            fn object_eq(&self, other: &dyn $crate::codec::DomainObject) -> bool {
                other
                    .as_any()
                    .downcast_ref::<Self>()
                    .is_some_and(|o| self == o)
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }
        }

        impl $crate::field::FieldType for $name {
            fn to_value(&self) -> $crate::codec::Value {
                $crate::codec::Value::object(self.clone())
            }

            fn from_value(
                value: $crate::codec::Value,
                type_name: &str,
                field: &'static str,
            ) -> Result<Self, $crate::codec::FieldError> {
                match value.as_object().and_then(|o| o.downcast::<$name>()) {
                    Some(record) => Ok(record.clone()),
                    None => Err($crate::field::mismatch(&value, type_name, field)),
                }
            }
        }

        $crate::inventory::submit! {
            $crate::msg::MessageDescriptor {
                type_name: $wire,
                make: || $crate::codec::ObjRef::new(<$name as ::core::default::Default>::default()),
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Tests
