//! Stage objects: named, property-carrying pipeline building blocks.
//!
//! Primitive stages are leaves; container stages additionally hold an
//! ordered list of child stages. Stage identity for round-trip comparison is
//! `(class, name, properties)`; children are restored on decode but
//! compared separately by callers who care about hierarchy.
//!
//! Classes are defined with [`primitive_stage!`] / [`container_stage!`],
//! which also submit a catalog descriptor; the catalog is the type locator
//! the decode side resolves class names against.

use std::collections::HashMap;
use std::sync::OnceLock;

use td_codec::{FieldError, ObjRef, Value};

use crate::property::PropertyMap;

/// Family id shared by every stage class.
pub const FAMILY: &str = "stage";

// -----------------------------------------------------------------------------
// Catalog

/// One catalog entry: a stage class name and a default-instance factory.
pub struct StageDescriptor {
    pub class_name: &'static str,
    pub make: fn() -> ObjRef,
}

inventory::collect!(StageDescriptor);

/// Every linked stage descriptor.
pub fn descriptors() -> impl Iterator<Item = &'static StageDescriptor> {
    inventory::iter::<StageDescriptor>.into_iter()
}

/// Looks a stage factory up by class name.
pub fn locate_stage(class_name: &str) -> Option<fn() -> ObjRef> {
    static INDEX: OnceLock<HashMap<&'static str, fn() -> ObjRef>> = OnceLock::new();
    INDEX
        .get_or_init(|| descriptors().map(|d| (d.class_name, d.make)).collect())
        .get(class_name)
        .copied()
}

// -----------------------------------------------------------------------------
// StageCore

/// The `(name, properties)` pair every stage class shares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageCore {
    name: String,
    properties: PropertyMap,
}

impl StageCore {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: PropertyMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }

    #[doc(hidden)]
    pub fn read(&self, type_name: &str, field: &str) -> Result<Value, FieldError> {
        match field {
            "name" => Ok(Value::Str(self.name.clone())),
            "properties" => Ok(self.properties.to_value()),
            _ => Err(FieldError::NotFound {
                type_name: type_name.to_owned(),
                field: field.to_owned(),
            }),
        }
    }

    #[doc(hidden)]
    pub fn write(&mut self, type_name: &str, field: &str, value: Value) -> Result<(), FieldError> {
        match field {
            "name" => match value {
                Value::Str(name) => {
                    self.name = name;
                    Ok(())
                }
                other => Err(FieldError::Mismatch {
                    type_name: type_name.to_owned(),
                    field: "name".to_owned(),
                    found: other.kind_name(),
                }),
            },
            "properties" => {
                self.properties = PropertyMap::from_value(value, type_name)?;
                Ok(())
            }
            _ => Err(FieldError::NotFound {
                type_name: type_name.to_owned(),
                field: field.to_owned(),
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Class macros

/// Defines a leaf stage class and registers it with the catalog.
#[macro_export]
macro_rules! primitive_stage {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            core: $crate::stage::StageCore,
        }

        impl $name {
            pub fn new(name: impl Into<::std::string::String>) -> Self {
                Self {
                    core: $crate::stage::StageCore::named(name),
                }
            }

            pub fn name(&self) -> &str {
                self.core.name()
            }

            pub fn set_name(&mut self, name: impl Into<::std::string::String>) {
                self.core.set_name(name);
            }

            pub fn properties(&self) -> &$crate::property::PropertyMap {
                self.core.properties()
            }

            pub fn properties_mut(&mut self) -> &mut $crate::property::PropertyMap {
                self.core.properties_mut()
            }

            pub fn set_property(
                &mut self,
                name: impl Into<::std::string::String>,
                value: impl Into<$crate::codec::Value>,
            ) {
                self.core.properties_mut().set(name, value);
            }
        }

        impl $crate::codec::DomainObject for $name {
            fn type_name(&self) -> &str {
                stringify!($name)
            }

            fn families(&self) -> &'static [&'static str] {
                &[$crate::stage::FAMILY]
            }

            fn field_names(&self) -> &'static [&'static str] {
                &["name", "properties"]
            }

            fn get_field(
                &self,
                name: &str,
            ) -> Result<$crate::codec::Value, $crate::codec::FieldError> {
                self.core.read(stringify!($name), name)
            }

            fn set_field(
                &mut self,
                name: &str,
                value: $crate::codec::Value,
            ) -> Result<(), $crate::codec::FieldError> {
                self.core.write(stringify!($name), name, value)
            }

            fn object_eq(&self, other: &dyn $crate::codec::DomainObject) -> bool {
                other
                    .as_any()
                    .downcast_ref::<Self>()
                    .is_some_and(|o| self.core == o.core)
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }
        }

        $crate::inventory::submit! {
            $crate::stage::StageDescriptor {
                class_name: stringify!($name),
                make: || $crate::codec::ObjRef::new(<$name as ::core::default::Default>::default()),
            }
        }
    };
}

/// Defines a container stage class (ordered children) and registers it with
/// the catalog.
#[macro_export]
macro_rules! container_stage {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            core: $crate::stage::StageCore,
            children: ::std::vec::Vec<$crate::codec::ObjRef>,
        }

        impl $name {
            pub fn new(name: impl Into<::std::string::String>) -> Self {
                Self {
                    core: $crate::stage::StageCore::named(name),
                    children: ::std::vec::Vec::new(),
                }
            }

            pub fn name(&self) -> &str {
                self.core.name()
            }

            pub fn set_name(&mut self, name: impl Into<::std::string::String>) {
                self.core.set_name(name);
            }

            pub fn properties(&self) -> &$crate::property::PropertyMap {
                self.core.properties()
            }

            pub fn properties_mut(&mut self) -> &mut $crate::property::PropertyMap {
                self.core.properties_mut()
            }

            pub fn set_property(
                &mut self,
                name: impl Into<::std::string::String>,
                value: impl Into<$crate::codec::Value>,
            ) {
                self.core.properties_mut().set(name, value);
            }

            pub fn children(&self) -> &[$crate::codec::ObjRef] {
                &self.children
            }

            pub fn add_child(&mut self, child: $crate::codec::ObjRef) {
                self.children.push(child);
            }
        }

        impl $crate::codec::DomainObject for $name {
            fn type_name(&self) -> &str {
                stringify!($name)
            }

            fn families(&self) -> &'static [&'static str] {
                &[$crate::stage::FAMILY]
            }

            fn field_names(&self) -> &'static [&'static str] {
                &["name", "properties", "children"]
            }

            fn get_field(
                &self,
                name: &str,
            ) -> Result<$crate::codec::Value, $crate::codec::FieldError> {
                match name {
                    "children" => Ok($crate::codec::Value::Seq(
                        self.children
                            .iter()
                            .cloned()
                            .map($crate::codec::Value::Object)
                            .collect(),
                    )),
                    _ => self.core.read(stringify!($name), name),
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: $crate::codec::Value,
            ) -> Result<(), $crate::codec::FieldError> {
                match name {
                    "children" => {
                        let items = match value {
                            $crate::codec::Value::Seq(items) => items,
                            other => {
                                return Err($crate::field::mismatch(
                                    &other,
                                    stringify!($name),
                                    "children",
                                ));
                            }
                        };
                        let mut children = ::std::vec::Vec::with_capacity(items.len());
                        for item in items {
                            match item {
                                $crate::codec::Value::Object(child) => children.push(child),
                                other => {
                                    return Err($crate::field::mismatch(
                                        &other,
                                        stringify!($name),
                                        "children",
                                    ));
                                }
                            }
                        }
                        self.children = children;
                        Ok(())
                    }
                    _ => self.core.write(stringify!($name), name, value),
                }
            }

            fn object_eq(&self, other: &dyn $crate::codec::DomainObject) -> bool {
                other
                    .as_any()
                    .downcast_ref::<Self>()
                    .is_some_and(|o| self.core == o.core)
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }
        }

        $crate::inventory::submit! {
            $crate::stage::StageDescriptor {
                class_name: stringify!($name),
                make: || $crate::codec::ObjRef::new(<$name as ::core::default::Default>::default()),
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Built-in classes

primitive_stage! {
    /// Passes the externally supplied current state through.
    CurrentState
}

primitive_stage! {
    /// Pins the pipeline to one fixed, pre-computed state.
    FixedState
}

primitive_stage! {
    /// Bridges two neighbouring stages by planning between their states.
    Connect
}

primitive_stage! {
    /// Moves to an absolute goal.
    MoveTo
}

primitive_stage! {
    /// Moves by a relative offset.
    MoveRelative
}

container_stage! {
    /// Runs its children one after another.
    SerialContainer
}

container_stage! {
    /// Tries its children as interchangeable alternatives.
    Alternatives
}

container_stage! {
    /// Tries its children in order until one succeeds.
    Fallbacks
}

container_stage! {
    /// Merges the trajectories of its children.
    Merger
}

container_stage! {
    /// The root of a pipeline.
    Task
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    use td_codec::DomainObject;

    #[test]
    fn catalog_locates_every_builtin_class() {
        for class in [
            "CurrentState",
            "FixedState",
            "Connect",
            "MoveTo",
            "MoveRelative",
            "SerialContainer",
            "Alternatives",
            "Fallbacks",
            "Merger",
            "Task",
        ] {
            let make = locate_stage(class).unwrap_or_else(|| panic!("{class} not registered"));
            assert_eq!(make().borrow().type_name(), class);
        }
        assert!(locate_stage("Unheard").is_none());
    }

    #[test]
    fn identity_is_class_name_and_properties() {
        let mut a = FixedState::new("fixed");
        a.set_property("velocity", 0.5);
        let mut b = FixedState::new("fixed");
        b.set_property("velocity", 0.5);
        assert!(DomainObject::object_eq(&a, &b));

        b.set_property("velocity", 0.75);
        assert!(!DomainObject::object_eq(&a, &b));

        let c = CurrentState::new("fixed");
        assert!(!DomainObject::object_eq(&a, &c));
    }

    #[test]
    fn children_are_excluded_from_identity() {
        let mut a = SerialContainer::new("outer");
        a.add_child(ObjRef::new(FixedState::new("inner")));
        let b = SerialContainer::new("outer");
        assert!(DomainObject::object_eq(&a, &b));
        assert_eq!(a.children().len(), 1);
    }

    #[test]
    fn children_travel_through_the_field_accessor() {
        let mut container = SerialContainer::new("outer");
        container.add_child(ObjRef::new(FixedState::new("one")));
        container.add_child(ObjRef::new(MoveTo::new("two")));

        let value = container.get_field("children").unwrap();
        let mut replica = SerialContainer::new("outer");
        replica.set_field("children", value).unwrap();
        assert_eq!(replica.children().len(), 2);
        // Handles, not copies.
        assert!(replica.children()[0].ptr_eq(&container.children()[0]));
    }

    #[test]
    fn primitive_stages_reject_children() {
        let fixed = FixedState::new("leaf");
        assert!(matches!(
            fixed.get_field("children"),
            Err(FieldError::NotFound { .. })
        ));
    }
}
