use core::any::TypeId;
use std::collections::HashMap;

use thiserror::Error;

use td_notation::NodeId;

use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::error::{DecodeError, EncodeError};
use crate::value::{DomainObject, Value};

// -----------------------------------------------------------------------------
// Handler types

/// Decode-side handler.
///
/// `suffix` is the remainder of the tag after a matched prefix; for an
/// exact-tag match it is the full tag.
pub type ConstructFn =
    fn(&mut Decoder<'_, '_>, suffix: &str, node: NodeId) -> Result<Construction, DecodeError>;

/// Encode-side handler: builds the node tree for one object.
pub type RepresentFn =
    fn(&mut Encoder<'_>, object: &dyn DomainObject) -> Result<NodeId, EncodeError>;

/// Deferred second construction phase; runs with the same session.
pub type Completion = Box<dyn FnOnce(&mut Decoder<'_, '_>) -> Result<(), DecodeError>>;

/// What a constructor hands back to the engine.
pub enum Construction {
    /// A finished value.
    Done(Value),
    /// An allocated-but-unpopulated value plus the completion that fills it
    /// in once the surrounding document has been constructed. The value's
    /// identity is already final; holders observe the completion's writes.
    Deferred { value: Value, complete: Completion },
}

/// A resolved constructor: the handler plus the tag suffix to pass it.
#[derive(Clone, Copy, Debug)]
pub struct Resolved<'t> {
    pub handler: ConstructFn,
    pub suffix: &'t str,
}

// -----------------------------------------------------------------------------
// Errors

/// No constructor is registered for a tag, exactly or by prefix.
#[derive(Debug, Error, PartialEq)]
#[error("no constructor registered for tag `{0}`")]
pub struct UnknownTagError(pub String);

/// No representer is registered for a runtime type or any of its families.
#[derive(Debug, Error, PartialEq)]
#[error("no representer registered for type `{type_name}` or its families")]
pub struct UnregisteredTypeError {
    pub type_name: String,
}

/// Configuration errors, reported at registration time.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("constructor already registered for tag `{0}`")]
    DuplicateTag(String),
    #[error("prefix `{new}` overlaps registered prefix `{existing}`")]
    OverlappingPrefix { new: String, existing: String },
    #[error("representer already registered for type `{0}`")]
    DuplicateType(&'static str),
    #[error("representer already registered for family `{0}`")]
    DuplicateFamily(&'static str),
}

// -----------------------------------------------------------------------------
// Registry

/// The open type-tag registry.
///
/// Decode side: exact tags and mutually non-overlapping tag prefixes map to
/// [`ConstructFn`]s; exact tags win over prefixes, and among prefixes the
/// longest match wins. Encode side: exact runtime types and family ids map
/// to [`RepresentFn`]s; lookup tries the exact [`TypeId`] first and then the
/// object's declared family chain in order.
///
/// A registry is populated during program initialization (typically once,
/// from the [`AdapterRegistration`] inventory) and treated as read-only for
/// the rest of the process, which is what makes concurrent decodes on
/// different documents safe.
#[derive(Default)]
pub struct Registry {
    exact: HashMap<String, ConstructFn>,
    prefixes: Vec<(String, ConstructFn)>,
    by_type: HashMap<TypeId, (&'static str, RepresentFn)>,
    by_family: HashMap<&'static str, RepresentFn>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from every linked [`AdapterRegistration`].
    pub fn with_adapters() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        let mut count = 0usize;
        for adapter in inventory::iter::<AdapterRegistration> {
            (adapter.register)(&mut registry)?;
            count += 1;
        }
        log::debug!("type-tag registry initialized from {count} adapters");
        Ok(registry)
    }

    /// Adds an exact-tag constructor. Duplicate exact tags are a
    /// configuration error.
    pub fn register_constructor(
        &mut self,
        tag: &str,
        handler: ConstructFn,
    ) -> Result<(), RegistryError> {
        if self.exact.contains_key(tag) {
            return Err(RegistryError::DuplicateTag(tag.to_owned()));
        }
        self.exact.insert(tag.to_owned(), handler);
        Ok(())
    }

    /// Adds a prefix constructor. Prefixes must be mutually non-overlapping:
    /// neither the new prefix nor an existing one may be a prefix of the
    /// other.
    pub fn register_prefix(
        &mut self,
        prefix: &str,
        handler: ConstructFn,
    ) -> Result<(), RegistryError> {
        for (existing, _) in &self.prefixes {
            if existing.starts_with(prefix) || prefix.starts_with(existing.as_str()) {
                return Err(RegistryError::OverlappingPrefix {
                    new: prefix.to_owned(),
                    existing: existing.clone(),
                });
            }
        }
        self.prefixes.push((prefix.to_owned(), handler));
        // Longest first, so resolution takes the longest match.
        self.prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Ok(())
    }

    /// Adds a representer for the exact runtime type `T`.
    pub fn register_representer<T: DomainObject>(
        &mut self,
        handler: RepresentFn,
    ) -> Result<(), RegistryError> {
        let name = core::any::type_name::<T>();
        if self.by_type.contains_key(&TypeId::of::<T>()) {
            return Err(RegistryError::DuplicateType(name));
        }
        self.by_type.insert(TypeId::of::<T>(), (name, handler));
        Ok(())
    }

    /// Adds the fallback representer for a whole family.
    pub fn register_family_representer(
        &mut self,
        family: &'static str,
        handler: RepresentFn,
    ) -> Result<(), RegistryError> {
        if self.by_family.contains_key(family) {
            return Err(RegistryError::DuplicateFamily(family));
        }
        self.by_family.insert(family, handler);
        Ok(())
    }

    /// Resolves a constructor: exact tag first, then longest matching
    /// prefix.
    pub fn resolve_constructor<'t>(&self, tag: &'t str) -> Result<Resolved<'t>, UnknownTagError> {
        if let Some(handler) = self.exact.get(tag) {
            return Ok(Resolved {
                handler: *handler,
                suffix: tag,
            });
        }
        for (prefix, handler) in &self.prefixes {
            if let Some(suffix) = tag.strip_prefix(prefix.as_str()) {
                return Ok(Resolved {
                    handler: *handler,
                    suffix,
                });
            }
        }
        Err(UnknownTagError(tag.to_owned()))
    }

    /// Resolves a representer: exact runtime type, then the object's family
    /// chain in declaration order.
    pub fn resolve_representer(
        &self,
        object: &dyn DomainObject,
    ) -> Result<RepresentFn, UnregisteredTypeError> {
        if let Some((_, handler)) = self.by_type.get(&object.as_any().type_id()) {
            return Ok(*handler);
        }
        for family in object.families() {
            if let Some(handler) = self.by_family.get(family) {
                return Ok(*handler);
            }
        }
        Err(UnregisteredTypeError {
            type_name: object.type_name().to_owned(),
        })
    }
}

// -----------------------------------------------------------------------------
// AdapterRegistration

/// A link-time adapter submission.
///
/// Each domain adapter submits one of these with `inventory::submit!`;
/// [`Registry::with_adapters`] collects them during initialization, before
/// any decode or encode runs.
pub struct AdapterRegistration {
    pub name: &'static str,
    pub register: fn(&mut Registry) -> Result<(), RegistryError>,
}

inventory::collect!(AdapterRegistration);

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn nop(
        _: &mut Decoder<'_, '_>,
        _: &str,
        _: NodeId,
    ) -> Result<Construction, DecodeError> {
        Ok(Construction::Done(Value::Null))
    }

    fn other(
        _: &mut Decoder<'_, '_>,
        _: &str,
        _: NodeId,
    ) -> Result<Construction, DecodeError> {
        Ok(Construction::Done(Value::Bool(true)))
    }

    #[test]
    fn duplicate_exact_tag_fails() {
        let mut r = Registry::new();
        r.register_constructor("x/One", nop).unwrap();
        assert_eq!(
            r.register_constructor("x/One", other),
            Err(RegistryError::DuplicateTag("x/One".into()))
        );
    }

    #[test]
    fn overlapping_prefixes_fail_both_directions() {
        let mut r = Registry::new();
        r.register_prefix("msg/", nop).unwrap();
        assert!(matches!(
            r.register_prefix("msg/plan_", other),
            Err(RegistryError::OverlappingPrefix { .. })
        ));

        let mut r = Registry::new();
        r.register_prefix("msg/plan_", nop).unwrap();
        assert!(matches!(
            r.register_prefix("msg/", other),
            Err(RegistryError::OverlappingPrefix { .. })
        ));
    }

    #[test]
    fn disjoint_prefixes_resolve_independently() {
        let mut r = Registry::new();
        r.register_prefix("time/", nop).unwrap();
        r.register_prefix("stage/", other).unwrap();
        assert_eq!(r.resolve_constructor("time/Time").unwrap().suffix, "Time");
        assert_eq!(
            r.resolve_constructor("stage/FixedState").unwrap().suffix,
            "FixedState"
        );
    }

    #[test]
    fn exact_wins_over_prefix() {
        let mut r = Registry::new();
        r.register_prefix("x/", nop).unwrap();
        r.register_constructor("x/special", other).unwrap();
        let resolved = r.resolve_constructor("x/special").unwrap();
        // An exact match hands the handler the whole tag.
        assert_eq!(resolved.suffix, "x/special");

        let doc = td_notation::Document::new();
        let mut decoder = Decoder::new(&doc, &r);
        let outcome = (resolved.handler)(&mut decoder, resolved.suffix, NodeId::default()).unwrap();
        assert!(matches!(outcome, Construction::Done(Value::Bool(true))));
    }

    #[test]
    fn unknown_tag_reports_the_tag() {
        let r = Registry::new();
        assert_eq!(
            r.resolve_constructor("nope/Thing").unwrap_err(),
            UnknownTagError("nope/Thing".into())
        );
    }
}
