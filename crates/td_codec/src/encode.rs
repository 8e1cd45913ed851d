use td_notation::{Document, NodeId, Pos, tags};

use crate::MAX_DEPTH;
use crate::error::EncodeError;
use crate::registry::Registry;
use crate::value::{DomainObject, Value};

// -----------------------------------------------------------------------------
// Encoder

/// The representer engine: walks a value graph and builds a fresh node tree.
///
/// Objects resolve a representer through the registry: exact runtime type
/// first, then the object's declared family chain. Plain values map straight
/// to core-tagged nodes. No identity sharing is attempted on encode; a
/// cyclic object graph runs into the depth bound and is reported.
pub struct Encoder<'reg> {
    registry: &'reg Registry,
    doc: Document,
    depth: usize,
}

/// Encodes one value into a document.
pub fn encode(registry: &Registry, value: &Value) -> Result<Document, EncodeError> {
    let mut encoder = Encoder::new(registry);
    let root = encoder.represent(value)?;
    Ok(encoder.finish(root))
}

impl<'reg> Encoder<'reg> {
    pub fn new(registry: &'reg Registry) -> Self {
        Self {
            registry,
            doc: Document::new(),
            depth: 0,
        }
    }

    /// Seals the document with its root node.
    pub fn finish(mut self, root: NodeId) -> Document {
        self.doc.set_root(root);
        self.doc
    }

    /// Builds the node for one value.
    pub fn represent(&mut self, value: &Value) -> Result<NodeId, EncodeError> {
        if self.depth >= MAX_DEPTH {
            return Err(EncodeError::DepthExceeded { limit: MAX_DEPTH });
        }
        self.depth += 1;
        let node = match value {
            Value::Null => Ok(self.scalar(tags::NULL, "~")),
            Value::Bool(b) => Ok(self.scalar(tags::BOOL, if *b { "true" } else { "false" })),
            Value::Int(n) => Ok(self.scalar(tags::INT, n.to_string())),
            // `{:?}` keeps a fractional part, so the text re-resolves as a float.
            Value::Float(x) => Ok(self.scalar(tags::FLOAT, format!("{x:?}"))),
            Value::Str(s) => Ok(self.scalar(tags::STR, s.clone())),
            Value::Seq(items) => {
                let mut ids = Vec::with_capacity(items.len());
                for item in items {
                    ids.push(self.represent(item)?);
                }
                Ok(self.sequence(tags::SEQ, ids))
            }
            Value::Map(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (key, value) in map {
                    let key = self.represent(key)?;
                    let value = self.represent(value)?;
                    entries.push((key, value));
                }
                Ok(self.mapping(tags::MAP, entries))
            }
            Value::Object(object) => {
                let guard = object.borrow();
                let handler = self.registry.resolve_representer(&*guard)?;
                handler(self, &*guard)
            }
        };
        self.depth -= 1;
        node
    }

    // -------------------------------------------------------------------------
    // Node builders for representers

    pub fn scalar(&mut self, tag: &str, text: impl Into<String>) -> NodeId {
        self.doc.scalar(tag, text, Pos::NONE)
    }

    pub fn sequence(&mut self, tag: &str, items: Vec<NodeId>) -> NodeId {
        self.doc.sequence(tag, items, Pos::NONE)
    }

    pub fn mapping(&mut self, tag: &str, entries: Vec<(NodeId, NodeId)>) -> NodeId {
        self.doc.mapping(tag, entries, Pos::NONE)
    }

    /// The generic field walker family representers are built from: a
    /// mapping of every named field of `object`, recursively represented.
    pub fn represent_fields(
        &mut self,
        tag: &str,
        object: &dyn DomainObject,
    ) -> Result<NodeId, EncodeError> {
        let mut entries = Vec::new();
        for name in object.field_names() {
            let value = object.get_field(name)?;
            let key = self.scalar(tags::STR, *name);
            let value = self.represent(&value)?;
            entries.push((key, value));
        }
        Ok(self.mapping(tag, entries))
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::UnregisteredTypeError;
    use crate::value::{FieldError, Mapping};

    use td_notation::{NodeKind, emit};

    #[test]
    fn plain_values_round_trip_through_nodes() {
        let mut map = Mapping::new();
        map.insert("a", 1i64);
        map.insert("b", 0.5f64);
        map.insert("c", Value::Seq(vec![Value::Bool(true), Value::Null]));
        let value = Value::Map(map);

        let registry = Registry::new();
        let doc = encode(&registry, &value).unwrap();
        let text = emit(&doc);
        assert_eq!(text, "{\n  a: 1,\n  b: 0.5,\n  c: [\n    true,\n    ~,\n  ],\n}\n");
    }

    #[test]
    fn whole_floats_keep_their_tag() {
        let registry = Registry::new();
        let doc = encode(&registry, &Value::Float(5.0)).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc[root].tag, tags::FLOAT);
        let NodeKind::Scalar(text) = &doc[root].kind else {
            panic!()
        };
        assert_eq!(text, "5.0");
    }

    #[derive(Debug)]
    struct Loner;

    impl DomainObject for Loner {
        fn type_name(&self) -> &str {
            "Loner"
        }

        fn families(&self) -> &'static [&'static str] {
            &["nothing_registered"]
        }

        fn field_names(&self) -> &'static [&'static str] {
            &[]
        }

        fn get_field(&self, name: &str) -> Result<Value, FieldError> {
            Err(FieldError::NotFound {
                type_name: "Loner".into(),
                field: name.into(),
            })
        }

        fn set_field(&mut self, name: &str, _: Value) -> Result<(), FieldError> {
            Err(FieldError::NotFound {
                type_name: "Loner".into(),
                field: name.into(),
            })
        }

        fn object_eq(&self, other: &dyn DomainObject) -> bool {
            other.as_any().is::<Self>()
        }

        fn as_any(&self) -> &dyn core::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
            self
        }
    }

    #[test]
    fn unregistered_object_is_an_error() {
        let registry = Registry::new();
        let err = encode(&registry, &Value::object(Loner)).unwrap_err();
        match err {
            EncodeError::UnregisteredType(UnregisteredTypeError { type_name }) => {
                assert_eq!(type_name, "Loner");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    fn scalar_loner(
        encoder: &mut Encoder<'_>,
        _: &dyn DomainObject,
    ) -> Result<NodeId, EncodeError> {
        Ok(encoder.scalar("vendor/Loner", "loner"))
    }

    fn family_fields(
        encoder: &mut Encoder<'_>,
        object: &dyn DomainObject,
    ) -> Result<NodeId, EncodeError> {
        encoder.represent_fields("vendor/Family", object)
    }

    #[test]
    fn exact_type_representer_wins_over_family() {
        let mut registry = Registry::new();
        registry
            .register_family_representer("nothing_registered", family_fields)
            .unwrap();
        registry.register_representer::<Loner>(scalar_loner).unwrap();

        let doc = encode(&registry, &Value::object(Loner)).unwrap();
        assert_eq!(doc[doc.root().unwrap()].tag, "vendor/Loner");
    }

    #[test]
    fn family_representer_carries_types_without_exact_registration() {
        let mut registry = Registry::new();
        registry
            .register_family_representer("nothing_registered", family_fields)
            .unwrap();

        let doc = encode(&registry, &Value::object(Loner)).unwrap();
        assert_eq!(doc[doc.root().unwrap()].tag, "vendor/Family");
    }

    #[test]
    fn duplicate_representer_registrations_fail() {
        let mut registry = Registry::new();
        registry
            .register_family_representer("f", family_fields)
            .unwrap();
        assert!(
            registry
                .register_family_representer("f", family_fields)
                .is_err()
        );

        registry.register_representer::<Loner>(scalar_loner).unwrap();
        assert!(registry.register_representer::<Loner>(scalar_loner).is_err());
    }
}
