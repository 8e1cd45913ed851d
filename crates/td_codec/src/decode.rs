use std::collections::VecDeque;

use slotmap::SecondaryMap;

use td_notation::{Document, NodeData, NodeId, NodeKind, Pos, tags};

use crate::MAX_DEPTH;
use crate::error::DecodeError;
use crate::registry::{Completion, Construction, Registry};
use crate::value::{Mapping, Value};

// -----------------------------------------------------------------------------
// Decoder

/// One construction session over one document.
///
/// The session owns the node-identity cache (`constructed`), the recursion
/// guard (`in_progress`) and the queue of deferred completions. Sessions are
/// single-shot: a decoder is consumed by [`decode`](Decoder::decode), and
/// after an error its state is simply dropped.
///
/// Two modes exist. In document mode (the default), deferred completions are
/// queued and drained, in enqueue order, after the root value returns, so
/// by the time the caller sees the result every object in the graph is fully
/// populated. In eager mode ([`Decoder::eager`], for decoding a single
/// object with no surrounding document) completions run immediately after
/// being produced.
pub struct Decoder<'doc, 'reg> {
    doc: &'doc Document,
    registry: &'reg Registry,
    constructed: SecondaryMap<NodeId, Value>,
    in_progress: SecondaryMap<NodeId, ()>,
    pending: VecDeque<Completion>,
    depth: usize,
    eager: bool,
}

impl<'doc, 'reg> Decoder<'doc, 'reg> {
    pub fn new(doc: &'doc Document, registry: &'reg Registry) -> Self {
        Self {
            doc,
            registry,
            constructed: SecondaryMap::new(),
            in_progress: SecondaryMap::new(),
            pending: VecDeque::new(),
            depth: 0,
            eager: false,
        }
    }

    /// A session that runs completions eagerly, for single-object decodes.
    pub fn eager(doc: &'doc Document, registry: &'reg Registry) -> Self {
        Self {
            eager: true,
            ..Self::new(doc, registry)
        }
    }

    /// Decodes the whole document and drains all deferred completions.
    pub fn decode(mut self) -> Result<Value, DecodeError> {
        let root = self.doc.root().ok_or(DecodeError::MalformedDocument {
            expected: "a document with a root node",
            found: "empty document".to_owned(),
            pos: Pos::NONE,
        })?;
        let value = self.construct(root)?;
        self.drain()?;
        Ok(value)
    }

    /// Constructs the value of one node.
    ///
    /// Aliased nodes come back from the cache with their identity intact; a
    /// node whose construction is still in progress is a cycle and is
    /// rejected.
    pub fn construct(&mut self, id: NodeId) -> Result<Value, DecodeError> {
        if let Some(value) = self.constructed.get(id) {
            return Ok(value.clone());
        }
        if self.in_progress.contains_key(id) {
            return Err(DecodeError::RecursiveConstruction {
                pos: self.node(id).pos,
            });
        }
        if self.depth >= MAX_DEPTH {
            return Err(DecodeError::DepthExceeded { limit: MAX_DEPTH });
        }
        self.depth += 1;
        self.in_progress.insert(id, ());

        let registry = self.registry;
        let node = self.node(id);
        let construction = match registry.resolve_constructor(&node.tag) {
            Ok(resolved) => (resolved.handler)(self, resolved.suffix, id)?,
            // Terminal fallback: untyped data keeps its raw shape.
            Err(_) => Construction::Done(self.construct_plain(id)?),
        };

        let (value, complete) = match construction {
            Construction::Done(value) => (value, None),
            Construction::Deferred { value, complete } => (value, Some(complete)),
        };
        self.constructed.insert(id, value.clone());
        self.in_progress.remove(id);
        self.depth -= 1;

        if let Some(complete) = complete {
            if self.eager {
                complete(self)?;
            } else {
                self.pending.push_back(complete);
            }
        }
        Ok(value)
    }

    fn drain(&mut self) -> Result<(), DecodeError> {
        while let Some(complete) = self.pending.pop_front() {
            complete(self)?;
        }
        Ok(())
    }

    /// Plain construction from the node's core tag / raw shape.
    fn construct_plain(&mut self, id: NodeId) -> Result<Value, DecodeError> {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Scalar(text) => match node.tag.as_str() {
                tags::NULL => Ok(Value::Null),
                tags::BOOL => match text.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    _ => Err(self.malformed(id, "a boolean scalar")),
                },
                tags::INT => text
                    .parse()
                    .map(Value::Int)
                    .map_err(|_| self.malformed(id, "an integer scalar")),
                tags::FLOAT => text
                    .parse()
                    .map(Value::Float)
                    .map_err(|_| self.malformed(id, "a float scalar")),
                // `str` and any unregistered scalar tag: the shape-only value.
                _ => Ok(Value::Str(text.clone())),
            },
            NodeKind::Sequence(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.construct(*item)?);
                }
                Ok(Value::Seq(values))
            }
            NodeKind::Mapping(entries) => {
                let mut map = Mapping::new();
                for (key, value) in entries {
                    let key = self.construct(*key)?;
                    let value = self.construct(*value)?;
                    map.insert(key, value);
                }
                Ok(Value::Map(map))
            }
        }
    }

    // -------------------------------------------------------------------------
    // Node reads for handlers

    #[inline]
    pub fn document(&self) -> &'doc Document {
        self.doc
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &'doc NodeData {
        let doc = self.doc;
        &doc[id]
    }

    /// The scalar text of a node.
    pub fn scalar(&self, id: NodeId) -> Result<&'doc str, DecodeError> {
        match &self.node(id).kind {
            NodeKind::Scalar(text) => Ok(text),
            _ => Err(self.malformed(id, "a scalar")),
        }
    }

    /// The scalar text of a node, parsed as an integer.
    pub fn scalar_i64(&self, id: NodeId) -> Result<i64, DecodeError> {
        self.scalar(id)?
            .parse()
            .map_err(|_| self.malformed(id, "an integer scalar"))
    }

    /// The scalar text of a node, parsed as a float (integers accepted).
    pub fn scalar_f64(&self, id: NodeId) -> Result<f64, DecodeError> {
        self.scalar(id)?
            .parse()
            .map_err(|_| self.malformed(id, "a numeric scalar"))
    }

    pub fn sequence(&self, id: NodeId) -> Result<&'doc [NodeId], DecodeError> {
        match &self.node(id).kind {
            NodeKind::Sequence(items) => Ok(items),
            _ => Err(self.malformed(id, "a sequence")),
        }
    }

    pub fn mapping(&self, id: NodeId) -> Result<&'doc [(NodeId, NodeId)], DecodeError> {
        match &self.node(id).kind {
            NodeKind::Mapping(entries) => Ok(entries),
            _ => Err(self.malformed(id, "a mapping")),
        }
    }

    /// The value node of the first entry whose key is the given scalar.
    pub fn mapping_field(&self, id: NodeId, key: &str) -> Result<Option<NodeId>, DecodeError> {
        for (key_id, value_id) in self.mapping(id)? {
            if let NodeKind::Scalar(text) = &self.node(*key_id).kind {
                if text == key {
                    return Ok(Some(*value_id));
                }
            }
        }
        Ok(None)
    }

    /// A [`DecodeError::MalformedDocument`] describing this node.
    pub fn malformed(&self, id: NodeId, expected: &'static str) -> DecodeError {
        let node = self.node(id);
        let found = match &node.kind {
            NodeKind::Scalar(text) => format!("{} `{text}`", node.kind.name()),
            other => other.name().to_owned(),
        };
        DecodeError::MalformedDocument {
            expected,
            found,
            pos: node.pos,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
