use core::fmt;
use core::ops::Index;

use slotmap::{SlotMap, new_key_type};

// -----------------------------------------------------------------------------
// Core tags

/// Tags assigned to untagged nodes when the parser resolves their shape.
///
/// Consumers treat any other tag as an application tag and look it up in
/// their own registries.
pub mod tags {
    pub const NULL: &str = "null";
    pub const BOOL: &str = "bool";
    pub const INT: &str = "int";
    pub const FLOAT: &str = "float";
    pub const STR: &str = "str";
    pub const SEQ: &str = "seq";
    pub const MAP: &str = "map";

    /// Whether `tag` is one of the core shape tags.
    pub fn is_core(tag: &str) -> bool {
        matches!(tag, NULL | BOOL | INT | FLOAT | STR | SEQ | MAP)
    }
}

// -----------------------------------------------------------------------------
// Pos

/// A 1-based source position.
///
/// Nodes built programmatically (by an encoder) carry [`Pos::NONE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub const NONE: Pos = Pos { line: 0, col: 0 };

    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Pos::NONE {
            f.write_str("<builtin>")
        } else {
            write!(f, "line {}, column {}", self.line, self.col)
        }
    }
}

// -----------------------------------------------------------------------------
// Nodes

new_key_type! {
    /// Arena key identifying a node within its [`Document`].
    ///
    /// `NodeId` is the *identity* of a node: an alias in the source text
    /// resolves to the id of its anchor, not to a copy.
    pub struct NodeId;
}

/// The shape of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar(String),
    Sequence(Vec<NodeId>),
    Mapping(Vec<(NodeId, NodeId)>),
}

impl NodeKind {
    /// Short shape name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Scalar(_) => "scalar",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Mapping(_) => "mapping",
        }
    }
}

/// One node of a parsed or built document.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub tag: String,
    pub kind: NodeKind,
    pub pos: Pos,
}

// -----------------------------------------------------------------------------
// Document

/// An arena of nodes plus the root id.
///
/// Documents are built either by [`parse`](crate::parse) or node-by-node by
/// an encoder. Child links are [`NodeId`]s into the same arena, so shared
/// sub-documents (and, after a hostile parse, cycles) are representable.
#[derive(Debug, Default)]
pub struct Document {
    nodes: SlotMap<NodeId, NodeData>,
    root: Option<NodeId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the arena.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[inline]
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    pub fn scalar(&mut self, tag: impl Into<String>, text: impl Into<String>, pos: Pos) -> NodeId {
        self.nodes.insert(NodeData {
            tag: tag.into(),
            kind: NodeKind::Scalar(text.into()),
            pos,
        })
    }

    pub fn sequence(&mut self, tag: impl Into<String>, items: Vec<NodeId>, pos: Pos) -> NodeId {
        self.nodes.insert(NodeData {
            tag: tag.into(),
            kind: NodeKind::Sequence(items),
            pos,
        })
    }

    pub fn mapping(
        &mut self,
        tag: impl Into<String>,
        entries: Vec<(NodeId, NodeId)>,
        pos: Pos,
    ) -> NodeId {
        self.nodes.insert(NodeData {
            tag: tag.into(),
            kind: NodeKind::Mapping(entries),
            pos,
        })
    }

    /// Reserves an id before its content is known.
    ///
    /// The parser allocates anchored nodes up front so that an alias inside
    /// the anchored node's own body still resolves to the right id. The slot
    /// must be completed with [`fill`](Self::fill).
    pub fn reserve(&mut self, pos: Pos) -> NodeId {
        self.nodes.insert(NodeData {
            tag: String::new(),
            kind: NodeKind::Scalar(String::new()),
            pos,
        })
    }

    /// Completes a node previously created with [`reserve`](Self::reserve).
    pub fn fill(&mut self, id: NodeId, tag: impl Into<String>, kind: NodeKind) {
        let node = &mut self.nodes[id];
        node.tag = tag.into();
        node.kind = kind;
    }
}

impl Index<NodeId> for Document {
    type Output = NodeData;

    #[inline]
    fn index(&self, id: NodeId) -> &NodeData {
        &self.nodes[id]
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_index() {
        let mut doc = Document::new();
        let k = doc.scalar(tags::STR, "name", Pos::NONE);
        let v = doc.scalar(tags::INT, "3", Pos::new(1, 7));
        let root = doc.mapping(tags::MAP, vec![(k, v)], Pos::new(1, 1));
        doc.set_root(root);

        assert_eq!(doc.len(), 3);
        assert_eq!(doc[root].kind.name(), "mapping");
        assert_eq!(doc[v].tag, tags::INT);
        assert_eq!(doc[v].pos.to_string(), "line 1, column 7");
    }

    #[test]
    fn reserve_then_fill() {
        let mut doc = Document::new();
        let id = doc.reserve(Pos::new(2, 1));
        doc.fill(id, tags::SEQ, NodeKind::Sequence(Vec::new()));
        assert_eq!(doc[id].tag, tags::SEQ);
        assert_eq!(doc[id].pos, Pos::new(2, 1));
    }
}
