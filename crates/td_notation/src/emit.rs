use slotmap::SecondaryMap;

use crate::node::{Document, NodeId, NodeKind, tags};
use crate::parse::resolve_plain;

// -----------------------------------------------------------------------------
// Emitter

/// Renders a document back to text.
///
/// Core tags are left implicit (the parser re-resolves them), strings are
/// quoted whenever the plain form would resolve to a different core tag, and
/// nodes referenced more than once get an anchor on first occurrence and an
/// alias afterwards, so a parsed document that shares nodes emits without
/// duplicating them.
pub fn emit(doc: &Document) -> String {
    let Some(root) = doc.root() else {
        return String::new();
    };
    let mut counts = SecondaryMap::new();
    count_refs(doc, root, &mut counts);

    let mut emitter = Emitter {
        doc,
        counts,
        names: SecondaryMap::new(),
        next_anchor: 1,
        out: String::new(),
    };
    emitter.write(root, 0);
    emitter.out.push('\n');
    emitter.out
}

fn count_refs(doc: &Document, id: NodeId, counts: &mut SecondaryMap<NodeId, u32>) {
    let seen = counts.get(id).copied().unwrap_or(0);
    counts.insert(id, seen + 1);
    if seen > 0 {
        return;
    }
    match &doc[id].kind {
        NodeKind::Scalar(_) => {}
        NodeKind::Sequence(items) => {
            for item in items {
                count_refs(doc, *item, counts);
            }
        }
        NodeKind::Mapping(entries) => {
            for (key, value) in entries {
                count_refs(doc, *key, counts);
                count_refs(doc, *value, counts);
            }
        }
    }
}

struct Emitter<'a> {
    doc: &'a Document,
    counts: SecondaryMap<NodeId, u32>,
    names: SecondaryMap<NodeId, String>,
    next_anchor: u32,
    out: String,
}

impl Emitter<'_> {
    fn write(&mut self, id: NodeId, indent: usize) {
        if let Some(name) = self.names.get(id) {
            self.out.push('*');
            self.out.push_str(name);
            return;
        }
        if self.counts.get(id).copied().unwrap_or(0) > 1 {
            let name = format!("a{}", self.next_anchor);
            self.next_anchor += 1;
            self.out.push('&');
            self.out.push_str(&name);
            self.out.push(' ');
            self.names.insert(id, name);
        }

        let doc = self.doc;
        let node = &doc[id];
        if !tags::is_core(&node.tag) {
            self.out.push('!');
            self.out.push_str(&node.tag);
            self.out.push(' ');
        }
        match &node.kind {
            NodeKind::Scalar(text) => self.write_scalar(&node.tag, text),
            NodeKind::Sequence(items) => {
                if items.is_empty() {
                    self.out.push_str("[]");
                } else {
                    self.out.push_str("[\n");
                    for item in items {
                        self.pad(indent + 1);
                        self.write(*item, indent + 1);
                        self.out.push_str(",\n");
                    }
                    self.pad(indent);
                    self.out.push(']');
                }
            }
            NodeKind::Mapping(entries) => {
                if entries.is_empty() {
                    self.out.push_str("{}");
                } else {
                    self.out.push_str("{\n");
                    for (key, value) in entries {
                        self.pad(indent + 1);
                        self.write(*key, indent + 1);
                        self.out.push_str(": ");
                        self.write(*value, indent + 1);
                        self.out.push_str(",\n");
                    }
                    self.pad(indent);
                    self.out.push('}');
                }
            }
        }
    }

    fn write_scalar(&mut self, tag: &str, text: &str) {
        let quote = if tag == tags::STR {
            text.is_empty() || resolve_plain(text) != tags::STR || !is_plain(text)
        } else if tags::is_core(tag) {
            false
        } else {
            text.is_empty() || !is_plain(text)
        };
        if quote {
            self.out.push('"');
            for c in text.chars() {
                match c {
                    '"' => self.out.push_str("\\\""),
                    '\\' => self.out.push_str("\\\\"),
                    '\n' => self.out.push_str("\\n"),
                    '\t' => self.out.push_str("\\t"),
                    '\r' => self.out.push_str("\\r"),
                    '\0' => self.out.push_str("\\0"),
                    c => self.out.push(c),
                }
            }
            self.out.push('"');
        } else {
            self.out.push_str(text);
        }
    }

    fn pad(&mut self, indent: usize) {
        for _ in 0..indent {
            self.out.push_str("  ");
        }
    }
}

fn is_plain(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '+' | '-'))
}

// -----------------------------------------------------------------------------
// Tests
