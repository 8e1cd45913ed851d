use std::collections::HashMap;

use thiserror::Error;

use crate::node::{Document, NodeId, NodeKind, Pos, tags};

/// Nesting bound for the parser; deeper input is reported, not recursed into.
pub const MAX_PARSE_DEPTH: usize = 256;

// -----------------------------------------------------------------------------
// Errors

#[derive(Debug, Error, PartialEq)]
pub enum ParseErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character `{0}`")]
    Unexpected(char),
    #[error("expected {0}")]
    Expected(&'static str),
    #[error("unknown alias `*{0}`")]
    UnknownAlias(String),
    #[error("unterminated quoted scalar")]
    UnterminatedString,
    #[error("unsupported escape `\\{0}`")]
    BadEscape(char),
    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("trailing content after document root")]
    TrailingContent,
}

/// A syntax error with the position it was detected at.
#[derive(Debug, Error, PartialEq)]
#[error("{kind} at {pos}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub pos: Pos,
}

impl ParseError {
    fn new(kind: ParseErrorKind, pos: Pos) -> Self {
        Self { kind, pos }
    }
}

// -----------------------------------------------------------------------------
// Plain scalar resolution

/// Resolves the core tag of an untagged plain scalar.
///
/// Also used by the emitter to decide when a string must be quoted to keep
/// its tag stable across a round trip.
pub fn resolve_plain(text: &str) -> &'static str {
    match text {
        "null" | "~" => tags::NULL,
        "true" | "false" => tags::BOOL,
        _ if text.parse::<i64>().is_ok() => tags::INT,
        _ if text.parse::<f64>().is_ok() => tags::FLOAT,
        _ => tags::STR,
    }
}

// -----------------------------------------------------------------------------
// Parser

/// Parses one document.
pub fn parse(text: &str) -> Result<Document, ParseError> {
    let mut parser = Parser {
        src: text,
        at: 0,
        line: 1,
        col: 1,
        doc: Document::new(),
        anchors: HashMap::new(),
        depth: 0,
    };
    let root = parser.node()?;
    parser.skip_ws();
    if parser.peek().is_some() {
        return Err(ParseError::new(ParseErrorKind::TrailingContent, parser.pos()));
    }
    parser.doc.set_root(root);
    Ok(parser.doc)
}

struct Parser<'a> {
    src: &'a str,
    at: usize,
    line: u32,
    col: u32,
    doc: Document,
    anchors: HashMap<String, NodeId>,
    depth: usize,
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '/' | '.' | '_' | '-')
}

fn is_plain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '+' | '-' | '~')
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-')
}

impl<'a> Parser<'a> {
    fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.at..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.at += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    /// Skips whitespace and `#` line comments.
    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn take_while(&mut self, pred: fn(char) -> bool) -> &'a str {
        let start = self.at;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
        &self.src[start..self.at]
    }

    fn expect(&mut self, want: char, what: &'static str) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(_) => Err(ParseError::new(ParseErrorKind::Expected(what), self.pos())),
            None => Err(ParseError::new(ParseErrorKind::UnexpectedEnd, self.pos())),
        }
    }

    fn node(&mut self) -> Result<NodeId, ParseError> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(ParseError::new(
                ParseErrorKind::TooDeep(MAX_PARSE_DEPTH),
                self.pos(),
            ));
        }
        self.depth += 1;
        let result = self.node_inner();
        self.depth -= 1;
        result
    }

    fn node_inner(&mut self) -> Result<NodeId, ParseError> {
        self.skip_ws();
        let pos = self.pos();
        match self.peek() {
            None => Err(ParseError::new(ParseErrorKind::UnexpectedEnd, pos)),
            Some('*') => {
                self.bump();
                let name = self.anchor_name()?;
                match self.anchors.get(name) {
                    Some(id) => Ok(*id),
                    None => Err(ParseError::new(
                        ParseErrorKind::UnknownAlias(name.to_owned()),
                        pos,
                    )),
                }
            }
            Some('&') => {
                self.bump();
                let name = self.anchor_name()?.to_owned();
                // Reserve the id before parsing the body so an alias inside
                // the anchored node's own content resolves to this node.
                let id = self.doc.reserve(pos);
                self.anchors.insert(name, id);
                let (tag, kind) = self.tagged_body()?;
                self.doc.fill(id, tag, kind);
                Ok(id)
            }
            Some(_) => {
                let (tag, kind) = self.tagged_body()?;
                Ok(match kind {
                    NodeKind::Scalar(text) => self.doc.scalar(tag, text, pos),
                    NodeKind::Sequence(items) => self.doc.sequence(tag, items, pos),
                    NodeKind::Mapping(entries) => self.doc.mapping(tag, entries, pos),
                })
            }
        }
    }

    fn anchor_name(&mut self) -> Result<&'a str, ParseError> {
        let name = self.take_while(is_name_char);
        if name.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::Expected("anchor name"),
                self.pos(),
            ));
        }
        Ok(name)
    }

    fn tagged_body(&mut self) -> Result<(String, NodeKind), ParseError> {
        self.skip_ws();
        let tag = if self.peek() == Some('!') {
            self.bump();
            let tag = self.take_while(is_tag_char);
            if tag.is_empty() {
                return Err(ParseError::new(ParseErrorKind::Expected("tag"), self.pos()));
            }
            self.skip_ws();
            Some(tag.to_owned())
        } else {
            None
        };

        match self.peek() {
            None => Err(ParseError::new(ParseErrorKind::UnexpectedEnd, self.pos())),
            Some('[') => {
                let items = self.sequence_body()?;
                Ok((tag.unwrap_or_else(|| tags::SEQ.to_owned()), NodeKind::Sequence(items)))
            }
            Some('{') => {
                let entries = self.mapping_body()?;
                Ok((tag.unwrap_or_else(|| tags::MAP.to_owned()), NodeKind::Mapping(entries)))
            }
            Some('"') => {
                let text = self.quoted()?;
                Ok((tag.unwrap_or_else(|| tags::STR.to_owned()), NodeKind::Scalar(text)))
            }
            Some(c) if is_plain_char(c) => {
                let text = self.take_while(is_plain_char).to_owned();
                let tag = tag.unwrap_or_else(|| resolve_plain(&text).to_owned());
                Ok((tag, NodeKind::Scalar(text)))
            }
            Some(c) => Err(ParseError::new(ParseErrorKind::Unexpected(c), self.pos())),
        }
    }

    fn sequence_body(&mut self) -> Result<Vec<NodeId>, ParseError> {
        self.bump(); // '['
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.bump();
                return Ok(items);
            }
            items.push(self.node()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                Some(_) => {
                    return Err(ParseError::new(
                        ParseErrorKind::Expected("`,` or `]`"),
                        self.pos(),
                    ));
                }
                None => return Err(ParseError::new(ParseErrorKind::UnexpectedEnd, self.pos())),
            }
        }
    }

    fn mapping_body(&mut self) -> Result<Vec<(NodeId, NodeId)>, ParseError> {
        self.bump(); // '{'
        let mut entries = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(entries);
            }
            let key = self.node()?;
            self.skip_ws();
            self.expect(':', "`:`")?;
            let value = self.node()?;
            entries.push((key, value));
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                Some(_) => {
                    return Err(ParseError::new(
                        ParseErrorKind::Expected("`,` or `}`"),
                        self.pos(),
                    ));
                }
                None => return Err(ParseError::new(ParseErrorKind::UnexpectedEnd, self.pos())),
            }
        }
    }

    fn quoted(&mut self) -> Result<String, ParseError> {
        self.bump(); // '"'
        let mut text = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnterminatedString,
                        self.pos(),
                    ));
                }
                Some('"') => return Ok(text),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some('0') => text.push('\0'),
                    Some('"') => text.push('"'),
                    Some('\\') => text.push('\\'),
                    Some(c) => {
                        return Err(ParseError::new(ParseErrorKind::BadEscape(c), self.pos()));
                    }
                    None => {
                        return Err(ParseError::new(
                            ParseErrorKind::UnterminatedString,
                            self.pos(),
                        ));
                    }
                },
                Some(c) => text.push(c),
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn scalar<'d>(doc: &'d Document, id: NodeId) -> &'d str {
        match &doc[id].kind {
            NodeKind::Scalar(s) => s,
            other => panic!("expected scalar, got {}", other.name()),
        }
    }

    #[test]
    fn plain_scalars_resolve_core_tags() {
        for (text, tag) in [
            ("5", tags::INT),
            ("-12", tags::INT),
            ("0.5", tags::FLOAT),
            ("true", tags::BOOL),
            ("null", tags::NULL),
            ("~", tags::NULL),
            ("hello", tags::STR),
        ] {
            let doc = parse(text).unwrap();
            let root = doc.root().unwrap();
            assert_eq!(doc[root].tag, tag, "for input {text:?}");
        }
    }

    #[test]
    fn quoted_scalar_stays_string() {
        let doc = parse(r#""true""#).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc[root].tag, tags::STR);
        assert_eq!(scalar(&doc, root), "true");
    }

    #[test]
    fn escapes() {
        let doc = parse(r#""a\nb\t\"\\""#).unwrap();
        assert_eq!(scalar(&doc, doc.root().unwrap()), "a\nb\t\"\\");
    }

    #[test]
    fn nested_collections() {
        let doc = parse("{name: fixed, items: [1, 2.5, x], empty: {}}").unwrap();
        let root = doc.root().unwrap();
        let NodeKind::Mapping(entries) = &doc[root].kind else {
            panic!("expected mapping");
        };
        assert_eq!(entries.len(), 3);
        assert_eq!(scalar(&doc, entries[0].0), "name");
        let NodeKind::Sequence(items) = &doc[entries[1].1].kind else {
            panic!("expected sequence");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(doc[items[1]].tag, tags::FLOAT);
    }

    #[test]
    fn application_tag_is_kept() {
        let doc = parse("!time/Time {secs: 5, nsecs: 250}").unwrap();
        assert_eq!(doc[doc.root().unwrap()].tag, "time/Time");
    }

    #[test]
    fn alias_shares_node_identity() {
        let doc = parse("{a: &x {v: 1}, b: *x}").unwrap();
        let NodeKind::Mapping(entries) = &doc[doc.root().unwrap()].kind else {
            panic!()
        };
        assert_eq!(entries[0].1, entries[1].1);
    }

    #[test]
    fn alias_to_enclosing_anchor_parses() {
        // The decoder rejects this later; the node graph itself is legal.
        let doc = parse("&a {self: *a}").unwrap();
        let root = doc.root().unwrap();
        let NodeKind::Mapping(entries) = &doc[root].kind else {
            panic!()
        };
        assert_eq!(entries[0].1, root);
    }

    #[test]
    fn unknown_alias_is_an_error() {
        let err = parse("{a: *nope}").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownAlias("nope".into()));
    }

    #[test]
    fn comments_and_trailing_commas() {
        let doc = parse("# header\n{a: 1, # inline\n b: [2,],}").unwrap();
        let NodeKind::Mapping(entries) = &doc[doc.root().unwrap()].kind else {
            panic!()
        };
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn trailing_content_is_an_error() {
        let err = parse("1 2").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TrailingContent);
    }

    #[test]
    fn missing_colon_reports_position() {
        let err = parse("{a 1}").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Expected("`:`"));
        assert_eq!(err.pos, Pos::new(1, 4));
    }

    #[test]
    fn depth_is_bounded() {
        let deep = "[".repeat(MAX_PARSE_DEPTH + 1);
        let err = parse(&deep).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeep(MAX_PARSE_DEPTH));
    }
}
