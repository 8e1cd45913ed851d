#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Modules

mod emit;
mod node;
mod parse;

// -----------------------------------------------------------------------------
// Exports

pub use emit::emit;
pub use node::{Document, NodeData, NodeId, NodeKind, Pos, tags};
pub use parse::{MAX_PARSE_DEPTH, ParseError, ParseErrorKind, parse, resolve_plain};
