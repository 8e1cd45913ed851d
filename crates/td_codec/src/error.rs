use thiserror::Error;

use td_notation::{ParseError, Pos};

use crate::registry::{UnknownTagError, UnregisteredTypeError};
use crate::value::FieldError;

// -----------------------------------------------------------------------------
// DecodeError

/// Everything that can abort a decode.
///
/// The engine does no local recovery: any of these aborts the whole call and
/// no partial object is handed back. The scalar/sequence/mapping shape
/// fallback for unregistered tags is a designed path, not an error.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    UnknownTag(#[from] UnknownTagError),
    /// A node (directly or transitively) requires its own not-yet-finished
    /// value. The format has no representation for reference cycles.
    #[error("unconstructable recursive node at {pos}")]
    RecursiveConstruction { pos: Pos },
    /// The tag names a family correctly but the concrete type cannot be
    /// located in the catalogs at decode time.
    #[error("cannot locate type `{name}` named by a document tag")]
    TypeResolution { name: String },
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("document nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },
    /// Node shape does not match what a constructor expects.
    #[error("expected {expected}, found {found} at {pos}")]
    MalformedDocument {
        expected: &'static str,
        found: String,
        pos: Pos,
    },
    #[error(transparent)]
    Syntax(#[from] ParseError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// -----------------------------------------------------------------------------
// EncodeError

/// Everything that can abort an encode.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    UnregisteredType(#[from] UnregisteredTypeError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("object graph nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
