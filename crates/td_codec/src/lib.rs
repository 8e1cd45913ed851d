#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Modules

mod decode;
mod encode;
mod error;
mod registry;
mod value;

// -----------------------------------------------------------------------------
// Exports

pub use decode::Decoder;
pub use encode::{Encoder, encode};
pub use error::{DecodeError, EncodeError};
pub use registry::{
    AdapterRegistration, Completion, Construction, ConstructFn, Registry, RegistryError,
    RepresentFn, Resolved, UnknownTagError, UnregisteredTypeError,
};
pub use value::{DomainObject, FieldError, Mapping, ObjRef, Value};

/// Nesting bound shared by the decoder and encoder.
///
/// Documents (or object graphs) deeper than this report
/// [`DecodeError::DepthExceeded`] / [`EncodeError::DepthExceeded`] instead of
/// exhausting the call stack.
pub const MAX_DEPTH: usize = 128;
