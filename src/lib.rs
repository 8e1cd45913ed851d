#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Facade

pub use td_codec as codec;
pub use td_model as model;
pub use td_notation as notation;

pub use td_codec::{DecodeError, EncodeError, ObjRef, Value};

pub mod adapters;


// -----------------------------------------------------------------------------
// Entrypoints

use std::fs::File;
use std::io::Write as _;
use std::path::Path;
use std::sync::OnceLock;

use td_codec::{Decoder, Registry};

/// The process-wide registry, populated once from every linked domain
/// adapter.
///
/// All registration happens inside this initialization; afterwards the
/// registry is read-only, so concurrent decodes and encodes on different
/// documents are safe. A registration conflict is a build misconfiguration
/// and panics here rather than surfacing from every decode.
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let registry = Registry::with_adapters()
            .unwrap_or_else(|err| panic!("domain adapter registration failed: {err}"));
        log::trace!("process registry ready");
        registry
    })
}

/// Encodes one value to notation text.
pub fn to_text(value: &Value) -> Result<String, EncodeError> {
    let doc = td_codec::encode(registry(), value)?;
    Ok(td_notation::emit(&doc))
}

/// Decodes one document.
pub fn from_text(text: &str) -> Result<Value, DecodeError> {
    let doc = td_notation::parse(text)?;
    Decoder::new(&doc, registry()).decode()
}

/// Encodes one value into a file.
///
/// The handle is acquired up front and closed on every exit path; if the
/// encoder fails, the (empty or partial) file is left behind but the handle
/// never leaks.
pub fn to_file(value: &Value, path: impl AsRef<Path>) -> Result<(), EncodeError> {
    let mut file = File::create(path)?;
    let text = to_text(value)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// Decodes one document from a file.
pub fn from_file(path: impl AsRef<Path>) -> Result<Value, DecodeError> {
    let text = std::fs::read_to_string(path)?;
    from_text(&text)
}
