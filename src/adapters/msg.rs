//! Adapter for the message record family.

use td_codec::{
    AdapterRegistration, Construction, DecodeError, Decoder, DomainObject, EncodeError, Encoder,
    Registry, RegistryError, Value,
};
use td_model::msg::{FAMILY, descriptors, locate_message};
use td_notation::NodeId;

/// Stable on-disk prefix; part of the format.
pub const TAG_PREFIX: &str = "msg/";

fn construct_msg(
    decoder: &mut Decoder<'_, '_>,
    suffix: &str,
    node: NodeId,
) -> Result<Construction, DecodeError> {
    // The suffix is the wire name. Under the legacy scheme the wire name
    // itself was the whole tag, so exact matches land here too.
    let make = locate_message(suffix).ok_or_else(|| DecodeError::TypeResolution {
        name: suffix.to_owned(),
    })?;
    let object = make();

    // Records are single-phase: fields may nest records, sequences and
    // timestamps, but never reach back into the surrounding document.
    for (key_id, value_id) in decoder.mapping(node)? {
        let field = decoder.scalar(*key_id)?;
        let value = decoder.construct(*value_id)?;
        object.borrow_mut().set_field(field, value)?;
    }
    Ok(Construction::Done(Value::Object(object)))
}

fn represent_msg(
    encoder: &mut Encoder<'_>,
    object: &dyn DomainObject,
) -> Result<NodeId, EncodeError> {
    let tag = format!("{TAG_PREFIX}{}", object.type_name());
    encoder.represent_fields(&tag, object)
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_prefix(TAG_PREFIX, construct_msg)?;
    // Documents written by the legacy scheme tagged records with the bare
    // wire name; accept those for every cataloged record.
    for descriptor in descriptors() {
        registry.register_constructor(descriptor.type_name, construct_msg)?;
    }
    registry.register_family_representer(FAMILY, represent_msg)
}

inventory::submit! {
    AdapterRegistration {
        name: "msg",
        register,
    }
}
