//! Adapter for the stage family.
//!
//! Stages construct in two phases: the object is allocated (and its
//! identity cached) before any property is resolved, so property values may
//! reference sibling nodes, or the stage's own node, anywhere in the
//! document. The queued completion then assigns name, properties and, for
//! containers, children.

use td_codec::{
    AdapterRegistration, Construction, DecodeError, Decoder, DomainObject, EncodeError, Encoder,
    Registry, RegistryError, Value,
};
use td_model::stage::{FAMILY, descriptors, locate_stage};
use td_notation::NodeId;

/// Stable on-disk prefix; part of the format.
pub const TAG_PREFIX: &str = "stage/";

fn construct_stage(
    decoder: &mut Decoder<'_, '_>,
    suffix: &str,
    node: NodeId,
) -> Result<Construction, DecodeError> {
    let class = suffix.rsplit("::").next().unwrap_or(suffix);
    let make = locate_stage(class).ok_or_else(|| DecodeError::TypeResolution {
        name: class.to_owned(),
    })?;
    // Shape-check up front so a malformed node fails in phase one.
    decoder.mapping(node)?;

    let object = make();
    let handle = object.clone();
    Ok(Construction::Deferred {
        value: Value::Object(object),
        complete: Box::new(move |decoder: &mut Decoder<'_, '_>| {
            let name_id = match decoder.mapping_field(node, "name")? {
                Some(id) => id,
                None => {
                    return Err(decoder.malformed(node, "a stage mapping with a `name` entry"));
                }
            };
            // Names coerce to strings, whatever scalar they were written as.
            let name = decoder.scalar(name_id)?.to_owned();
            handle.borrow_mut().set_field("name", Value::Str(name))?;

            if let Some(id) = decoder.mapping_field(node, "properties")? {
                let properties = decoder.construct(id)?;
                handle.borrow_mut().set_field("properties", properties)?;
            }
            if let Some(id) = decoder.mapping_field(node, "children")? {
                let children = decoder.construct(id)?;
                handle.borrow_mut().set_field("children", children)?;
            }
            Ok(())
        }),
    })
}

fn represent_stage(
    encoder: &mut Encoder<'_>,
    object: &dyn DomainObject,
) -> Result<NodeId, EncodeError> {
    let tag = format!("{TAG_PREFIX}{}", object.type_name());
    encoder.represent_fields(&tag, object)
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_prefix(TAG_PREFIX, construct_stage)?;
    // Documents written by the legacy type-path scheme.
    for descriptor in descriptors() {
        let legacy = format!("td_model::stage::{}", descriptor.class_name);
        registry.register_constructor(&legacy, construct_stage)?;
    }
    registry.register_family_representer(FAMILY, represent_stage)
}

inventory::submit! {
    AdapterRegistration {
        name: "stage",
        register,
    }
}
