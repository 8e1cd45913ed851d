//! Adapter for the timestamped value family.

use td_codec::{
    AdapterRegistration, Construction, DecodeError, Decoder, DomainObject, EncodeError, Encoder,
    Registry, RegistryError, Value,
};
use td_model::time::{Duration, FAMILY, Time};
use td_notation::NodeId;

/// Stable on-disk prefix; part of the format.
pub const TAG_PREFIX: &str = "time/";

fn construct_time(
    decoder: &mut Decoder<'_, '_>,
    suffix: &str,
    node: NodeId,
) -> Result<Construction, DecodeError> {
    // Legacy type-path tags arrive whole; the class is the last segment
    // either way.
    let class = suffix.rsplit("::").next().unwrap_or(suffix);

    let secs = match decoder.mapping_field(node, "secs")? {
        Some(id) => decoder.scalar_i64(id)?,
        None => return Err(decoder.malformed(node, "a mapping with `secs` and `nsecs`")),
    };
    let nsecs = match decoder.mapping_field(node, "nsecs")? {
        Some(id) => decoder.scalar_i64(id)?,
        None => return Err(decoder.malformed(node, "a mapping with `secs` and `nsecs`")),
    };

    let value = match class {
        "Time" => Value::object(Time::new(secs, nsecs)),
        "Duration" => Value::object(Duration::new(secs, nsecs)),
        other => {
            return Err(DecodeError::TypeResolution {
                name: other.to_owned(),
            });
        }
    };
    Ok(Construction::Done(value))
}

fn represent_time(
    encoder: &mut Encoder<'_>,
    object: &dyn DomainObject,
) -> Result<NodeId, EncodeError> {
    let tag = format!("{TAG_PREFIX}{}", object.type_name());
    encoder.represent_fields(&tag, object)
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_prefix(TAG_PREFIX, construct_time)?;
    // Documents written by the legacy type-path scheme.
    registry.register_constructor("td_model::time::Time", construct_time)?;
    registry.register_constructor("td_model::time::Duration", construct_time)?;
    registry.register_family_representer(FAMILY, represent_time)
}

inventory::submit! {
    AdapterRegistration {
        name: "time",
        register,
    }
}
