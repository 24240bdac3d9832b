//! Canonical JSON mapping for wire values
//!
//! This module defines the one value → JSON mapping both encodings share:
//! the text format sends it verbatim, the binary format encodes the same
//! tree as a protobuf `Value`. Shapes follow the client's configurable
//! settings schema: an explicit `@type` discriminator on the envelope,
//! durations as compact numeric-unit strings, colors as signed RGB
//! integers, UUIDs split into unsigned 64-bit decimal halves.

use crate::value::WireValue;
use apollo_options::Icon;
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

/// Type discriminator carried on every settings payload.
pub const CONFIGURABLE_SETTINGS_TYPE: &str =
    "type.googleapis.com/lunarclient.apollo.configurable.v1.ConfigurableSettings";

/// Compact duration string: whole seconds as `"15s"`, fractional seconds
/// with trailing zeros trimmed as `"1.5s"`.
pub fn duration_string(duration: &Duration) -> String {
    let seconds = duration.as_secs();
    let nanos = duration.subsec_nanos();
    if nanos == 0 {
        return format!("{seconds}s");
    }
    let mut fraction = format!("{nanos:09}");
    while fraction.ends_with('0') {
        fraction.pop();
    }
    format!("{seconds}.{fraction}s")
}

fn uuid_object(uuid: &Uuid) -> Value {
    let bits = uuid.as_u128();
    json!({
        "high64": ((bits >> 64) as u64).to_string(),
        "low64": (bits as u64).to_string(),
    })
}

fn icon_object(icon: &Icon) -> Value {
    // The serde shape of `Icon` is the wire shape: externally tagged with
    // the three resource-location keys the client expects.
    serde_json::to_value(icon).unwrap_or(Value::Null)
}

/// The canonical JSON rendition of a wire value.
pub fn to_json(value: &WireValue) -> Value {
    match value {
        WireValue::Null => Value::Null,
        WireValue::Bool(b) => json!(b),
        WireValue::Int(i) => json!(i),
        WireValue::Float(f) => json!(f),
        WireValue::String(s) => json!(s),
        WireValue::Duration(d) => json!(duration_string(d)),
        WireValue::Color(rgb) => json!({ "color": rgb }),
        WireValue::Uuid(u) => uuid_object(u),
        WireValue::Location { world, x, y, z } => json!({
            "world": world, "x": x, "y": y, "z": z,
        }),
        WireValue::BlockLocation { world, x, y, z } => json!({
            "world": world, "x": x, "y": y, "z": z,
        }),
        WireValue::Cuboid2D {
            min_x,
            min_z,
            max_x,
            max_z,
        } => json!({
            "min_x": min_x, "min_z": min_z, "max_x": max_x, "max_z": max_z,
        }),
        WireValue::EntityId {
            entity_id,
            entity_uuid,
        } => json!({
            "entity_id": entity_id,
            "entity_uuid": uuid_object(entity_uuid),
        }),
        WireValue::Icon(icon) => icon_object(icon),
        WireValue::List(items) => Value::Array(items.iter().map(to_json).collect()),
    }
}

/// The settings envelope for one module: type discriminator, module name,
/// and the changed key/value pairs.
pub fn settings_payload(module: &str, properties: &[(String, WireValue)]) -> Value {
    let mut props = serde_json::Map::new();
    for (key, value) in properties {
        props.insert(key.clone(), to_json(value));
    }
    json!({
        "@type": CONFIGURABLE_SETTINGS_TYPE,
        "apollo_module": module,
        "properties": Value::Object(props),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_strings_are_compact() {
        assert_eq!(duration_string(&Duration::from_secs(15)), "15s");
        assert_eq!(duration_string(&Duration::from_millis(1500)), "1.5s");
        assert_eq!(duration_string(&Duration::from_nanos(1)), "0.000000001s");
        assert_eq!(duration_string(&Duration::ZERO), "0s");
    }

    #[test]
    fn uuid_splits_into_unsigned_decimal_halves() {
        let uuid = Uuid::from_u128(0xFFFF_FFFF_FFFF_FFFF_0000_0000_0000_0001);
        let object = to_json(&WireValue::Uuid(uuid));
        assert_eq!(object["high64"], "18446744073709551615");
        assert_eq!(object["low64"], "1");
    }

    #[test]
    fn color_is_a_signed_rgb_integer() {
        let object = to_json(&WireValue::Color(-65536));
        assert_eq!(object["color"], -65536);
    }

    #[test]
    fn icon_shapes_match_the_client_schema() {
        let simple = to_json(&WireValue::Icon(Icon::SimpleResource {
            resource_location: "apollo/icon.png".into(),
            size: 16,
        }));
        assert_eq!(
            simple["simple_resource_location"]["resource_location"],
            "apollo/icon.png"
        );
        assert_eq!(simple["simple_resource_location"]["size"], 16);

        let item = to_json(&WireValue::Icon(Icon::ItemStack {
            item_name: Some("minecraft:diamond".into()),
            item_id: None,
            custom_model_data: 3,
        }));
        assert_eq!(item["item_stack"]["item_name"], "minecraft:diamond");
        assert!(item["item_stack"].get("item_id").is_none());

        let advanced = to_json(&WireValue::Icon(Icon::AdvancedResource {
            resource_location: "apollo/sheet.png".into(),
            width: 64.0,
            height: 64.0,
            min_u: 0.0,
            max_u: 0.5,
            min_v: 0.25,
            max_v: 1.0,
        }));
        let advanced = &advanced["advanced_resource_location"];
        assert_eq!(advanced["max_u"], 0.5);
        assert_eq!(advanced["min_v"], 0.25);
    }

    #[test]
    fn settings_payload_carries_the_type_discriminator() {
        let payload = settings_payload(
            "TntCountdown",
            &[("tnt-ticks".to_string(), WireValue::Int(40))],
        );
        assert_eq!(payload["@type"], CONFIGURABLE_SETTINGS_TYPE);
        assert_eq!(payload["apollo_module"], "TntCountdown");
        assert_eq!(payload["properties"]["tnt-ticks"], 40);
    }
}
