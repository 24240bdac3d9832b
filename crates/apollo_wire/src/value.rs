//! Wire-value intermediate representation
//!
//! Every value that crosses the settings channel, option values and the
//! common shapes feature messages share alike, is first lifted into a
//! [`WireValue`]. Both serializers consume this one representation, so
//! the JSON and binary encodings cannot drift apart per type.

use apollo_options::{Icon, OptionValue};
use std::time::Duration;
use uuid::Uuid;

/// The single source of truth for "what can go over the wire".
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Compact numeric-unit string on the wire, e.g. `"15s"` or `"1.5s"`.
    Duration(Duration),
    /// Signed RGB integer.
    Color(i32),
    /// Encoded as a pair of unsigned 64-bit decimal strings.
    Uuid(Uuid),
    Location {
        world: String,
        x: f64,
        y: f64,
        z: f64,
    },
    BlockLocation {
        world: String,
        x: i32,
        y: i32,
        z: i32,
    },
    Cuboid2D {
        min_x: f64,
        min_z: f64,
        max_x: f64,
        max_z: f64,
    },
    EntityId {
        entity_id: i32,
        entity_uuid: Uuid,
    },
    Icon(Icon),
    List(Vec<WireValue>),
}

impl From<&OptionValue> for WireValue {
    fn from(value: &OptionValue) -> Self {
        match value {
            OptionValue::Bool(b) => WireValue::Bool(*b),
            OptionValue::Int(i) => WireValue::Int(*i),
            OptionValue::Float(f) => WireValue::Float(*f),
            OptionValue::String(s) => WireValue::String(s.clone()),
            OptionValue::Duration(d) => WireValue::Duration(*d),
            OptionValue::Color(c) => WireValue::Color(c.0),
            OptionValue::Uuid(u) => WireValue::Uuid(*u),
            OptionValue::Icon(icon) => WireValue::Icon(icon.clone()),
            OptionValue::IconList(icons) => {
                WireValue::List(icons.iter().cloned().map(WireValue::Icon).collect())
            }
        }
    }
}

impl From<OptionValue> for WireValue {
    fn from(value: OptionValue) -> Self {
        WireValue::from(&value)
    }
}
