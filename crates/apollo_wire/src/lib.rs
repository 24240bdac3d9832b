//! Settings wire encodings
//!
//! Option updates leave the server in one of two formats, negotiated per
//! player at handshake time: a JSON text payload for development clients
//! and a protobuf binary payload for production ones. Both are produced
//! from the same [`WireValue`] intermediate representation and the same
//! canonical JSON tree, so a value can never render differently between
//! the two.

pub mod binary;
pub mod json;
pub mod value;

pub use json::{duration_string, settings_payload, CONFIGURABLE_SETTINGS_TYPE};
pub use value::WireValue;

/// Which serialization a connection negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    Json,
    Protobuf,
}

/// Encode one module's settings payload in the given format.
///
/// `properties` carries the changed key/value pairs; a `WireValue::Null`
/// value signals a reset to the client.
pub fn encode_settings(
    format: WireFormat,
    module: &str,
    properties: &[(String, WireValue)],
) -> Vec<u8> {
    match format {
        WireFormat::Json => json::settings_payload(module, properties)
            .to_string()
            .into_bytes(),
        WireFormat::Protobuf => binary::encode_settings(module, properties),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_format_produces_utf8_text() {
        let bytes = encode_settings(
            WireFormat::Json,
            "TntCountdown",
            &[("tnt-ticks".to_string(), WireValue::Int(40))],
        );
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"apollo_module\":\"TntCountdown\""));
        assert!(text.contains("\"tnt-ticks\":40"));
    }

    #[test]
    fn null_signals_a_reset() {
        let bytes = encode_settings(
            WireFormat::Json,
            "TntCountdown",
            &[("tnt-ticks".to_string(), WireValue::Null)],
        );
        let payload: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(payload["properties"]["tnt-ticks"].is_null());
    }
}
