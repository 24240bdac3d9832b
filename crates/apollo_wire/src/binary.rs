//! Protobuf-style binary encoding of settings payloads
//!
//! Hand-rolled protobuf wire format for
//!
//! ```text
//! message ConfigurableSettings {
//!     string apollo_module = 1;
//!     map<string, google.protobuf.Value> properties = 2;
//! }
//! ```
//!
//! with the generic `google.protobuf.Value` / `Struct` / `ListValue`
//! envelope. The encoder consumes the canonical JSON tree produced by
//! [`crate::json`], so the binary format is by construction semantically
//! identical to the text format; there is no second per-type mapping to
//! keep in sync.

use crate::value::WireValue;
use serde_json::Value;

// google.protobuf.Value field numbers.
const VALUE_NULL: u32 = 1;
const VALUE_NUMBER: u32 = 2;
const VALUE_STRING: u32 = 3;
const VALUE_BOOL: u32 = 4;
const VALUE_STRUCT: u32 = 5;
const VALUE_LIST: u32 = 6;

// Wire types.
const WIRE_VARINT: u32 = 0;
const WIRE_FIXED64: u32 = 1;
const WIRE_LEN: u32 = 2;

fn put_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

fn put_key(buf: &mut Vec<u8>, field: u32, wire_type: u32) {
    put_varint(buf, u64::from(field << 3 | wire_type));
}

fn put_len_delimited(buf: &mut Vec<u8>, field: u32, bytes: &[u8]) {
    put_key(buf, field, WIRE_LEN);
    put_varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn put_string(buf: &mut Vec<u8>, field: u32, text: &str) {
    put_len_delimited(buf, field, text.as_bytes());
}

fn put_double(buf: &mut Vec<u8>, field: u32, value: f64) {
    put_key(buf, field, WIRE_FIXED64);
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Encode a canonical JSON tree as a `google.protobuf.Value` message.
fn encode_value(json: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    match json {
        Value::Null => {
            // NULL_VALUE enum, always zero.
            put_key(&mut buf, VALUE_NULL, WIRE_VARINT);
            put_varint(&mut buf, 0);
        }
        Value::Bool(b) => {
            put_key(&mut buf, VALUE_BOOL, WIRE_VARINT);
            put_varint(&mut buf, u64::from(*b));
        }
        Value::Number(n) => {
            // protobuf Value numbers are doubles, same as JSON semantics.
            put_double(&mut buf, VALUE_NUMBER, n.as_f64().unwrap_or(0.0));
        }
        Value::String(s) => put_string(&mut buf, VALUE_STRING, s),
        Value::Array(items) => {
            let mut list = Vec::new();
            for item in items {
                put_len_delimited(&mut list, 1, &encode_value(item));
            }
            put_len_delimited(&mut buf, VALUE_LIST, &list);
        }
        Value::Object(fields) => {
            let mut structure = Vec::new();
            for (key, value) in fields {
                let mut entry = Vec::new();
                put_string(&mut entry, 1, key);
                put_len_delimited(&mut entry, 2, &encode_value(value));
                put_len_delimited(&mut structure, 1, &entry);
            }
            put_len_delimited(&mut buf, VALUE_STRUCT, &structure);
        }
    }
    buf
}

/// Encode the settings envelope for one module.
pub fn encode_settings(module: &str, properties: &[(String, WireValue)]) -> Vec<u8> {
    let mut buf = Vec::new();
    put_string(&mut buf, 1, module);
    for (key, value) in properties {
        let mut entry = Vec::new();
        put_string(&mut entry, 1, key);
        put_len_delimited(&mut entry, 2, &encode_value(&crate::json::to_json(value)));
        put_len_delimited(&mut buf, 2, &entry);
    }
    buf
}
