//! Configuration tree load/save for registered modules
//!
//! The external tree is a TOML table addressed by the module's lowercase
//! name followed by the option's node path. Loading treats an absent node
//! as "use the default" and isolates failures per option: one bad entry is
//! logged and skipped, never aborting the rest of the pass. Saving writes
//! the option comment and the current effective global value through a
//! comment-preserving document renderer, in registration order then
//! declared option order, so repeated saves are byte-identical.

use crate::error::ConfigError;
use crate::option::{Icon, OptionValue, ValueKind};
use crate::registry::ModuleRegistry;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

impl ModuleRegistry {
    /// Apply option values from `root` to every registered module.
    ///
    /// Decode and bounds failures are logged per option and leave that
    /// option at its default.
    pub fn load_configuration(&self, root: &toml::value::Table) {
        for module in self.modules() {
            let Some(container) = module.options() else {
                continue;
            };
            let module_name = module.name().to_lowercase();
            let Some(toml::Value::Table(module_node)) = root.get(&module_name) else {
                continue;
            };

            for option in container.options() {
                let Some(raw) = lookup(module_node, option.node()) else {
                    continue;
                };
                let decoded = match decode_value(option.kind(), raw) {
                    Ok(value) => value,
                    Err(error) => {
                        warn!(module = %module_name, key = option.key(), %error,
                            "skipping undecodable config entry");
                        continue;
                    }
                };
                if let Err(e) = container.set(option, Some(decoded)) {
                    warn!(module = %module_name, key = option.key(), error = %e,
                        "skipping rejected config entry");
                }
            }
        }
    }

    /// Write every registered module's options into `doc`.
    pub fn save_configuration(&self, doc: &mut ConfigDocument) {
        for module in self.modules() {
            let Some(container) = module.options() else {
                continue;
            };
            let section = doc.section(module.name().to_lowercase());

            for option in container.options() {
                let value = container.get(option);
                match encode_value(&value) {
                    Ok(encoded) => section.push(
                        option.node().to_vec(),
                        option.comment().map(str::to_string),
                        encoded,
                    ),
                    Err(error) => {
                        warn!(module = module.name(), key = option.key(), %error,
                            "skipping unencodable option value");
                    }
                }
            }
        }
    }
}

fn lookup<'a>(table: &'a toml::value::Table, node: &[String]) -> Option<&'a toml::Value> {
    let (last, parents) = node.split_last()?;
    let mut current = table;
    for segment in parents {
        match current.get(segment) {
            Some(toml::Value::Table(child)) => current = child,
            _ => return None,
        }
    }
    current.get(last)
}

/// Decode a configuration leaf into the option's declared kind.
pub fn decode_value(kind: ValueKind, raw: &toml::Value) -> Result<OptionValue, ConfigError> {
    let mismatch =
        || ConfigError::Decode(format!("expected a {kind:?} value, found {}", raw.type_str()));
    match kind {
        ValueKind::Bool => raw
            .as_bool()
            .map(OptionValue::Bool)
            .ok_or_else(mismatch),
        ValueKind::Int => raw.as_integer().map(OptionValue::Int).ok_or_else(mismatch),
        ValueKind::Float => match raw {
            toml::Value::Float(f) => Ok(OptionValue::Float(*f)),
            toml::Value::Integer(i) => Ok(OptionValue::Float(*i as f64)),
            _ => Err(mismatch()),
        },
        ValueKind::String => raw
            .as_str()
            .map(|s| OptionValue::String(s.to_string()))
            .ok_or_else(mismatch),
        ValueKind::Duration => {
            let seconds = match raw {
                toml::Value::Float(f) => *f,
                toml::Value::Integer(i) => *i as f64,
                _ => return Err(mismatch()),
            };
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(ConfigError::Decode(format!(
                    "invalid duration seconds: {seconds}"
                )));
            }
            Ok(OptionValue::Duration(Duration::from_secs_f64(seconds)))
        }
        ValueKind::Color => {
            let rgb = raw.as_integer().ok_or_else(mismatch)?;
            i32::try_from(rgb)
                .map(|rgb| OptionValue::Color(crate::option::Color(rgb)))
                .map_err(|_| {
                    ConfigError::Decode(format!(
                        "color {rgb} does not fit a signed 32-bit RGB value"
                    ))
                })
        }
        ValueKind::Uuid => {
            let text = raw.as_str().ok_or_else(mismatch)?;
            Uuid::parse_str(text)
                .map(OptionValue::Uuid)
                .map_err(|e| ConfigError::Decode(format!("invalid uuid: {e}")))
        }
        ValueKind::Icon => raw
            .clone()
            .try_into::<Icon>()
            .map(OptionValue::Icon)
            .map_err(|e| ConfigError::Decode(e.to_string())),
        ValueKind::IconList => raw
            .clone()
            .try_into::<Vec<Icon>>()
            .map(OptionValue::IconList)
            .map_err(|e| ConfigError::Decode(e.to_string())),
    }
}

/// Encode an option value as a configuration leaf.
pub fn encode_value(value: &OptionValue) -> Result<toml::Value, ConfigError> {
    Ok(match value {
        OptionValue::Bool(b) => toml::Value::Boolean(*b),
        OptionValue::Int(i) => toml::Value::Integer(*i),
        OptionValue::Float(f) => toml::Value::Float(*f),
        OptionValue::String(s) => toml::Value::String(s.clone()),
        OptionValue::Duration(d) => {
            if d.subsec_nanos() == 0 && d.as_secs() <= i64::MAX as u64 {
                toml::Value::Integer(d.as_secs() as i64)
            } else {
                toml::Value::Float(d.as_secs_f64())
            }
        }
        OptionValue::Color(c) => toml::Value::Integer(c.0 as i64),
        OptionValue::Uuid(u) => toml::Value::String(u.to_string()),
        OptionValue::Icon(icon) => {
            toml::Value::try_from(icon).map_err(|e| ConfigError::Encode(e.to_string()))?
        }
        OptionValue::IconList(icons) => {
            toml::Value::try_from(icons).map_err(|e| ConfigError::Encode(e.to_string()))?
        }
    })
}

// ============================================================================
// Comment-preserving save document
// ============================================================================

/// Rendered configuration output: one `[module]` section per module, each
/// entry optionally preceded by the option's comment.
#[derive(Debug, Default)]
pub struct ConfigDocument {
    sections: Vec<ConfigSection>,
}

#[derive(Debug)]
pub struct ConfigSection {
    name: String,
    entries: Vec<ConfigEntry>,
}

#[derive(Debug)]
struct ConfigEntry {
    node: Vec<String>,
    comment: Option<String>,
    value: toml::Value,
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or append the section for `name`.
    pub fn section(&mut self, name: impl Into<String>) -> &mut ConfigSection {
        let name = name.into();
        if let Some(i) = self.sections.iter().position(|s| s.name == name) {
            return &mut self.sections[i];
        }
        self.sections.push(ConfigSection {
            name,
            entries: Vec::new(),
        });
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    /// Render the document as TOML text.
    pub fn to_toml_string(&self) -> String {
        let mut out = String::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", render_key(&section.name)));
            for entry in &section.entries {
                if let Some(comment) = &entry.comment {
                    for line in comment.lines() {
                        out.push_str(&format!("# {line}\n"));
                    }
                }
                let key = entry
                    .node
                    .iter()
                    .map(|s| render_key(s))
                    .collect::<Vec<_>>()
                    .join(".");
                out.push_str(&format!("{key} = {}\n", render_value(&entry.value)));
            }
        }
        out
    }

    /// Parse rendered output back into a tree suitable for
    /// [`ModuleRegistry::load_configuration`].
    pub fn parse(text: &str) -> Result<toml::value::Table, toml::de::Error> {
        toml::from_str(text)
    }
}

impl ConfigSection {
    fn push(&mut self, node: Vec<String>, comment: Option<String>, value: toml::Value) {
        self.entries.push(ConfigEntry {
            node,
            comment,
            value,
        });
    }
}

fn is_bare_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn render_key(key: &str) -> String {
    if is_bare_key(key) {
        key.to_string()
    } else {
        render_string(key)
    }
}

fn render_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn render_value(value: &toml::Value) -> String {
    match value {
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => {
            if f.is_nan() {
                "nan".to_string()
            } else if f.is_infinite() {
                if *f < 0.0 { "-inf" } else { "inf" }.to_string()
            } else {
                let text = f.to_string();
                if text.contains('.') || text.contains('e') {
                    text
                } else {
                    format!("{text}.0")
                }
            }
        }
        toml::Value::String(s) => render_string(s),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(items) => {
            let inner = items.iter().map(render_value).collect::<Vec<_>>().join(", ");
            format!("[{inner}]")
        }
        toml::Value::Table(table) => {
            let inner = table
                .iter()
                .map(|(k, v)| format!("{} = {}", render_key(k), render_value(v)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{ {inner} }}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::Color;

    #[test]
    fn decodes_every_kind() {
        assert_eq!(
            decode_value(ValueKind::Bool, &toml::Value::Boolean(true)).unwrap(),
            OptionValue::Bool(true)
        );
        assert_eq!(
            decode_value(ValueKind::Int, &toml::Value::Integer(42)).unwrap(),
            OptionValue::Int(42)
        );
        assert_eq!(
            decode_value(ValueKind::Float, &toml::Value::Integer(3)).unwrap(),
            OptionValue::Float(3.0)
        );
        assert_eq!(
            decode_value(ValueKind::Duration, &toml::Value::Float(1.5)).unwrap(),
            OptionValue::Duration(Duration::from_millis(1500))
        );
        assert_eq!(
            decode_value(ValueKind::Color, &toml::Value::Integer(-65536)).unwrap(),
            OptionValue::Color(Color(-65536))
        );

        let id = Uuid::new_v4();
        assert_eq!(
            decode_value(ValueKind::Uuid, &toml::Value::String(id.to_string())).unwrap(),
            OptionValue::Uuid(id)
        );
    }

    #[test]
    fn rejects_mismatched_leaves() {
        let err = decode_value(ValueKind::Int, &toml::Value::String("x".into())).err().unwrap();
        assert!(matches!(err, ConfigError::Decode(_)));
        assert!(decode_value(ValueKind::Duration, &toml::Value::Float(-1.0)).is_err());
        assert!(decode_value(ValueKind::Color, &toml::Value::Integer(i64::MAX)).is_err());
        assert!(decode_value(ValueKind::Uuid, &toml::Value::String("not-a-uuid".into())).is_err());
    }

    #[test]
    fn icon_round_trips_through_toml() {
        let icon = Icon::SimpleResource {
            resource_location: "apollo/icon.png".into(),
            size: 16,
        };
        let encoded = encode_value(&OptionValue::Icon(icon.clone())).unwrap();
        let decoded = decode_value(ValueKind::Icon, &encoded).unwrap();
        assert_eq!(decoded, OptionValue::Icon(icon));
    }

    #[test]
    fn renders_non_finite_floats_as_toml_literals() {
        assert_eq!(render_value(&toml::Value::Float(f64::NAN)), "nan");
        assert_eq!(render_value(&toml::Value::Float(f64::INFINITY)), "inf");
        assert_eq!(render_value(&toml::Value::Float(f64::NEG_INFINITY)), "-inf");
        assert_eq!(render_value(&toml::Value::Float(2.0)), "2.0");

        let mut doc = ConfigDocument::new();
        doc.section("weights")
            .push(vec!["scale".into()], None, toml::Value::Float(f64::INFINITY));
        let tree = ConfigDocument::parse(&doc.to_toml_string()).unwrap();
        let section = tree["weights"].as_table().unwrap();
        assert_eq!(section["scale"].as_float(), Some(f64::INFINITY));
    }

    #[test]
    fn renders_comments_and_parses_back() {
        let mut doc = ConfigDocument::new();
        let section = doc.section("tntcountdown");
        section.push(
            vec!["tnt-ticks".into()],
            Some("Set the amount of ticks before the TNT explodes.".into()),
            toml::Value::Integer(80),
        );

        let text = doc.to_toml_string();
        assert!(text.contains("# Set the amount of ticks"));
        assert!(text.contains("tnt-ticks = 80"));

        let tree = ConfigDocument::parse(&text).unwrap();
        let module = tree["tntcountdown"].as_table().unwrap();
        assert_eq!(module["tnt-ticks"].as_integer(), Some(80));
    }
}
