//! Typed option descriptors and the option builder
//!
//! Every configurable setting a module exposes is described by an
//! [`OptionDef`]: a node path, a closed value-kind tag, a default, an
//! optional comment, optional inclusive numeric bounds, and a flag saying
//! whether changes must be pushed to connected clients. Descriptors are
//! immutable once built and shared behind `Arc` between the module, the
//! container, and call sites.

use crate::error::{OptionDefinitionError, OptionsError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;
use uuid::Uuid;

/// Closed set of value types an option can carry.
///
/// The tag is carried through the descriptor so encoding, decoding and
/// bounds checks dispatch statically instead of through runtime type
/// reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
    Duration,
    Color,
    Uuid,
    Icon,
    IconList,
}

impl ValueKind {
    /// Whether bounds may be declared for this kind.
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Float)
    }

    /// The natural zero value used when a builder declares no default.
    ///
    /// A bare `Icon` has no sensible zero, so it returns `None` and the
    /// builder demands an explicit default.
    pub fn zero_value(self) -> Option<OptionValue> {
        Some(match self {
            ValueKind::Bool => OptionValue::Bool(false),
            ValueKind::Int => OptionValue::Int(0),
            ValueKind::Float => OptionValue::Float(0.0),
            ValueKind::String => OptionValue::String(String::new()),
            ValueKind::Duration => OptionValue::Duration(Duration::ZERO),
            ValueKind::Color => OptionValue::Color(Color(0)),
            ValueKind::Uuid => OptionValue::Uuid(Uuid::nil()),
            ValueKind::IconList => OptionValue::IconList(Vec::new()),
            ValueKind::Icon => return None,
        })
    }
}

/// A packed signed RGB color, as the client wire format expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub i32);

/// Client-side icon descriptor, one of three shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Icon {
    /// Rendered from a game item, addressed by name or numeric id.
    #[serde(rename = "item_stack")]
    ItemStack {
        #[serde(skip_serializing_if = "Option::is_none")]
        item_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        item_id: Option<i32>,
        custom_model_data: i32,
    },
    /// A square texture addressed by resource location.
    #[serde(rename = "simple_resource_location")]
    SimpleResource { resource_location: String, size: i32 },
    /// A UV-mapped region of a texture.
    #[serde(rename = "advanced_resource_location")]
    AdvancedResource {
        resource_location: String,
        width: f32,
        height: f32,
        min_u: f32,
        max_u: f32,
        min_v: f32,
        max_v: f32,
    },
}

/// A dynamically tagged option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Duration(Duration),
    Color(Color),
    Uuid(Uuid),
    Icon(Icon),
    IconList(Vec<Icon>),
}

impl OptionValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            OptionValue::Bool(_) => ValueKind::Bool,
            OptionValue::Int(_) => ValueKind::Int,
            OptionValue::Float(_) => ValueKind::Float,
            OptionValue::String(_) => ValueKind::String,
            OptionValue::Duration(_) => ValueKind::Duration,
            OptionValue::Color(_) => ValueKind::Color,
            OptionValue::Uuid(_) => ValueKind::Uuid,
            OptionValue::Icon(_) => ValueKind::Icon,
            OptionValue::IconList(_) => ValueKind::IconList,
        }
    }

    /// Numeric ordering between two values of the same numeric kind.
    fn numeric_cmp(&self, other: &OptionValue) -> Option<Ordering> {
        match (self, other) {
            (OptionValue::Int(a), OptionValue::Int(b)) => Some(a.cmp(b)),
            (OptionValue::Float(a), OptionValue::Float(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        OptionValue::Float(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::String(v.to_string())
    }
}

impl From<Duration> for OptionValue {
    fn from(v: Duration) -> Self {
        OptionValue::Duration(v)
    }
}

/// Immutable descriptor of one configurable option.
#[derive(Debug)]
pub struct OptionDef {
    node: Vec<String>,
    key: String,
    kind: ValueKind,
    default: OptionValue,
    comment: Option<String>,
    notify: bool,
    min: Option<OptionValue>,
    max: Option<OptionValue>,
}

impl OptionDef {
    pub fn builder() -> OptionBuilder {
        OptionBuilder::default()
    }

    /// Path segments of this option under its module's configuration node.
    pub fn node(&self) -> &[String] {
        &self.node
    }

    /// The node path joined with `.`, unique within a module.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Value used whenever no override is stored.
    pub fn default_value(&self) -> &OptionValue {
        &self.default
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Whether changes to this option must be broadcast to clients.
    pub fn notify(&self) -> bool {
        self.notify
    }

    pub fn min(&self) -> Option<&OptionValue> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&OptionValue> {
        self.max.as_ref()
    }

    /// Validate a runtime assignment: the kind must match and the value
    /// must lie within the inclusive bounds. Violations are rejected, not
    /// clamped.
    pub fn validate_assign(&self, value: &OptionValue) -> Result<(), OptionsError> {
        if value.kind() != self.kind {
            return Err(OptionsError::KindMismatch {
                key: self.key.clone(),
                expected: self.kind,
                actual: value.kind(),
            });
        }

        let below = self
            .min
            .as_ref()
            .and_then(|min| value.numeric_cmp(min))
            .is_some_and(|ord| ord == Ordering::Less);
        let above = self
            .max
            .as_ref()
            .and_then(|max| value.numeric_cmp(max))
            .is_some_and(|ord| ord == Ordering::Greater);

        if below || above {
            return Err(OptionsError::OutOfBounds {
                key: self.key.clone(),
                value: value.clone(),
                min: self.min.clone(),
                max: self.max.clone(),
            });
        }

        Ok(())
    }
}

/// Fluent, single-use builder for [`OptionDef`].
///
/// `node` and `kind` are required; everything else is optional. `build`
/// consumes the builder and validates the whole definition at once.
#[derive(Debug, Default)]
pub struct OptionBuilder {
    node: Option<Vec<String>>,
    kind: Option<ValueKind>,
    comment: Option<String>,
    default: Option<OptionValue>,
    notify: bool,
    min: Option<OptionValue>,
    max: Option<OptionValue>,
}

impl OptionBuilder {
    /// Set the node path segments, e.g. `["tnt-ticks"]`.
    pub fn node<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.node = Some(segments.into_iter().map(Into::into).collect());
        self
    }

    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<OptionValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Inclusive minimum, numeric kinds only.
    pub fn min(mut self, value: impl Into<OptionValue>) -> Self {
        self.min = Some(value.into());
        self
    }

    /// Inclusive maximum, numeric kinds only.
    pub fn max(mut self, value: impl Into<OptionValue>) -> Self {
        self.max = Some(value.into());
        self
    }

    /// Mark changes to this option as client-visible.
    pub fn notify_client(mut self) -> Self {
        self.notify = true;
        self
    }

    pub fn build(self) -> Result<OptionDef, OptionDefinitionError> {
        let node = match self.node {
            Some(node) if !node.is_empty() && node.iter().all(|s| !s.is_empty()) => node,
            _ => return Err(OptionDefinitionError::MissingNode),
        };
        let kind = self.kind.ok_or(OptionDefinitionError::MissingKind)?;

        let default = match self.default {
            Some(value) if value.kind() != kind => {
                return Err(OptionDefinitionError::DefaultKindMismatch {
                    declared: kind,
                    actual: value.kind(),
                })
            }
            Some(value) => value,
            None => kind
                .zero_value()
                .ok_or(OptionDefinitionError::MissingDefault { kind })?,
        };

        for bound in [&self.min, &self.max].into_iter().flatten() {
            if !kind.is_numeric() {
                return Err(OptionDefinitionError::NonNumericBounds { kind });
            }
            if bound.kind() != kind {
                return Err(OptionDefinitionError::BoundKindMismatch {
                    declared: kind,
                    actual: bound.kind(),
                });
            }
        }

        if let (Some(min), Some(max)) = (&self.min, &self.max) {
            if min.numeric_cmp(max) == Some(Ordering::Greater) {
                return Err(OptionDefinitionError::InvertedBounds {
                    min: min.clone(),
                    max: max.clone(),
                });
            }
        }

        let below = self
            .min
            .as_ref()
            .and_then(|min| default.numeric_cmp(min))
            .is_some_and(|ord| ord == Ordering::Less);
        let above = self
            .max
            .as_ref()
            .and_then(|max| default.numeric_cmp(max))
            .is_some_and(|ord| ord == Ordering::Greater);
        if below || above {
            return Err(OptionDefinitionError::DefaultOutOfBounds { value: default });
        }

        let key = node.join(".");
        Ok(OptionDef {
            node,
            key,
            kind,
            default,
            comment: self.comment,
            notify: self.notify,
            min: self.min,
            max: self.max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_complete_option() {
        let opt = OptionDef::builder()
            .comment("Set the amount of ticks before the TNT explodes.")
            .node(["tnt-ticks"])
            .kind(ValueKind::Int)
            .default_value(80i64)
            .min(1i64)
            .max(i64::MAX)
            .notify_client()
            .build()
            .unwrap();

        assert_eq!(opt.key(), "tnt-ticks");
        assert_eq!(opt.default_value(), &OptionValue::Int(80));
        assert!(opt.notify());
        assert_eq!(
            opt.comment(),
            Some("Set the amount of ticks before the TNT explodes.")
        );
    }

    #[test]
    fn missing_node_or_kind_is_rejected() {
        let err = OptionDef::builder().kind(ValueKind::Bool).build().unwrap_err();
        assert!(matches!(err, OptionDefinitionError::MissingNode));

        let err = OptionDef::builder().node(["x"]).build().unwrap_err();
        assert!(matches!(err, OptionDefinitionError::MissingKind));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let err = OptionDef::builder()
            .node(["n"])
            .kind(ValueKind::Int)
            .min(10i64)
            .max(5i64)
            .build()
            .unwrap_err();
        assert!(matches!(err, OptionDefinitionError::InvertedBounds { .. }));
    }

    #[test]
    fn default_outside_bounds_is_rejected() {
        let err = OptionDef::builder()
            .node(["n"])
            .kind(ValueKind::Int)
            .default_value(0i64)
            .min(1i64)
            .build()
            .unwrap_err();
        assert!(matches!(err, OptionDefinitionError::DefaultOutOfBounds { .. }));
    }

    #[test]
    fn bounds_on_non_numeric_kinds_are_rejected() {
        let err = OptionDef::builder()
            .node(["n"])
            .kind(ValueKind::String)
            .min(1i64)
            .build()
            .unwrap_err();
        assert!(matches!(err, OptionDefinitionError::NonNumericBounds { .. }));
    }

    #[test]
    fn missing_default_falls_back_to_kind_zero() {
        let opt = OptionDef::builder()
            .node(["enabled"])
            .kind(ValueKind::Bool)
            .build()
            .unwrap();
        assert_eq!(opt.default_value(), &OptionValue::Bool(false));

        let err = OptionDef::builder()
            .node(["icon"])
            .kind(ValueKind::Icon)
            .build()
            .unwrap_err();
        assert!(matches!(err, OptionDefinitionError::MissingDefault { .. }));
    }

    #[test]
    fn runtime_assignment_is_rejected_outside_bounds() {
        let opt = OptionDef::builder()
            .node(["tnt-ticks"])
            .kind(ValueKind::Int)
            .default_value(80i64)
            .min(1i64)
            .build()
            .unwrap();

        assert!(opt.validate_assign(&OptionValue::Int(40)).is_ok());
        let err = opt.validate_assign(&OptionValue::Int(0)).unwrap_err();
        assert!(matches!(err, OptionsError::OutOfBounds { .. }));
        let err = opt.validate_assign(&OptionValue::Bool(true)).unwrap_err();
        assert!(matches!(err, OptionsError::KindMismatch { .. }));
    }
}
