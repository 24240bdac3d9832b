//! Error types for the option and module system

use crate::option::{OptionValue, ValueKind};
use thiserror::Error;

/// Schema errors raised while building an [`crate::option::OptionDef`].
///
/// These are fatal at module-registration time: a module declaring a
/// malformed option never becomes enabled.
#[derive(Debug, Error)]
pub enum OptionDefinitionError {
    #[error("option node path is required")]
    MissingNode,

    #[error("option value kind is required")]
    MissingKind,

    #[error("default value of kind {actual:?} does not match declared kind {declared:?}")]
    DefaultKindMismatch { declared: ValueKind, actual: ValueKind },

    #[error("options of kind {kind:?} require an explicit default value")]
    MissingDefault { kind: ValueKind },

    #[error("bounds are not supported for options of kind {kind:?}")]
    NonNumericBounds { kind: ValueKind },

    #[error("bound of kind {actual:?} does not match declared kind {declared:?}")]
    BoundKindMismatch { declared: ValueKind, actual: ValueKind },

    #[error("minimum bound {min:?} is greater than maximum bound {max:?}")]
    InvertedBounds { min: OptionValue, max: OptionValue },

    #[error("default value {value:?} is outside the declared bounds")]
    DefaultOutOfBounds { value: OptionValue },

    #[error("duplicate option key `{key}` in module `{module}`")]
    DuplicateKey { module: String, key: String },
}

/// Runtime errors raised by container and view mutators.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// The option passed to a mutator is not part of the container's schema.
    #[error("option `{key}` is not part of module `{module}`")]
    UnknownOption { module: String, key: String },

    #[error("value of kind {actual:?} does not match option `{key}` of kind {expected:?}")]
    KindMismatch {
        key: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// Out-of-bounds assignments are rejected, not clamped.
    #[error("value {value:?} for option `{key}` is outside the bounds [{min:?}, {max:?}]")]
    OutOfBounds {
        key: String,
        value: OptionValue,
        min: Option<OptionValue>,
        max: Option<OptionValue>,
    },

    /// The view's owning container has been dropped.
    #[error("options view is detached from its container")]
    DetachedView,
}

/// Per-option failures while loading or saving the configuration tree.
///
/// These are isolated: one bad entry is logged and skipped, the rest of
/// the load or save pass continues.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("encode failed: {0}")]
    Encode(String),
}

/// Event bus errors.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event serialization failed: {0}")]
    SerializationFailed(String),

    #[error("event deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("invalid event format: {0}")]
    InvalidEventFormat(String),

    #[error("handler failed: {0}")]
    HandlerFailed(String),
}

/// Module lifecycle errors.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// Construction, option binding, handler registration or `enable()`
    /// failed. Surfaced to the registration caller, never swallowed.
    #[error("module `{module}` failed to initialize")]
    Initialization {
        module: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Definition(#[from] OptionDefinitionError),

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error("{0}")]
    Other(String),
}

impl ModuleError {
    /// Wrap any failure that occurred while bringing up `module`.
    pub fn initialization(
        module: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Initialization {
            module: module.into(),
            source: source.into(),
        }
    }
}

pub type OptionsResult<T> = Result<T, OptionsError>;
pub type ModuleResult<T> = Result<T, ModuleError>;
