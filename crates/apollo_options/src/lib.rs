//! # Apollo Options
//!
//! Module/option synchronization core for the Apollo client-settings
//! protocol: a registry of pluggable modules, each exposing typed,
//! validated configuration options whose per-player effective value is
//! computed, diffed, and pushed to connected clients exactly once per
//! change.
//!
//! The building blocks:
//!
//! - [`OptionDef`] / [`OptionBuilder`]: immutable, validated option
//!   descriptors with a closed [`ValueKind`] tag, defaults, bounds and a
//!   client-notify flag.
//! - [`OptionsContainer`]: per-module sparse value store with
//!   change-detected propagation and per-player [`OptionsView`] overlays.
//! - [`ApolloModule`] / [`ModuleRegistry`]: factory-constructed modules,
//!   atomic insert-if-absent registration, event-bus subscription,
//!   configuration load/save.
//! - [`OptionTransport`]: the network propagation boundary; encoding and
//!   delivery live in the `apollo_wire` and `apollo_network` crates.
//!
//! ## Example
//!
//! ```rust
//! use apollo_options::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ticks = Arc::new(
//!     OptionDef::builder()
//!         .comment("Set the amount of ticks before the TNT explodes.")
//!         .node(["tnt-ticks"])
//!         .kind(ValueKind::Int)
//!         .default_value(80i64)
//!         .min(1i64)
//!         .notify_client()
//!         .build()?,
//! );
//!
//! let container = OptionsContainer::new(
//!     "TntCountdown",
//!     true,
//!     vec![ticks.clone()],
//!     Arc::new(NullTransport),
//! )?;
//!
//! container.set(&ticks, Some(OptionValue::Int(40)))?;
//! assert_eq!(container.get(&ticks), OptionValue::Int(40));
//!
//! // Setting the default resets the override.
//! container.set(&ticks, Some(OptionValue::Int(80)))?;
//! assert_eq!(container.get_direct(&ticks), None);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod event;
pub mod module;
pub mod net;
pub mod option;
pub mod registry;
pub mod view;

pub use config::{decode_value, encode_value, ConfigDocument};
pub use container::{OptionsContainer, UpdateHook};
pub use error::{
    ConfigError, EventError, ModuleError, ModuleResult, OptionDefinitionError, OptionsError,
    OptionsResult,
};
pub use event::{Event, EventBus, EventData, PlayerConnectedEvent, PlayerDisconnectedEvent};
pub use module::{ApolloModule, ModuleId, OptionsSlot};
pub use net::{NullTransport, OptionTransport, PlayerId, Recipients};
pub use option::{Color, Icon, OptionBuilder, OptionDef, OptionValue, ValueKind};
pub use registry::ModuleRegistry;
pub use view::OptionsView;
