//! Module trait and identity
//!
//! A module is a named, process-lifetime unit that declares the options it
//! owns and exposes behavior methods that mutate global or per-player
//! state through its container. Modules are constructed by caller-supplied
//! factories at registration time (no reflection, no dynamic loading) and
//! are never destroyed at runtime.

use crate::container::OptionsContainer;
use crate::error::ModuleResult;
use crate::event::EventBus;
use crate::option::OptionDef;
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Registry identity of a module. Interned-string semantics: two ids with
/// the same text are the same module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleId(Cow<'static, str>);

impl ModuleId {
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pluggable Apollo module.
///
/// Lifecycle, driven by [`crate::registry::ModuleRegistry`]: the factory
/// constructs the instance, the registry binds an [`OptionsContainer`]
/// over the declared options (when there are any), subscribes the module
/// to the event bus via [`ApolloModule::register_handlers`] (exactly
/// once), then calls [`ApolloModule::enable`]. Any failure along the way
/// aborts that module's registration.
pub trait ApolloModule: Send + Sync + 'static {
    /// Display name; its lowercase form addresses the module in the
    /// configuration tree.
    fn name(&self) -> &str;

    /// The options this module owns, in declared order.
    fn option_defs(&self) -> Vec<Arc<OptionDef>> {
        Vec::new()
    }

    /// Module-level gate: combined with each option's notify flag to
    /// decide whether changes are pushed to clients.
    fn client_notify(&self) -> bool {
        false
    }

    /// Called once by the registry with the freshly created container.
    /// Modules that declare options keep the handle in an
    /// [`OptionsSlot`].
    fn bind_options(&self, _container: Arc<OptionsContainer>) {}

    /// The bound container, if this module declares options.
    fn options(&self) -> Option<Arc<OptionsContainer>> {
        None
    }

    /// Subscribe to the event bus. Called exactly once, before `enable`.
    fn register_handlers(&self, _bus: &Arc<EventBus>) -> ModuleResult<()> {
        Ok(())
    }

    /// Final lifecycle step; the module is live once this returns.
    fn enable(&self) -> ModuleResult<()> {
        Ok(())
    }
}

/// Write-once holder for a module's container, set by the registry during
/// binding.
#[derive(Debug, Default)]
pub struct OptionsSlot(OnceLock<Arc<OptionsContainer>>);

impl OptionsSlot {
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Attach the container. A second bind is ignored; the registry binds
    /// at most once per module.
    pub fn bind(&self, container: Arc<OptionsContainer>) {
        let _ = self.0.set(container);
    }

    pub fn get(&self) -> Option<Arc<OptionsContainer>> {
        self.0.get().cloned()
    }
}
