//! Per-module option container with change-detected propagation
//!
//! One container exists per module that declares options. The schema is
//! fixed at construction; the value store is sparse: an absent key means
//! "use the default", and a write that equals the default is normalized to
//! a removal so "reset to default" and "never overridden" are
//! indistinguishable.
//!
//! Mutators detect whether the visible value actually changed and hand the
//! new effective value to the [`OptionTransport`] at most once per change.
//! The one deliberate exception is [`OptionsContainer::replace`], which
//! always propagates. Compound read-modify-write sequences go through
//! `DashMap` entry-level operations so concurrent callers cannot interleave
//! between the check and the write, and the transport is only invoked after
//! the entry guard is dropped.

use crate::error::{OptionDefinitionError, OptionsError, OptionsResult};
use crate::net::{OptionTransport, PlayerId, Recipients};
use crate::option::{OptionDef, OptionValue};
use crate::view::OptionsView;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Pre-update hook consulted before every mutation.
///
/// Returning `false` vetoes the change; the mutator returns without
/// effect. `remove` passes `None`, mirroring a reset.
pub trait UpdateHook: Send + Sync {
    fn post_update(&self, option: &OptionDef, value: Option<&OptionValue>) -> bool;
}

/// Container of a module's options and their current global values.
pub struct OptionsContainer {
    module: String,
    client_notify: bool,
    schema: Vec<Arc<OptionDef>>,
    index: HashMap<String, usize>,
    values: DashMap<String, OptionValue>,
    views: DashMap<PlayerId, Arc<OptionsView>>,
    transport: Arc<dyn OptionTransport>,
    hook: Option<Arc<dyn UpdateHook>>,
}

impl OptionsContainer {
    /// Create a container for `module` over the declared option set.
    ///
    /// Fails if two options share a key.
    pub fn new(
        module: impl Into<String>,
        client_notify: bool,
        options: Vec<Arc<OptionDef>>,
        transport: Arc<dyn OptionTransport>,
    ) -> Result<Arc<Self>, OptionDefinitionError> {
        Self::with_hook(module, client_notify, options, transport, None)
    }

    /// As [`OptionsContainer::new`], with a veto hook ahead of every
    /// mutation.
    pub fn with_hook(
        module: impl Into<String>,
        client_notify: bool,
        options: Vec<Arc<OptionDef>>,
        transport: Arc<dyn OptionTransport>,
        hook: Option<Arc<dyn UpdateHook>>,
    ) -> Result<Arc<Self>, OptionDefinitionError> {
        let module = module.into();
        let mut index = HashMap::with_capacity(options.len());
        for (i, option) in options.iter().enumerate() {
            if index.insert(option.key().to_string(), i).is_some() {
                return Err(OptionDefinitionError::DuplicateKey {
                    module,
                    key: option.key().to_string(),
                });
            }
        }

        Ok(Arc::new(Self {
            module,
            client_notify,
            schema: options,
            index,
            values: DashMap::new(),
            views: DashMap::new(),
            transport,
            hook,
        }))
    }

    /// Name of the owning module.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The option schema in declared order.
    pub fn options(&self) -> impl Iterator<Item = &Arc<OptionDef>> {
        self.schema.iter()
    }

    /// Resolve a caller-supplied descriptor against the schema.
    ///
    /// The schema's own descriptor is returned and used from there on, so
    /// a stale clone cannot smuggle different defaults or bounds in.
    pub(crate) fn schema_option(&self, option: &OptionDef) -> OptionsResult<Arc<OptionDef>> {
        self.index
            .get(option.key())
            .map(|&i| self.schema[i].clone())
            .ok_or_else(|| OptionsError::UnknownOption {
                module: self.module.clone(),
                key: option.key().to_string(),
            })
    }

    /// The effective global value: the stored override if present, else
    /// the default. Never fails.
    pub fn get(&self, option: &OptionDef) -> OptionValue {
        self.values
            .get(option.key())
            .map(|v| v.clone())
            .unwrap_or_else(|| option.default_value().clone())
    }

    /// The stored override only; distinguishes "explicitly set" from
    /// "defaulted".
    pub fn get_direct(&self, option: &OptionDef) -> Option<OptionValue> {
        self.values.get(option.key()).map(|v| v.clone())
    }

    /// Set the global value. `None` (or a value equal to the default)
    /// resets to default. Propagates to all players only when the stored
    /// state actually changed.
    pub fn set(&self, option: &OptionDef, value: Option<OptionValue>) -> OptionsResult<()> {
        let option = self.schema_option(option)?;
        if let Some(value) = &value {
            option.validate_assign(value)?;
        }
        if !self.post_update(&option, value.as_ref()) {
            return Ok(());
        }

        let changed = match value {
            Some(value) if value != *option.default_value() => {
                match self.values.entry(option.key().to_string()) {
                    Entry::Occupied(entry) if *entry.get() == value => false,
                    Entry::Occupied(mut entry) => {
                        entry.insert(value);
                        true
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(value);
                        true
                    }
                }
            }
            _ => self.values.remove(option.key()).is_some(),
        };

        if changed {
            self.broadcast(&option);
        }
        Ok(())
    }

    /// Store `value` only if no override currently exists. Propagates only
    /// on the call that actually inserts. A default-equal value is a
    /// no-op: the store never holds defaults.
    pub fn add(&self, option: &OptionDef, value: OptionValue) -> OptionsResult<()> {
        let option = self.schema_option(option)?;
        option.validate_assign(&value)?;
        if !self.post_update(&option, Some(&value)) {
            return Ok(());
        }
        if value == *option.default_value() {
            return Ok(());
        }

        let inserted = match self.values.entry(option.key().to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(value);
                true
            }
        };

        if inserted {
            self.broadcast(&option);
        }
        Ok(())
    }

    /// Remove the override only if it currently equals `compare`.
    /// Propagates the default as the new effective state on success.
    pub fn remove(&self, option: &OptionDef, compare: &OptionValue) -> OptionsResult<()> {
        let option = self.schema_option(option)?;
        if !self.post_update(&option, None) {
            return Ok(());
        }

        let removed = self
            .values
            .remove_if(option.key(), |_, current| current == compare)
            .is_some();

        if removed {
            self.broadcast(&option);
        }
        Ok(())
    }

    /// Recompute the stored value from the current override (or `None`)
    /// and propagate the result unconditionally — even when the value is
    /// unchanged. Remapping functions are assumed to always represent a
    /// meaningful update (counters, accumulators).
    pub fn replace<F>(&self, option: &OptionDef, remap: F) -> OptionsResult<()>
    where
        F: FnOnce(&OptionDef, Option<OptionValue>) -> Option<OptionValue>,
    {
        let option = self.schema_option(option)?;

        match self.values.entry(option.key().to_string()) {
            Entry::Occupied(mut entry) => {
                match remap(&option, Some(entry.get().clone())) {
                    Some(value) if value != *option.default_value() => {
                        option.validate_assign(&value)?;
                        entry.insert(value);
                    }
                    _ => {
                        entry.remove();
                    }
                }
            }
            Entry::Vacant(entry) => match remap(&option, None) {
                Some(value) if value != *option.default_value() => {
                    option.validate_assign(&value)?;
                    entry.insert(value);
                }
                _ => {}
            },
        }

        self.broadcast(&option);
        Ok(())
    }

    /// The per-player view, created on first access. Views are keyed by
    /// the player's stable id and must be dropped explicitly on
    /// disconnect via [`OptionsContainer::remove_view`].
    pub fn view(self: &Arc<Self>, player: PlayerId) -> Arc<OptionsView> {
        self.views
            .entry(player)
            .or_insert_with(|| Arc::new(OptionsView::new(Arc::downgrade(self), player)))
            .clone()
    }

    /// Drop the cached view for a disconnected player.
    pub fn remove_view(&self, player: PlayerId) -> bool {
        let removed = self.views.remove(&player).is_some();
        if removed {
            debug!(module = %self.module, %player, "dropped options view");
        }
        removed
    }

    /// Notify-flagged options with their effective global values, for the
    /// settings snapshot pushed to a joining player.
    pub fn notify_snapshot(&self) -> Vec<(Arc<OptionDef>, OptionValue)> {
        if !self.client_notify {
            return Vec::new();
        }
        self.schema
            .iter()
            .filter(|option| option.notify())
            .map(|option| (option.clone(), self.get(option)))
            .collect()
    }

    pub(crate) fn post_update(&self, option: &OptionDef, value: Option<&OptionValue>) -> bool {
        match &self.hook {
            Some(hook) => hook.post_update(option, value),
            None => true,
        }
    }

    pub(crate) fn should_notify(&self, option: &OptionDef) -> bool {
        self.client_notify && option.notify()
    }

    /// Send the current effective global value to all players. The value
    /// is snapshotted here; no map lock is held across the transport call.
    fn broadcast(&self, option: &Arc<OptionDef>) {
        if !self.should_notify(option) {
            return;
        }
        let effective = self.get(option);
        debug!(module = %self.module, key = option.key(), "propagating option change");
        self.transport
            .send_option(&self.module, option, &effective, Recipients::All);
    }

    /// Scoped variant used by views after a per-player override change.
    pub(crate) fn send_to_player(
        &self,
        option: &OptionDef,
        effective: &OptionValue,
        player: PlayerId,
    ) {
        if !self.should_notify(option) {
            return;
        }
        debug!(module = %self.module, key = option.key(), %player, "propagating player option change");
        self.transport
            .send_option(&self.module, option, effective, Recipients::One(player));
    }
}

impl<'a> IntoIterator for &'a OptionsContainer {
    type Item = &'a Arc<OptionDef>;
    type IntoIter = std::slice::Iter<'a, Arc<OptionDef>>;

    /// Iterating a container yields its schema in declared order.
    fn into_iter(self) -> Self::IntoIter {
        self.schema.iter()
    }
}

impl std::fmt::Debug for OptionsContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsContainer")
            .field("module", &self.module)
            .field("client_notify", &self.client_notify)
            .field("options", &self.schema.len())
            .field("overrides", &self.values.len())
            .field("views", &self.views.len())
            .finish()
    }
}
