//! Per-player option overlays
//!
//! A view holds only value overrides and a back-reference to its owning
//! container. It does not own the schema and it does not keep the
//! container alive. Resolution is a three-level fallback: view override,
//! then the container's global override, then the option default.

use crate::container::OptionsContainer;
use crate::error::{OptionsError, OptionsResult};
use crate::net::PlayerId;
use crate::option::{OptionDef, OptionValue};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Weak;

/// One player's override overlay on top of a module's options.
pub struct OptionsView {
    container: Weak<OptionsContainer>,
    player: PlayerId,
    overrides: DashMap<String, OptionValue>,
}

impl OptionsView {
    pub(crate) fn new(container: Weak<OptionsContainer>, player: PlayerId) -> Self {
        Self {
            container,
            player,
            overrides: DashMap::new(),
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Override here, else the container's effective global value, else
    /// the default. Never fails.
    pub fn get(&self, option: &OptionDef) -> OptionValue {
        if let Some(value) = self.overrides.get(option.key()) {
            return value.clone();
        }
        match self.container.upgrade() {
            Some(container) => container.get(option),
            None => option.default_value().clone(),
        }
    }

    /// The per-player override only.
    pub fn get_direct(&self, option: &OptionDef) -> Option<OptionValue> {
        self.overrides.get(option.key()).map(|v| v.clone())
    }

    /// Set this player's override. Reuses the container's change-detection
    /// rule: an override equal to the container's effective global value
    /// is normalized to a removal, and propagation is scoped to this one
    /// player and fires only when the player's resolved value changed.
    pub fn set(&self, option: &OptionDef, value: Option<OptionValue>) -> OptionsResult<()> {
        let container = self.container.upgrade().ok_or(OptionsError::DetachedView)?;
        let option = container.schema_option(option)?;
        if let Some(value) = &value {
            option.validate_assign(value)?;
        }
        if !container.post_update(&option, value.as_ref()) {
            return Ok(());
        }

        let global = container.get(&option);
        let changed = match value {
            Some(value) if value != global => {
                match self.overrides.entry(option.key().to_string()) {
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
            _ => self.overrides.remove(option.key()).is_some(),
        };

        if changed {
            let effective = self
                .overrides
                .get(option.key())
                .map(|v| v.clone())
                .unwrap_or(global);
            container.send_to_player(&option, &effective, self.player);
        }
        Ok(())
    }
}

impl std::fmt::Debug for OptionsView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsView")
            .field("player", &self.player)
            .field("overrides", &self.overrides.len())
            .finish()
    }
}
