//! Process-wide module registry
//!
//! Owns module lifecycle: construct once per identity, bind the options
//! container, subscribe to the event bus, enable. Registration is atomic
//! under concurrent first-call races: exactly one construction wins and
//! every caller observes the same instance.

use crate::container::OptionsContainer;
use crate::error::{ModuleError, ModuleResult};
use crate::event::EventBus;
use crate::module::{ApolloModule, ModuleId};
use crate::net::{OptionTransport, PlayerId};
use crate::option::{OptionDef, OptionValue};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

struct RegisteredModule {
    /// Registration sequence number; iteration is ordered by it.
    seq: usize,
    module: Arc<dyn ApolloModule>,
}

/// Table of enabled modules keyed by identity.
pub struct ModuleRegistry {
    modules: DashMap<ModuleId, RegisteredModule>,
    next_seq: AtomicUsize,
    bus: Arc<EventBus>,
    transport: Arc<dyn OptionTransport>,
}

impl ModuleRegistry {
    pub fn new(bus: Arc<EventBus>, transport: Arc<dyn OptionTransport>) -> Self {
        Self {
            modules: DashMap::new(),
            next_seq: AtomicUsize::new(0),
            bus,
            transport,
        }
    }

    /// Register and enable a module. Idempotent: if `id` is already
    /// present the existing instance is returned and the factory never
    /// runs. Construction, option binding, handler registration and
    /// `enable()` failures are wrapped into
    /// [`ModuleError::Initialization`] and surfaced to the caller.
    pub fn add_module<M, F>(&self, id: ModuleId, factory: F) -> ModuleResult<Arc<dyn ApolloModule>>
    where
        M: ApolloModule,
        F: FnOnce() -> ModuleResult<M>,
    {
        match self.modules.entry(id.clone()) {
            Entry::Occupied(entry) => {
                debug!(module = %id, "module already registered");
                Ok(entry.get().module.clone())
            }
            Entry::Vacant(entry) => {
                let module = self.initialize(&id, factory)?;
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                entry.insert(RegisteredModule {
                    seq,
                    module: module.clone(),
                });
                info!(module = %id, "enabled module");
                Ok(module)
            }
        }
    }

    fn initialize<M, F>(&self, id: &ModuleId, factory: F) -> ModuleResult<Arc<dyn ApolloModule>>
    where
        M: ApolloModule,
        F: FnOnce() -> ModuleResult<M>,
    {
        let wrap = |e: ModuleError| ModuleError::initialization(id.as_str(), e);

        let module: Arc<dyn ApolloModule> = Arc::new(factory().map_err(wrap)?);

        let options = module.option_defs();
        if !options.is_empty() {
            let container = OptionsContainer::new(
                module.name(),
                module.client_notify(),
                options,
                self.transport.clone(),
            )
            .map_err(|e| ModuleError::initialization(id.as_str(), e))?;
            module.bind_options(container);
        }

        module.register_handlers(&self.bus).map_err(wrap)?;
        module.enable().map_err(wrap)?;
        Ok(module)
    }

    pub fn is_enabled(&self, id: &ModuleId) -> bool {
        self.modules.contains_key(id)
    }

    pub fn get_module(&self, id: &ModuleId) -> Option<Arc<dyn ApolloModule>> {
        self.modules.get(id).map(|entry| entry.module.clone())
    }

    /// Snapshot of all enabled modules in registration order. Mutating the
    /// returned vector has no effect on the registry.
    pub fn modules(&self) -> Vec<Arc<dyn ApolloModule>> {
        let mut entries: Vec<(usize, Arc<dyn ApolloModule>)> = self
            .modules
            .iter()
            .map(|entry| (entry.seq, entry.module.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, module)| module).collect()
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.bus.clone()
    }

    /// Drop every cached per-player view for a disconnected player.
    pub fn remove_player(&self, player: PlayerId) {
        for module in self.modules() {
            if let Some(container) = module.options() {
                container.remove_view(player);
            }
        }
    }

    /// Per-module settings snapshots for a joining player: module name,
    /// then every notify-flagged option with its effective global value.
    /// Modules without client notification contribute an empty value set
    /// (the module is still announced as enabled).
    pub fn settings_snapshots(&self) -> Vec<(String, Vec<(Arc<OptionDef>, OptionValue)>)> {
        self.modules()
            .iter()
            .map(|module| {
                let values = module
                    .options()
                    .map(|container| container.notify_snapshot())
                    .unwrap_or_default();
                (module.name().to_string(), values)
            })
            .collect()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.modules.len())
            .finish()
    }
}
