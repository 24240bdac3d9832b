//! Module registry lifecycle and configuration round-trip tests.

use apollo_options::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountdownModule {
    ticks: Arc<OptionDef>,
    options: OptionsSlot,
    enabled: AtomicUsize,
}

impl CountdownModule {
    fn new() -> ModuleResult<Self> {
        let ticks = Arc::new(
            OptionDef::builder()
                .comment("Set the amount of ticks before the TNT explodes.")
                .node(["tnt-ticks"])
                .kind(ValueKind::Int)
                .default_value(80i64)
                .min(1i64)
                .notify_client()
                .build()?,
        );
        Ok(Self {
            ticks,
            options: OptionsSlot::new(),
            enabled: AtomicUsize::new(0),
        })
    }
}

impl ApolloModule for CountdownModule {
    fn name(&self) -> &str {
        "TntCountdown"
    }

    fn option_defs(&self) -> Vec<Arc<OptionDef>> {
        vec![self.ticks.clone()]
    }

    fn client_notify(&self) -> bool {
        true
    }

    fn bind_options(&self, container: Arc<OptionsContainer>) {
        self.options.bind(container);
    }

    fn options(&self) -> Option<Arc<OptionsContainer>> {
        self.options.get()
    }

    fn enable(&self) -> ModuleResult<()> {
        self.enabled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct BrokenModule;

impl ApolloModule for BrokenModule {
    fn name(&self) -> &str {
        "Broken"
    }

    fn enable(&self) -> ModuleResult<()> {
        Err(ModuleError::Other("refusing to start".into()))
    }
}

fn registry() -> ModuleRegistry {
    ModuleRegistry::new(Arc::new(EventBus::new()), Arc::new(NullTransport))
}

const TNT: ModuleId = ModuleId::from_static("tnt_countdown");

#[test]
fn registration_is_idempotent() {
    let registry = registry();
    let constructions = Arc::new(AtomicUsize::new(0));
    let counted_factory = || {
        let constructions = constructions.clone();
        move || {
            constructions.fetch_add(1, Ordering::SeqCst);
            CountdownModule::new()
        }
    };

    let first = registry.add_module(TNT, counted_factory()).unwrap();
    let second = registry.add_module(TNT, counted_factory()).unwrap();

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(registry.is_enabled(&TNT));
    assert!(registry.get_module(&TNT).is_some());
}

#[test]
fn enable_failure_surfaces_as_initialization_error() {
    let registry = registry();
    let id = ModuleId::from_static("broken");

    let err = registry
        .add_module(id.clone(), || Ok(BrokenModule))
        .err()
        .unwrap();
    assert!(matches!(err, ModuleError::Initialization { .. }));
    assert!(!registry.is_enabled(&id));
}

#[test]
fn modules_iterate_in_registration_order() {
    let registry = registry();
    registry
        .add_module(ModuleId::from_static("b"), CountdownModule::new)
        .unwrap();
    registry
        .add_module(ModuleId::from_static("a"), CountdownModule::new)
        .unwrap();

    // Ordered by registration, not by identity.
    assert_eq!(registry.modules().len(), 2);
    let snapshots = registry.settings_snapshots();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].1.len(), 1);
}

#[test]
fn disconnect_drops_cached_views() {
    let registry = registry();
    let module = registry.add_module(TNT, CountdownModule::new).unwrap();
    let container = module.options().unwrap();

    let player = PlayerId::random();
    let view = container.view(player);
    let ticks = container.options().next().unwrap().clone();
    view.set(&ticks, Some(OptionValue::Int(20))).unwrap();

    registry.remove_player(player);

    // The replacement view starts clean.
    assert_eq!(container.view(player).get_direct(&ticks), None);
}

#[test]
fn configuration_round_trip_preserves_overrides() {
    let registry = registry();
    let module = registry.add_module(TNT, CountdownModule::new).unwrap();
    let container = module.options().unwrap();
    let ticks = container.options().next().unwrap().clone();

    container.set(&ticks, Some(OptionValue::Int(40))).unwrap();

    let mut doc = ConfigDocument::new();
    registry.save_configuration(&mut doc);
    let text = doc.to_toml_string();
    assert!(text.contains("[tntcountdown]"));
    assert!(text.contains("# Set the amount of ticks"));
    assert!(text.contains("tnt-ticks = 40"));

    // Load into a fresh registry; getDirect must match.
    let fresh = registry_from_text(&text);
    let module = fresh.get_module(&TNT).unwrap();
    let container = module.options().unwrap();
    let ticks = container.options().next().unwrap().clone();
    assert_eq!(container.get_direct(&ticks), Some(OptionValue::Int(40)));
}

#[test]
fn bad_config_entries_are_isolated() {
    let text = r#"
[tntcountdown]
tnt-ticks = 0
"#;
    // tnt-ticks = 0 violates min = 1: logged and skipped, default kept.
    let registry = registry_from_text(text);
    let module = registry.get_module(&TNT).unwrap();
    let container = module.options().unwrap();
    let ticks = container.options().next().unwrap().clone();
    assert_eq!(container.get(&ticks), OptionValue::Int(80));
    assert_eq!(container.get_direct(&ticks), None);
}

#[test]
fn absent_config_nodes_keep_defaults() {
    let registry = registry_from_text("[othermodule]\nx = 1\n");
    let module = registry.get_module(&TNT).unwrap();
    let container = module.options().unwrap();
    let ticks = container.options().next().unwrap().clone();
    assert_eq!(container.get_direct(&ticks), None);
}

fn registry_from_text(text: &str) -> ModuleRegistry {
    let registry = registry();
    registry.add_module(TNT, CountdownModule::new).unwrap();
    let tree = ConfigDocument::parse(text).unwrap();
    registry.load_configuration(&tree);
    registry
}
