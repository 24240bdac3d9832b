//! End-to-end propagation tests: container mutation to encoded payloads.

use apollo_network::{NetworkPropagator, PlayerConnection, PlayerTable};
use apollo_options::{
    ApolloModule, EventBus, ModuleId, ModuleRegistry, ModuleResult, OptionDef, OptionValue,
    OptionsContainer, OptionsSlot, PlayerId, ValueKind,
};
use apollo_wire::WireFormat;
use std::sync::Arc;
use tokio::sync::mpsc;

fn ticks_option() -> Arc<OptionDef> {
    Arc::new(
        OptionDef::builder()
            .node(["tnt-ticks"])
            .kind(ValueKind::Int)
            .default_value(80i64)
            .min(1i64)
            .notify_client()
            .build()
            .unwrap(),
    )
}

fn container(transport: Arc<NetworkPropagator>) -> Arc<OptionsContainer> {
    OptionsContainer::new("TntCountdown", true, vec![ticks_option()], transport).unwrap()
}

fn join(
    table: &PlayerTable,
    name: &str,
    format: WireFormat,
) -> (PlayerId, mpsc::UnboundedReceiver<Vec<u8>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = PlayerId::random();
    table.connect(PlayerConnection::new(id, name, format, tx));
    (id, rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>) -> Vec<Vec<u8>> {
    let mut payloads = Vec::new();
    while let Ok(payload) = rx.try_recv() {
        payloads.push(payload);
    }
    payloads
}

#[tokio::test]
async fn global_changes_reach_every_format() {
    let table = Arc::new(PlayerTable::new());
    let propagator = Arc::new(NetworkPropagator::new(table.clone()));
    let container = container(propagator);

    let (_, mut json_rx) = join(&table, "dev", WireFormat::Json);
    let (_, mut proto_rx) = join(&table, "prod", WireFormat::Protobuf);

    let ticks = container.options().next().unwrap().clone();
    container.set(&ticks, Some(OptionValue::Int(40))).unwrap();

    let json = drain(&mut json_rx);
    assert_eq!(json.len(), 1);
    let payload: serde_json::Value = serde_json::from_slice(&json[0]).unwrap();
    assert_eq!(payload["apollo_module"], "TntCountdown");
    assert_eq!(payload["properties"]["tnt-ticks"], 40);

    let proto = drain(&mut proto_rx);
    assert_eq!(proto.len(), 1);
    // Binary payloads are protobuf, not JSON text.
    assert!(serde_json::from_slice::<serde_json::Value>(&proto[0]).is_err());
}

#[tokio::test]
async fn per_player_sends_skip_other_connections() {
    let table = Arc::new(PlayerTable::new());
    let propagator = Arc::new(NetworkPropagator::new(table.clone()));
    let container = container(propagator);

    let (alice, mut alice_rx) = join(&table, "alice", WireFormat::Json);
    let (_, mut bob_rx) = join(&table, "bob", WireFormat::Json);

    let ticks = container.options().next().unwrap().clone();
    let view = container.view(alice);
    view.set(&ticks, Some(OptionValue::Int(20))).unwrap();

    assert_eq!(drain(&mut alice_rx).len(), 1);
    assert!(drain(&mut bob_rx).is_empty());
}

#[tokio::test]
async fn disconnected_players_stop_receiving() {
    let table = Arc::new(PlayerTable::new());
    let propagator = Arc::new(NetworkPropagator::new(table.clone()));
    let container = container(propagator);

    let (gone, mut gone_rx) = join(&table, "gone", WireFormat::Json);
    table.disconnect(gone);
    assert!(table.is_empty());

    let ticks = container.options().next().unwrap().clone();
    container.set(&ticks, Some(OptionValue::Int(40))).unwrap();

    assert!(drain(&mut gone_rx).is_empty());
}

struct CountdownModule {
    options: OptionsSlot,
}

impl ApolloModule for CountdownModule {
    fn name(&self) -> &str {
        "TntCountdown"
    }

    fn option_defs(&self) -> Vec<Arc<OptionDef>> {
        vec![ticks_option()]
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
}

#[tokio::test]
async fn join_snapshot_announces_enabled_modules() {
    let table = Arc::new(PlayerTable::new());
    let propagator = Arc::new(NetworkPropagator::new(table.clone()));
    let registry = ModuleRegistry::new(Arc::new(EventBus::new()), propagator.clone());

    let factory = || -> ModuleResult<CountdownModule> {
        Ok(CountdownModule {
            options: OptionsSlot::new(),
        })
    };
    registry
        .add_module(ModuleId::from_static("tnt_countdown"), factory)
        .unwrap();

    let (player, mut rx) = join(&table, "joiner", WireFormat::Json);
    propagator.sync_player(&registry, player);

    let payloads = drain(&mut rx);
    assert_eq!(payloads.len(), 1);
    let payload: serde_json::Value = serde_json::from_slice(&payloads[0]).unwrap();
    assert_eq!(payload["apollo_module"], "TntCountdown");
    assert_eq!(payload["properties"]["tnt-ticks"], 80);
}
