//! Transport implementation backed by the player table

use crate::player::PlayerTable;
use apollo_options::{
    ModuleRegistry, OptionDef, OptionTransport, OptionValue, PlayerId, Recipients,
};
use apollo_wire::{encode_settings, WireFormat, WireValue};
use std::sync::Arc;
use tracing::trace;

/// Delivers option changes to connected clients.
///
/// Each change is encoded at most once per wire format, however many
/// players are connected; delivery itself is fire-and-forget through each
/// connection's outbound channel.
#[derive(Debug)]
pub struct NetworkPropagator {
    players: Arc<PlayerTable>,
}

impl NetworkPropagator {
    pub fn new(players: Arc<PlayerTable>) -> Self {
        Self { players }
    }

    /// Send a joining player the full enabled-module snapshot: one
    /// settings payload per module carrying every notify-flagged option
    /// at its current global value.
    pub fn sync_player(&self, registry: &ModuleRegistry, player: PlayerId) {
        let Some(connection) = self.players.get(player) else {
            return;
        };
        for (module, values) in registry.settings_snapshots() {
            let properties: Vec<(String, WireValue)> = values
                .iter()
                .map(|(option, value)| (option.key().to_string(), WireValue::from(value)))
                .collect();
            connection.send(encode_settings(connection.format, &module, &properties));
        }
        trace!(player = %player, "sent join-time settings snapshot");
    }
}

impl OptionTransport for NetworkPropagator {
    fn send_option(
        &self,
        module: &str,
        option: &OptionDef,
        value: &OptionValue,
        recipients: Recipients,
    ) {
        let properties = [(option.key().to_string(), WireValue::from(value))];

        match recipients {
            Recipients::One(player) => {
                if let Some(connection) = self.players.get(player) {
                    connection.send(encode_settings(connection.format, module, &properties));
                }
            }
            Recipients::All => {
                let mut json = None;
                let mut protobuf = None;
                for connection in self.players.connections() {
                    let payload = match connection.format {
                        WireFormat::Json => json
                            .get_or_insert_with(|| {
                                encode_settings(WireFormat::Json, module, &properties)
                            })
                            .clone(),
                        WireFormat::Protobuf => protobuf
                            .get_or_insert_with(|| {
                                encode_settings(WireFormat::Protobuf, module, &properties)
                            })
                            .clone(),
                    };
                    connection.send(payload);
                }
            }
        }
        trace!(module, option = option.key(), ?recipients, "propagated option");
    }
}
