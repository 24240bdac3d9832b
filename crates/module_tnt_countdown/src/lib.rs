//! TNT countdown module
//!
//! Controls how many ticks a primed TNT entity burns before exploding.
//! The fuse length is a notify-flagged option: changing it (globally or
//! for one player) pushes the new value to the affected Apollo clients so
//! their countdown overlays stay in sync with the server.

use apollo_options::{
    ApolloModule, ModuleId, ModuleResult, OptionDef, OptionValue, OptionsContainer, OptionsError,
    OptionsSlot, PlayerId, ValueKind,
};
use std::sync::Arc;
use tracing::info;

pub const MODULE_ID: ModuleId = ModuleId::from_static("tnt_countdown");

/// Vanilla fuse length: four seconds at twenty ticks per second.
pub const DEFAULT_TNT_TICKS: i64 = 80;

pub struct TntCountdownModule {
    ticks: Arc<OptionDef>,
    options: OptionsSlot,
}

impl TntCountdownModule {
    pub fn new() -> ModuleResult<Self> {
        let ticks = Arc::new(
            OptionDef::builder()
                .comment("Set the amount of ticks before the TNT explodes.")
                .node(["tnt-ticks"])
                .kind(ValueKind::Int)
                .default_value(DEFAULT_TNT_TICKS)
                .min(1i64)
                .notify_client()
                .build()?,
        );
        Ok(Self {
            ticks,
            options: OptionsSlot::new(),
        })
    }

    fn container(&self) -> Option<Arc<OptionsContainer>> {
        self.options.get()
    }

    /// Effective fuse length for the whole server.
    pub fn ticks(&self) -> i64 {
        match self.container().map(|c| c.get(&self.ticks)) {
            Some(OptionValue::Int(ticks)) => ticks,
            _ => DEFAULT_TNT_TICKS,
        }
    }

    /// Effective fuse length for one player, resolving their override
    /// before the global value.
    pub fn ticks_for(&self, player: PlayerId) -> i64 {
        match self.container().map(|c| c.view(player).get(&self.ticks)) {
            Some(OptionValue::Int(ticks)) => ticks,
            _ => DEFAULT_TNT_TICKS,
        }
    }

    /// Change the global fuse length. `None` resets to the default.
    pub fn set_ticks(&self, ticks: Option<i64>) -> Result<(), OptionsError> {
        let Some(container) = self.container() else {
            return Ok(());
        };
        container.set(&self.ticks, ticks.map(OptionValue::Int))
    }

    /// Override the fuse length for one player. `None` clears the
    /// override so the global value applies again.
    pub fn set_player_ticks(
        &self,
        player: PlayerId,
        ticks: Option<i64>,
    ) -> Result<(), OptionsError> {
        let Some(container) = self.container() else {
            return Ok(());
        };
        container
            .view(player)
            .set(&self.ticks, ticks.map(OptionValue::Int))
    }
}

impl ApolloModule for TntCountdownModule {
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
        info!(default_ticks = DEFAULT_TNT_TICKS, "TNT countdown enabled");
        Ok(())
    }
}
