//! Main application entry point for the Apollo settings server
//!
//! Provides CLI interface, configuration loading, and startup wiring for
//! the module registry, the player connection table, and the network
//! propagator that pushes settings payloads to clients.

mod cli;
mod config;

use apollo_network::{NetworkPropagator, PlayerTable};
use apollo_options::{
    ConfigDocument, EventBus, ModuleRegistry, PlayerConnectedEvent, PlayerDisconnectedEvent,
};
use cli::CliArgs;
use config::{AppConfig, LoggingSettings};
use module_tnt_countdown::TntCountdownModule;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// Logging Setup
// ============================================================================

/// Initialize logging system
fn setup_logging(
    config: &LoggingSettings,
    json_format: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = config.level.as_str();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if json_format || config.json_format {
        registry
            .with(fmt::layer().json().with_file(false).with_line_number(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_ansi(true).with_file(false).with_line_number(false))
            .init();
    }

    info!("Logging initialized with level: {}", log_level);
    Ok(())
}

// ============================================================================
// Signal Handling
// ============================================================================

/// Setup graceful shutdown signal handling
async fn setup_signal_handlers() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
        }
    }

    #[cfg(windows)]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}

// ============================================================================
// Application
// ============================================================================

/// Main application struct wiring the registry to the network layer.
pub struct Application {
    config: AppConfig,
    options_path: PathBuf,
    players: Arc<PlayerTable>,
    registry: Arc<ModuleRegistry>,
}

impl Application {
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        // Load configuration first (before logging setup)
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        // Apply CLI overrides
        if let Some(options_path) = &args.options_path {
            config.options.file = options_path.to_string_lossy().to_string();
        }
        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {}", e).into());
        }

        setup_logging(&config.logging, args.json_logs)?;

        let players = Arc::new(PlayerTable::new());
        let propagator = Arc::new(NetworkPropagator::new(players.clone()));
        let bus = Arc::new(EventBus::new());
        let registry = Arc::new(ModuleRegistry::new(bus.clone(), propagator.clone()));

        registry.add_module(module_tnt_countdown::MODULE_ID, TntCountdownModule::new)?;

        // Joining players receive the full enabled-module snapshot;
        // leaving players must not keep cached per-player views alive.
        {
            let registry = registry.clone();
            let propagator = propagator.clone();
            bus.on("core", "player_connected", move |event: PlayerConnectedEvent| {
                propagator.sync_player(&registry, event.player);
                Ok(())
            });
        }
        {
            let registry = registry.clone();
            let players = players.clone();
            bus.on(
                "core",
                "player_disconnected",
                move |event: PlayerDisconnectedEvent| {
                    players.disconnect(event.player);
                    registry.remove_player(event.player);
                    Ok(())
                },
            );
        }

        let options_path = PathBuf::from(&config.options.file);

        info!("Apollo Settings Server v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "Config: {} | Options: {}",
            args.config_path.display(),
            options_path.display()
        );

        Ok(Self {
            config,
            options_path,
            players,
            registry,
        })
    }

    /// Load persisted module option values, if the file exists.
    async fn load_options(&self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.options_path.exists() {
            info!("No options file at {}, using defaults", self.options_path.display());
            return Ok(());
        }
        let text = tokio::fs::read_to_string(&self.options_path).await?;
        let tree = ConfigDocument::parse(&text)?;
        self.registry.load_configuration(&tree);
        info!("Loaded module options from {}", self.options_path.display());
        Ok(())
    }

    /// Write current module option values back out.
    async fn save_options(&self) -> Result<(), Box<dyn std::error::Error>> {
        let mut doc = ConfigDocument::new();
        self.registry.save_configuration(&mut doc);
        tokio::fs::write(&self.options_path, doc.to_toml_string()).await?;
        info!("Saved module options to {}", self.options_path.display());
        Ok(())
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        self.load_options().await?;

        let modules = self.registry.modules();
        info!("Enabled modules: {}", modules.len());
        for module in &modules {
            info!("  - {}", module.name());
        }
        info!("Event handlers registered: {}", self.registry.event_bus().handler_count());
        info!("Connected players: {}", self.players.len());
        info!("Press Ctrl+C to gracefully shutdown");

        setup_signal_handlers().await?;

        info!("Shutdown signal received, initiating graceful shutdown...");

        if self.config.options.save_on_shutdown {
            if let Err(e) = self.save_options().await {
                warn!("Failed to save module options: {}", e);
            }
        }

        info!("Apollo Settings Server shutdown complete");
        Ok(())
    }
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Failed to start application: {:?}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
