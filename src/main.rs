//! MCU Bridge - use any MIDI controller as a Mackie Control surface

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcu_bridge::config::{watcher::ConfigWatcher, AppConfig};
use mcu_bridge::controllers::ControllerKind;
use mcu_bridge::host::{MackieHostControl, McuModel};
use mcu_bridge::paths::AppPaths;
use mcu_bridge::transport::{self, MidirTransport};
use mcu_bridge::Interconnector;

/// MCU Bridge - emulate a Mackie Control Universal with a generic MIDI controller
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: detected settings location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI ports
    #[arg(long)]
    list_ports: bool,

    /// List supported hardware controllers and MCU models
    #[arg(long)]
    list_controllers: bool,

    /// Hardware controller to use (e.g. generic-cc)
    #[arg(long)]
    controller: Option<ControllerKind>,

    /// Emulated MCU model (e.g. logic-control)
    #[arg(long)]
    host_model: Option<McuModel>,

    /// Polling interval in milliseconds
    #[arg(long)]
    latency_ms: Option<u64>,

    /// Save the effective settings to the configuration file
    #[arg(long)]
    save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level)?;

    if args.list_ports {
        list_ports();
        return Ok(());
    }

    if args.list_controllers {
        list_controllers();
        return Ok(());
    }

    let config_path = match args.config.clone() {
        Some(path) => path,
        None => {
            let paths = AppPaths::detect();
            info!(
                "Settings directory: {} ({} mode)",
                paths.base_dir().display(),
                if paths.is_portable { "portable" } else { "installed" }
            );
            paths.config
        }
    };
    info!("Configuration file: {}", config_path.display());

    let mut config = AppConfig::load_or_default(&config_path).await?;
    if let Some(kind) = args.controller {
        config.controller.kind = kind;
    }
    if let Some(model) = args.host_model {
        config.host.model = model;
    }
    if let Some(latency) = args.latency_ms {
        config.midi_latency_ms = latency;
    }
    config.validate()?;

    if args.save {
        config.save(&config_path).await?;
        info!("Settings saved to {}", config_path.display());
    }

    log_settings(&config);

    run(config, &config_path).await?;

    info!("MCU Bridge shutdown complete");
    Ok(())
}

async fn run(config: AppConfig, config_path: &Path) -> Result<()> {
    let host = MackieHostControl::new(
        config.host.settings(),
        Box::new(MidirTransport::new("MCU-Bridge-Host")),
    );
    let controller = config.controller.kind.create(
        config.controller.midi_input.as_deref(),
        config.controller.midi_output.as_deref(),
        Box::new(MidirTransport::new("MCU-Bridge-Controller")),
    );

    let mut bridge = Interconnector::new(Box::new(host), controller);
    for (command, control) in config.links() {
        bridge.link(command, control);
    }
    info!("{} links active", bridge.links().len());

    bridge.connect().context("Failed to connect the bridge")?;

    let mut config_watcher = if config_path.exists() {
        match ConfigWatcher::new(config_path) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Hot reload disabled: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    let mut ticker = tokio::time::interval(Duration::from_millis(config.midi_latency_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    info!("Ready to process MIDI events!");

    let mut current = config;
    let result = loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = bridge.process_tick() {
                    error!("Bridge stopped: {}", e);
                    break Err(anyhow::Error::from(e).context("MIDI processing failed"));
                }
            }

            Some(new_config) = next_config(&mut config_watcher) => {
                apply_config(&mut bridge, &current, &new_config);
                current = new_config;
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break Ok(());
            }
        }
    };

    info!("Shutting down...");
    if let Err(e) = bridge.disconnect() {
        warn!("Failed to disconnect cleanly: {}", e);
    }
    if bridge.unmapped_led_updates() > 0 {
        info!(
            "{} LED updates had no linked control",
            bridge.unmapped_led_updates()
        );
    }

    result
}

async fn next_config(watcher: &mut Option<ConfigWatcher>) -> Option<AppConfig> {
    match watcher {
        Some(watcher) => watcher.next_config().await,
        None => std::future::pending().await,
    }
}

/// Apply a reloaded configuration: links change live, the rest needs a restart
fn apply_config(bridge: &mut Interconnector, current: &AppConfig, new_config: &AppConfig) {
    if current.requires_restart(new_config) {
        warn!("Host, controller or latency settings changed; restart to apply them");
    }

    let changes = current.link_changes(new_config);
    if changes.is_empty() {
        debug!("No link changes");
        return;
    }

    info!(
        "Links updated: {} removed, {} added",
        changes.removed.len(),
        changes.added.len()
    );
    for (command, control) in &changes.removed {
        bridge.unlink(*command, control);
    }
    for (command, control) in changes.added {
        bridge.link(command, control);
    }
}

fn log_settings(config: &AppConfig) {
    let host = config.host.settings();
    let info = config.controller.kind.info();

    info!(
        "Emulated host: {} (challenge-response {})",
        host.model,
        if host.challenge_response { "on" } else { "off" }
    );
    info!("  MCU ports: in '{}', out '{}'", host.midi_input, host.midi_output);
    info!("Hardware controller: {}", info.name);
    info!(
        "  Controller ports: in '{}', out '{}'",
        config.controller.midi_input(),
        config.controller.midi_output()
    );
    info!("MIDI latency: {} ms", config.midi_latency_ms);
}

fn list_ports() {
    use colored::*;

    println!("\n{}", "=== Available MIDI Ports ===".bold().cyan());

    for (title, ports) in [
        ("Input Ports:", transport::list_input_ports()),
        ("Output Ports:", transport::list_output_ports()),
    ] {
        println!("\n{}", title.bold());
        match ports {
            Ok(ports) if ports.is_empty() => println!("  {}", "No ports found".dimmed()),
            Ok(ports) => {
                for port in ports {
                    println!("  {}", port);
                }
            }
            Err(e) => println!("  {} {}", "Error:".red(), e),
        }
    }
    println!();
}

fn list_controllers() {
    use colored::*;

    println!("\n{}", "=== Hardware Controllers ===".bold().cyan());
    for kind in ControllerKind::ALL {
        let info = kind.info();
        println!("\n  {} {}", info.name.bold(), format!("({})", kind.id()).as_str().dimmed());
        println!("    Input:  {}", info.preferred_midi_input.bright_white());
        println!("    Output: {}", info.preferred_midi_output.bright_white());
        println!("    {}", info.usage_hint);
    }

    println!("\n{}", "=== Emulated MCU Models ===".bold().cyan());
    for model in McuModel::ALL {
        println!(
            "  {} {} challenge-response {}",
            model.name().bold(),
            format!("({})", model.id()).as_str().dimmed(),
            if model.challenge_response_default() { "on" } else { "off" }
        );
    }
    println!();
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level: {}", level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
