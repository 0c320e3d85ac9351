//! Configuration file watcher for hot-reload support

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::AppConfig;

/// Watches the settings file and yields each valid new configuration
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<AppConfig>,
}

impl ConfigWatcher {
    /// Start watching `config_path`, which must exist
    pub fn new(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        let (tx, rx) = mpsc::channel(10);

        // notify callbacks run on their own OS thread, not in Tokio context
        let runtime_handle = tokio::runtime::Handle::current();
        let path = config_path.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                debug!("Config file modified: {:?}", event.paths);

                let path = path.clone();
                let tx = tx.clone();
                runtime_handle.spawn(async move {
                    // Debounce: let the writer finish
                    tokio::time::sleep(Duration::from_millis(100)).await;

                    match AppConfig::load(&path).await {
                        Ok(config) => {
                            info!("Configuration reloaded");
                            if let Err(e) = tx.send(config).await {
                                debug!("Config watcher closed: {}", e);
                            }
                        }
                        Err(e) => warn!("Failed to reload config (keeping old config): {:#}", e),
                    }
                });
            }
            Err(e) => error!("Watch error: {}", e),
        })?;

        watcher
            .watch(&config_path, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config file: {}", config_path.display()))?;

        info!("Config file watcher started for: {}", config_path.display());

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Wait for the next valid configuration.
    /// Returns None if the watcher has been closed.
    pub async fn next_config(&mut self) -> Option<AppConfig> {
        self.rx.recv().await
    }
}
