//! Settings file location for portable and installed modes.
//!
//! ## Mode Detection
//!
//! - **Portable mode**: If a `.portable` marker file exists next to the
//!   executable, the settings file is stored in the same directory.
//! - **Installed mode** (default): The settings file lives in the platform
//!   data directory (`%APPDATA%\MCU Bridge`, `~/.local/share/MCU Bridge`, ...).

use std::path::{Path, PathBuf};

/// Application name used for directories in installed mode
const APP_NAME: &str = "MCU Bridge";

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the settings file
    pub config: PathBuf,
    /// Whether running in portable mode (config next to exe)
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect the settings location based on environment.
    ///
    /// In debug builds a `config.yaml` in the current working directory wins,
    /// so `cargo run` picks up the project's file.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        #[cfg(debug_assertions)]
        {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let cwd_config = cwd.join(CONFIG_FILE);
            if cwd_config.exists() {
                eprintln!("[paths] Running in DEV mode (config.yaml found in cwd: {})", cwd.display());
                return Self {
                    config: cwd_config,
                    is_portable: true,
                };
            }
        }

        Self::resolve(&exe_dir, dirs::data_dir())
    }

    fn resolve(exe_dir: &Path, data_dir: Option<PathBuf>) -> Self {
        if exe_dir.join(".portable").exists() {
            return Self {
                config: exe_dir.join(CONFIG_FILE),
                is_portable: true,
            };
        }

        let app_data = data_dir
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: no platform data directory, falling back to exe dir");
                exe_dir.to_path_buf()
            })
            .join(APP_NAME);

        Self {
            config: app_data.join(CONFIG_FILE),
            is_portable: false,
        }
    }

    /// Directory holding the settings file (for displaying in logs)
    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
