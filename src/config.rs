//! Configuration management for the MCU bridge
//!
//! Handles loading, validating and saving the YAML settings file. The
//! interconnector never sees this; `main` builds the adapters from it.

pub mod watcher;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::command::LogicalCommand;
use crate::controllers::ControllerKind;
use crate::host::{HostSettings, McuModel};
use crate::link_table::{ControlRef, LinkTable};

/// Highest polling interval the MCU handshake tolerates
pub const MAX_RECOMMENDED_LATENCY_MS: u64 = 50;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Polling interval of the tick loop
    #[serde(default = "default_midi_latency_ms")]
    pub midi_latency_ms: u64,
    /// Command links; the controller's defaults when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<LinkConfig>>,
}

/// Emulated MCU host endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HostConfig {
    #[serde(default)]
    pub model: McuModel,
    /// Defaults to on for Logic models, off for Mackie models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_response: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_output: Option<String>,
}

/// Hardware controller endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub kind: ControllerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_output: Option<String>,
}

/// One command <-> control link
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct LinkConfig {
    pub command: LogicalCommand,
    pub control: ControlRef,
}

/// Links to add and remove to go from one link list to another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkChanges {
    pub removed: Vec<(LogicalCommand, ControlRef)>,
    pub added: Vec<(LogicalCommand, ControlRef)>,
}

impl LinkChanges {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: HostConfig::default(),
            controller: ControllerConfig::default(),
            midi_latency_ms: default_midi_latency_ms(),
            links: None,
        }
    }
}

impl HostConfig {
    /// Resolve model defaults for everything left unset
    pub fn settings(&self) -> HostSettings {
        let defaults = HostSettings::for_model(self.model);
        HostSettings {
            model: self.model,
            challenge_response: self.challenge_response.unwrap_or(defaults.challenge_response),
            midi_input: self.midi_input.clone().unwrap_or(defaults.midi_input),
            midi_output: self.midi_output.clone().unwrap_or(defaults.midi_output),
        }
    }
}

impl ControllerConfig {
    pub fn midi_input(&self) -> &str {
        self.midi_input
            .as_deref()
            .unwrap_or(self.kind.info().preferred_midi_input)
    }

    pub fn midi_output(&self) -> &str {
        self.midi_output
            .as_deref()
            .unwrap_or(self.kind.info().preferred_midi_output)
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load the file if it exists, defaults otherwise
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            info!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.midi_latency_ms == 0 {
            bail!("midi_latency_ms must be at least 1");
        }
        if self.midi_latency_ms > MAX_RECOMMENDED_LATENCY_MS {
            warn!(
                "midi_latency_ms = {} exceeds {} ms, the host handshake may time out",
                self.midi_latency_ms, MAX_RECOMMENDED_LATENCY_MS
            );
        }

        let ports = [
            ("host.midi_input", &self.host.midi_input),
            ("host.midi_output", &self.host.midi_output),
            ("controller.midi_input", &self.controller.midi_input),
            ("controller.midi_output", &self.controller.midi_output),
        ];
        for (name, port) in ports {
            if port.as_deref().is_some_and(|p| p.trim().is_empty()) {
                bail!("{} cannot be empty", name);
            }
        }

        if let Some(links) = &self.links {
            let mut commands = HashSet::new();
            let mut controls = HashSet::new();
            for (idx, link) in links.iter().enumerate() {
                if link.control.as_str().trim().is_empty() {
                    bail!("Link {} ({}) has an empty control", idx, link.command);
                }
                if !commands.insert(link.command) || !controls.insert(&link.control) {
                    warn!(
                        "Link {} ({} <-> {}) overrides an earlier link",
                        idx, link.command, link.control
                    );
                }
            }
        }

        Ok(())
    }

    /// Effective links, in file order
    pub fn links(&self) -> Vec<(LogicalCommand, ControlRef)> {
        match &self.links {
            Some(links) => links
                .iter()
                .map(|l| (l.command, l.control.clone()))
                .collect(),
            None => self.controller.kind.default_links(),
        }
    }

    /// Whether going from `self` to `other` needs the adapters rebuilt
    pub fn requires_restart(&self, other: &AppConfig) -> bool {
        self.host != other.host
            || self.controller != other.controller
            || self.midi_latency_ms != other.midi_latency_ms
    }

    /// Links that survive applying [`links`](Self::links) in order.
    ///
    /// A later entry repeating a command or control replaces the earlier one.
    pub fn effective_links(&self) -> Vec<(LogicalCommand, ControlRef)> {
        let mut table = LinkTable::new();
        for (command, control) in self.links() {
            table.link(command, control);
        }
        table
            .iter()
            .map(|(command, control)| (command, control.clone()))
            .collect()
    }

    /// Link changes needed to go from this configuration to `other`.
    ///
    /// Unlinking `removed` and then linking `added` on a table built from
    /// `self` leaves the same links as a fresh start from `other`.
    pub fn link_changes(&self, other: &AppConfig) -> LinkChanges {
        let old = self.effective_links();
        let new = other.effective_links();

        LinkChanges {
            removed: old.iter().filter(|l| !new.contains(l)).cloned().collect(),
            added: new.iter().filter(|l| !old.contains(l)).cloned().collect(),
        }
    }
}

fn default_midi_latency_ms() -> u64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        let host = config.host.settings();

        assert_eq!(host.model, McuModel::LogicControl);
        assert!(host.challenge_response);
        assert_eq!(host.midi_input, "MCU In");
        assert_eq!(config.controller.kind, ControllerKind::GenericCc);
        assert_eq!(config.midi_latency_ms, 1);

        let links = config.links();
        assert_eq!(links.len(), 16);
        assert_eq!(links[0], (LogicalCommand::MuteChannel1, ControlRef::from("cc24")));
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
host:
  model: mackie-control
  midi_input: "loopMIDI A"
  midi_output: "loopMIDI B"
controller:
  kind: generic-note
  midi_input: "nanoKONTROL"
midi_latency_ms: 5
links:
  - { command: play, control: note41 }
  - { command: stop, control: note42 }
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();

        let host = config.host.settings();
        assert_eq!(host.model, McuModel::MackieControl);
        assert!(!host.challenge_response);
        assert_eq!(host.midi_output, "loopMIDI B");

        assert_eq!(config.controller.midi_input(), "nanoKONTROL");
        assert_eq!(config.controller.midi_output(), "USB MIDI");
        assert_eq!(
            config.links(),
            vec![
                (LogicalCommand::Play, ControlRef::from("note41")),
                (LogicalCommand::Stop, ControlRef::from("note42")),
            ]
        );
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let yaml = "links:\n  - { command: jog_wheel, control: cc1 }\n";
        assert!(serde_yaml::from_str::<AppConfig>(yaml).is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig {
            midi_latency_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.midi_latency_ms = 100;
        assert!(config.validate().is_ok());

        config.host.midi_input = Some("  ".to_string());
        assert!(config.validate().is_err());

        config.host.midi_input = None;
        config.links = Some(vec![LinkConfig {
            command: LogicalCommand::Play,
            control: ControlRef::from(""),
        }]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_link_changes() {
        let old = AppConfig::default();
        let mut new = old.clone();
        let mut links: Vec<LinkConfig> = old
            .links()
            .into_iter()
            .map(|(command, control)| LinkConfig { command, control })
            .collect();
        links.retain(|l| l.command != LogicalCommand::SoloChannel8);
        links.push(LinkConfig {
            command: LogicalCommand::Play,
            control: ControlRef::from("cc41"),
        });
        new.links = Some(links);

        let changes = old.link_changes(&new);
        assert_eq!(
            changes.removed,
            vec![(LogicalCommand::SoloChannel8, ControlRef::from("cc39"))]
        );
        assert_eq!(changes.added, vec![(LogicalCommand::Play, ControlRef::from("cc41"))]);
        assert!(!old.requires_restart(&new));
        assert!(old.link_changes(&old).is_empty());
    }

    #[test]
    fn test_link_changes_with_repeated_control_match_fresh_start() {
        let link = |command, control: &str| LinkConfig {
            command,
            control: ControlRef::from(control),
        };
        let mut old = AppConfig::default();
        old.links = Some(vec![link(LogicalCommand::Play, "cc1")]);
        let mut new = old.clone();
        new.links = Some(vec![
            link(LogicalCommand::Stop, "cc1"),
            link(LogicalCommand::Play, "cc1"),
        ]);

        assert_eq!(
            new.effective_links(),
            vec![(LogicalCommand::Play, ControlRef::from("cc1"))]
        );
        assert!(old.link_changes(&new).is_empty());

        // Live reload onto a running table ends where a fresh start would
        let previous = new.clone();
        let mut live = LinkTable::new();
        for (command, control) in previous.links() {
            live.link(command, control);
        }
        new.links = Some(vec![
            link(LogicalCommand::Play, "cc1"),
            link(LogicalCommand::Stop, "cc1"),
            link(LogicalCommand::Rewind, "cc2"),
        ]);
        let changes = previous.link_changes(&new);
        for (command, control) in &changes.removed {
            live.unlink(*command, control);
        }
        for (command, control) in changes.added {
            live.link(command, control);
        }

        let live: Vec<_> = live.iter().map(|(c, r)| (c, r.clone())).collect();
        assert_eq!(live, new.effective_links());
        assert_eq!(
            live,
            vec![
                (LogicalCommand::Rewind, ControlRef::from("cc2")),
                (LogicalCommand::Stop, ControlRef::from("cc1")),
            ]
        );
    }

    #[tokio::test]
    async fn test_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("config.yaml");

        assert_eq!(AppConfig::load_or_default(&path).await?, AppConfig::default());

        let mut config = AppConfig::default();
        config.host.model = McuModel::LogicControlXt;
        config.midi_latency_ms = 10;
        config.save(&path).await?;

        let loaded = AppConfig::load(&path).await?;
        assert_eq!(loaded, config);
        assert!(loaded.requires_restart(&AppConfig::default()));

        Ok(())
    }
}
