//! Link table: partial bijection between logical commands and hardware controls
//!
//! Both directions are kept in sync on every mutation. Linking replaces any
//! previous link sharing either endpoint (last write wins).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::command::LogicalCommand;

/// Opaque identifier of a hardware-native control (e.g. `cc24`)
///
/// Only the controller adapter interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlRef(String);

impl ControlRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ControlRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ControlRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    to_control: HashMap<LogicalCommand, ControlRef>,
    to_command: HashMap<ControlRef, LogicalCommand>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `command` and `control`, dropping prior links on either side
    pub fn link(&mut self, command: LogicalCommand, control: ControlRef) {
        if let Some(old_control) = self.to_control.remove(&command) {
            self.to_command.remove(&old_control);
        }
        if let Some(old_command) = self.to_command.remove(&control) {
            self.to_control.remove(&old_command);
        }

        self.to_command.insert(control.clone(), command);
        self.to_control.insert(command, control);
    }

    /// Remove the link between `command` and `control`.
    ///
    /// Returns `false` and leaves the table untouched when the pair is not
    /// currently linked to each other.
    pub fn unlink(&mut self, command: LogicalCommand, control: &ControlRef) -> bool {
        if self.to_control.get(&command) != Some(control) {
            return false;
        }

        self.to_control.remove(&command);
        self.to_command.remove(control);
        true
    }

    pub fn resolve_to_control(&self, command: LogicalCommand) -> Option<&ControlRef> {
        self.to_control.get(&command)
    }

    pub fn resolve_to_command(&self, control: &ControlRef) -> Option<LogicalCommand> {
        self.to_command.get(control).copied()
    }

    pub fn len(&self) -> usize {
        self.to_control.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_control.is_empty()
    }

    /// Iterate current links in registry order
    pub fn iter(&self) -> impl Iterator<Item = (LogicalCommand, &ControlRef)> {
        LogicalCommand::ALL
            .iter()
            .filter_map(|c| self.to_control.get(c).map(|r| (*c, r)))
    }
}
