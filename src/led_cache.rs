//! Last-known LED state per logical command
//!
//! Used by the interconnector to suppress redundant LED traffic towards the
//! hardware controller.

use std::collections::HashMap;

use crate::command::{LedStatus, LogicalCommand};

#[derive(Debug, Clone)]
pub struct LedStateCache {
    values: HashMap<LogicalCommand, LedStatus>,
}

impl LedStateCache {
    /// Create a cache with every command switched off
    pub fn new() -> Self {
        Self {
            values: LogicalCommand::ALL
                .iter()
                .map(|c| (*c, LedStatus::Off))
                .collect(),
        }
    }

    pub fn get(&self, command: LogicalCommand) -> LedStatus {
        self.values.get(&command).copied().unwrap_or_default()
    }

    /// Store `status` for `command`.
    ///
    /// Returns `true` if the cached value changed.
    pub fn update(&mut self, command: LogicalCommand, status: LedStatus) -> bool {
        let previous = self.values.insert(command, status).unwrap_or_default();
        previous != status
    }
}

impl Default for LedStateCache {
    fn default() -> Self {
        Self::new()
    }
}
