//! MCU Bridge
//!
//! Emulates a Mackie Control Universal surface towards a DAW and drives a
//! generic MIDI controller with it. The [`Interconnector`] sits between the
//! two endpoints, translating through a link table and an LED state cache.

pub mod adapter;
pub mod command;
pub mod config;
pub mod controllers;
pub mod error;
pub mod host;
pub mod interconnector;
pub mod led_cache;
pub mod link_table;
pub mod midi;
pub mod paths;
pub mod transport;

pub use command::{LedStatus, LogicalCommand};
pub use error::{BridgeError, Result};
pub use interconnector::{Interconnector, SessionState, TickReport};
pub use link_table::ControlRef;
