//! Hardware controller registry
//!
//! Every supported controller class is a [`ControllerKind`] variant with a
//! factory; selection by name goes through `FromStr`/serde only.

pub mod generic;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::adapter::{ControllerAdapter, ControllerInfo};
use crate::command::LogicalCommand;
use crate::error::BridgeError;
use crate::link_table::ControlRef;
use crate::transport::MidiTransport;

pub use generic::{ButtonMessage, GenericController};

/// Supported hardware controller classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerKind {
    #[default]
    GenericCc,
    GenericNote,
}

static GENERIC_CC_INFO: ControllerInfo = ControllerInfo {
    name: "Generic MIDI (CC)",
    preferred_midi_input: "USB MIDI",
    preferred_midi_output: "USB MIDI",
    usage_hint: "Buttons send control changes on channel 1 (value > 0 = pressed) and LEDs \
                 are driven with the same CC. Link commands to controls named cc0 to cc127. \
                 Pitch bend on channel k moves fader k.",
};

static GENERIC_NOTE_INFO: ControllerInfo = ControllerInfo {
    name: "Generic MIDI (Note)",
    preferred_midi_input: "USB MIDI",
    preferred_midi_output: "USB MIDI",
    usage_hint: "Buttons send notes on channel 1 (velocity > 0 = pressed) and LEDs are \
                 driven with the same note. Link commands to controls named note0 to note127. \
                 Pitch bend on channel k moves fader k.",
};

impl ControllerKind {
    pub const ALL: [ControllerKind; 2] = [ControllerKind::GenericCc, ControllerKind::GenericNote];

    /// Registry identifier used in settings and on the command line
    pub fn id(self) -> &'static str {
        match self {
            ControllerKind::GenericCc => "generic-cc",
            ControllerKind::GenericNote => "generic-note",
        }
    }

    pub fn info(self) -> &'static ControllerInfo {
        match self {
            ControllerKind::GenericCc => &GENERIC_CC_INFO,
            ControllerKind::GenericNote => &GENERIC_NOTE_INFO,
        }
    }

    /// Build an adapter of this class on top of `transport`.
    ///
    /// Ports left unset fall back to the class's preferred ports.
    pub fn create(
        self,
        midi_input: Option<&str>,
        midi_output: Option<&str>,
        transport: Box<dyn MidiTransport>,
    ) -> Box<dyn ControllerAdapter> {
        let info = self.info();
        let input = midi_input.unwrap_or(info.preferred_midi_input);
        let output = midi_output.unwrap_or(info.preferred_midi_output);

        match self {
            ControllerKind::GenericCc => Box::new(GenericController::new(
                info,
                ButtonMessage::ControlChange,
                input,
                output,
                transport,
            )),
            ControllerKind::GenericNote => Box::new(GenericController::new(
                info,
                ButtonMessage::Note,
                input,
                output,
                transport,
            )),
        }
    }

    /// Links used when the settings don't list any: mute 1-8 and solo 1-8
    /// on two consecutive banks of eight buttons starting at 24
    pub fn default_links(self) -> Vec<(LogicalCommand, ControlRef)> {
        let prefix = match self {
            ControllerKind::GenericCc => "cc",
            ControllerKind::GenericNote => "note",
        };

        let mut links = Vec::with_capacity(16);
        for channel in 0..8 {
            if let Some(command) = LogicalCommand::mute_channel(channel) {
                links.push((command, ControlRef::new(format!("{}{}", prefix, 24 + channel))));
            }
        }
        for channel in 0..8 {
            if let Some(command) = LogicalCommand::solo_channel(channel) {
                links.push((command, ControlRef::new(format!("{}{}", prefix, 32 + channel))));
            }
        }
        links
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ControllerKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        ControllerKind::ALL
            .into_iter()
            .find(|k| k.id() == wanted || k.info().name.to_lowercase() == wanted)
            .ok_or_else(|| BridgeError::UnknownController(s.to_string()))
    }
}
