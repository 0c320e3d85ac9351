//! Control registry: the closed set of logical MCU commands and LED states
//!
//! Both endpoints match exhaustively against [`LogicalCommand`], so the set only
//! ever grows by adding enumerants here.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

/// LED status vocabulary shared by the host protocol and the controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedStatus {
    #[default]
    Off,
    Flashing,
    On,
}

impl LedStatus {
    /// Wire value (0x00 off, 0x01 flashing, 0x7F on)
    pub fn value(self) -> u8 {
        match self {
            LedStatus::Off => 0x00,
            LedStatus::Flashing => 0x01,
            LedStatus::On => 0x7F,
        }
    }

    /// Decode an LED velocity the way MCU surfaces do: 0 is off, 1 flashes,
    /// anything else lights the LED.
    pub fn from_value(value: u8) -> Self {
        match value {
            0x00 => LedStatus::Off,
            0x01 => LedStatus::Flashing,
            _ => LedStatus::On,
        }
    }
}

impl fmt::Display for LedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedStatus::Off => write!(f, "off"),
            LedStatus::Flashing => write!(f, "flashing"),
            LedStatus::On => write!(f, "on"),
        }
    }
}

macro_rules! logical_commands {
    ($( $variant:ident => $name:literal, $note:literal; )*) => {
        /// A protocol-agnostic control action, e.g. "mute channel 3"
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum LogicalCommand {
            $( $variant, )*
        }

        impl LogicalCommand {
            /// Every command, in registry order
            pub const ALL: &'static [LogicalCommand] = &[ $( LogicalCommand::$variant, )* ];

            /// Command name in the MCU command namespace (e.g. `mute_channel_3`)
            pub fn name(self) -> &'static str {
                match self {
                    $( LogicalCommand::$variant => $name, )*
                }
            }

            /// Note number the host uses to drive this command's LED
            pub fn mcu_led_note(self) -> u8 {
                match self {
                    $( LogicalCommand::$variant => $note, )*
                }
            }
        }
    };
}

logical_commands! {
    MuteChannel1 => "mute_channel_1", 0x10;
    MuteChannel2 => "mute_channel_2", 0x11;
    MuteChannel3 => "mute_channel_3", 0x12;
    MuteChannel4 => "mute_channel_4", 0x13;
    MuteChannel5 => "mute_channel_5", 0x14;
    MuteChannel6 => "mute_channel_6", 0x15;
    MuteChannel7 => "mute_channel_7", 0x16;
    MuteChannel8 => "mute_channel_8", 0x17;
    RecordReadyChannel1 => "record_ready_channel_1", 0x00;
    RecordReadyChannel2 => "record_ready_channel_2", 0x01;
    RecordReadyChannel3 => "record_ready_channel_3", 0x02;
    RecordReadyChannel4 => "record_ready_channel_4", 0x03;
    RecordReadyChannel5 => "record_ready_channel_5", 0x04;
    RecordReadyChannel6 => "record_ready_channel_6", 0x05;
    RecordReadyChannel7 => "record_ready_channel_7", 0x06;
    RecordReadyChannel8 => "record_ready_channel_8", 0x07;
    SelectChannel1 => "select_channel_1", 0x18;
    SelectChannel2 => "select_channel_2", 0x19;
    SelectChannel3 => "select_channel_3", 0x1A;
    SelectChannel4 => "select_channel_4", 0x1B;
    SelectChannel5 => "select_channel_5", 0x1C;
    SelectChannel6 => "select_channel_6", 0x1D;
    SelectChannel7 => "select_channel_7", 0x1E;
    SelectChannel8 => "select_channel_8", 0x1F;
    SoloChannel1 => "solo_channel_1", 0x08;
    SoloChannel2 => "solo_channel_2", 0x09;
    SoloChannel3 => "solo_channel_3", 0x0A;
    SoloChannel4 => "solo_channel_4", 0x0B;
    SoloChannel5 => "solo_channel_5", 0x0C;
    SoloChannel6 => "solo_channel_6", 0x0D;
    SoloChannel7 => "solo_channel_7", 0x0E;
    SoloChannel8 => "solo_channel_8", 0x0F;

    AssignmentEq => "assignment_eq", 0x2C;
    AssignmentInstrument => "assignment_instrument", 0x2D;
    AssignmentPanSurround => "assignment_pan_surround", 0x2A;
    AssignmentPlugIn => "assignment_plug_in", 0x2B;
    AssignmentSend => "assignment_send", 0x29;
    AssignmentTrack => "assignment_track", 0x28;
    AutomationLatch => "automation_latch", 0x4E;
    AutomationReadOff => "automation_read_off", 0x4A;
    AutomationTouch => "automation_touch", 0x4D;
    AutomationTrim => "automation_trim", 0x4C;
    AutomationWrite => "automation_write", 0x4B;
    Beats => "beats", 0x72;
    Click => "click", 0x59;
    Cycle => "cycle", 0x56;
    Drop => "drop", 0x57;
    FastForward => "fast_forward", 0x5C;
    Flip => "flip", 0x32;
    GlobalView => "global_view", 0x33;
    Group => "group", 0x4F;
    Marker => "marker", 0x54;
    Nudge => "nudge", 0x55;
    Play => "play", 0x5E;
    Record => "record", 0x5F;
    RelayClick => "relay_click", 0x76;
    Replace => "replace", 0x58;
    Rewind => "rewind", 0x5B;
    RudeSolo => "rude_solo", 0x73;
    Scrub => "scrub", 0x65;
    Smpte => "smpte", 0x71;
    Solo => "solo", 0x5A;
    Stop => "stop", 0x5D;
    UtilitiesSave => "utilities_save", 0x50;
    UtilitiesUndo => "utilities_undo", 0x51;
    Zoom => "zoom", 0x64;
}

const MUTE: [LogicalCommand; 8] = [
    LogicalCommand::MuteChannel1,
    LogicalCommand::MuteChannel2,
    LogicalCommand::MuteChannel3,
    LogicalCommand::MuteChannel4,
    LogicalCommand::MuteChannel5,
    LogicalCommand::MuteChannel6,
    LogicalCommand::MuteChannel7,
    LogicalCommand::MuteChannel8,
];

const SOLO: [LogicalCommand; 8] = [
    LogicalCommand::SoloChannel1,
    LogicalCommand::SoloChannel2,
    LogicalCommand::SoloChannel3,
    LogicalCommand::SoloChannel4,
    LogicalCommand::SoloChannel5,
    LogicalCommand::SoloChannel6,
    LogicalCommand::SoloChannel7,
    LogicalCommand::SoloChannel8,
];

const SELECT: [LogicalCommand; 8] = [
    LogicalCommand::SelectChannel1,
    LogicalCommand::SelectChannel2,
    LogicalCommand::SelectChannel3,
    LogicalCommand::SelectChannel4,
    LogicalCommand::SelectChannel5,
    LogicalCommand::SelectChannel6,
    LogicalCommand::SelectChannel7,
    LogicalCommand::SelectChannel8,
];

const RECORD_READY: [LogicalCommand; 8] = [
    LogicalCommand::RecordReadyChannel1,
    LogicalCommand::RecordReadyChannel2,
    LogicalCommand::RecordReadyChannel3,
    LogicalCommand::RecordReadyChannel4,
    LogicalCommand::RecordReadyChannel5,
    LogicalCommand::RecordReadyChannel6,
    LogicalCommand::RecordReadyChannel7,
    LogicalCommand::RecordReadyChannel8,
];

impl LogicalCommand {
    /// Mute command for a zero-based channel index (0-7)
    pub fn mute_channel(index: usize) -> Option<Self> {
        MUTE.get(index).copied()
    }

    /// Solo command for a zero-based channel index (0-7)
    pub fn solo_channel(index: usize) -> Option<Self> {
        SOLO.get(index).copied()
    }

    /// Select command for a zero-based channel index (0-7)
    pub fn select_channel(index: usize) -> Option<Self> {
        SELECT.get(index).copied()
    }

    /// Record-ready command for a zero-based channel index (0-7)
    pub fn record_ready_channel(index: usize) -> Option<Self> {
        RECORD_READY.get(index).copied()
    }

    /// Note a surface sends when the control is pressed.
    ///
    /// `None` for indicator-only commands, which have an LED but no switch.
    pub fn mcu_switch_note(self) -> Option<u8> {
        match self {
            LogicalCommand::Smpte
            | LogicalCommand::Beats
            | LogicalCommand::RudeSolo
            | LogicalCommand::RelayClick => None,
            other => Some(other.mcu_led_note()),
        }
    }

    /// Reverse of [`LogicalCommand::mcu_led_note`]
    pub fn from_mcu_led_note(note: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.mcu_led_note() == note)
    }
}

impl fmt::Display for LogicalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogicalCommand {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BridgeError::UnknownCommand(s.to_string()))
    }
}

impl Serialize for LogicalCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for LogicalCommand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_is_complete_and_unique() {
        assert_eq!(LogicalCommand::ALL.len(), 66);

        let names: HashSet<_> = LogicalCommand::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), 66);

        let notes: HashSet<_> = LogicalCommand::ALL.iter().map(|c| c.mcu_led_note()).collect();
        assert_eq!(notes.len(), 66);
    }

    #[test]
    fn test_channel_index_is_zero_based() {
        assert_eq!(LogicalCommand::mute_channel(0), Some(LogicalCommand::MuteChannel1));
        assert_eq!(LogicalCommand::mute_channel(2).unwrap().name(), "mute_channel_3");
        assert_eq!(LogicalCommand::solo_channel(7), Some(LogicalCommand::SoloChannel8));
        assert_eq!(LogicalCommand::select_channel(8), None);
        assert_eq!(
            LogicalCommand::record_ready_channel(4).unwrap().name(),
            "record_ready_channel_5"
        );
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("play".parse::<LogicalCommand>().unwrap(), LogicalCommand::Play);
        assert_eq!(
            "Assignment_EQ".parse::<LogicalCommand>().unwrap(),
            LogicalCommand::AssignmentEq
        );
        assert!("mute_channel_9".parse::<LogicalCommand>().is_err());
    }

    #[test]
    fn test_led_note_lookup() {
        assert_eq!(LogicalCommand::from_mcu_led_note(0x5E), Some(LogicalCommand::Play));
        assert_eq!(LogicalCommand::from_mcu_led_note(0x10), Some(LogicalCommand::MuteChannel1));
        assert_eq!(LogicalCommand::from_mcu_led_note(0x7F), None);

        assert_eq!(LogicalCommand::Play.mcu_switch_note(), Some(0x5E));
        assert_eq!(LogicalCommand::RudeSolo.mcu_switch_note(), None);
    }

    #[test]
    fn test_led_status_values() {
        assert_eq!(LedStatus::Off.value(), 0x00);
        assert_eq!(LedStatus::Flashing.value(), 0x01);
        assert_eq!(LedStatus::On.value(), 0x7F);

        assert_eq!(LedStatus::from_value(0x00), LedStatus::Off);
        assert_eq!(LedStatus::from_value(0x01), LedStatus::Flashing);
        assert_eq!(LedStatus::from_value(0x40), LedStatus::On);
    }

    #[test]
    fn test_serde_uses_command_names() {
        let yaml = serde_yaml::to_string(&LogicalCommand::SoloChannel2).unwrap();
        assert_eq!(yaml.trim(), "solo_channel_2");

        let parsed: LogicalCommand = serde_yaml::from_str("utilities_undo").unwrap();
        assert_eq!(parsed, LogicalCommand::UtilitiesUndo);
    }
}
