//! Generic MIDI controller
//!
//! Plain buttons on channel 1 sending either CC or notes, plus pitch-bend
//! faders. No displays, meters or motor faders.

use tracing::{debug, info, trace};

use crate::adapter::{ControllerAdapter, ControllerEvent, ControllerInfo, HostHandle, VPotRing};
use crate::command::LedStatus;
use crate::error::{BridgeError, Result};
use crate::link_table::ControlRef;
use crate::midi::{format_hex, MidiMessage};
use crate::transport::MidiTransport;

/// MIDI message type the buttons (and their LEDs) use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonMessage {
    ControlChange,
    Note,
}

impl ButtonMessage {
    fn prefix(self) -> &'static str {
        match self {
            ButtonMessage::ControlChange => "cc",
            ButtonMessage::Note => "note",
        }
    }

    /// Control reference for a CC or note number, e.g. `cc24`
    pub fn control(self, number: u8) -> ControlRef {
        ControlRef::new(format!("{}{}", self.prefix(), number))
    }

    /// Number encoded in a control reference of this type
    pub fn number(self, control: &ControlRef) -> Option<u8> {
        control
            .as_str()
            .strip_prefix(self.prefix())?
            .parse::<u8>()
            .ok()
            .filter(|n| *n <= 0x7F)
    }
}

pub struct GenericController {
    info: &'static ControllerInfo,
    buttons: ButtonMessage,
    midi_input: String,
    midi_output: String,
    transport: Box<dyn MidiTransport>,
    host: Option<HostHandle>,
}

impl GenericController {
    const CHANNEL: u8 = 0;

    pub fn new(
        info: &'static ControllerInfo,
        buttons: ButtonMessage,
        midi_input: &str,
        midi_output: &str,
        transport: Box<dyn MidiTransport>,
    ) -> Self {
        Self {
            info,
            buttons,
            midi_input: midi_input.to_string(),
            midi_output: midi_output.to_string(),
            transport,
            host: None,
        }
    }

    fn decode(&self, message: MidiMessage) -> Option<ControllerEvent> {
        let button = |number: u8, pressed: bool| ControllerEvent::Control {
            control: self.buttons.control(number),
            pressed,
        };

        match (self.buttons, message) {
            (ButtonMessage::ControlChange, MidiMessage::ControlChange { channel, cc, value })
                if channel == Self::CHANNEL =>
            {
                Some(button(cc, value > 0))
            }
            (ButtonMessage::Note, MidiMessage::NoteOn { channel, note, velocity })
                if channel == Self::CHANNEL =>
            {
                Some(button(note, velocity > 0))
            }
            (ButtonMessage::Note, MidiMessage::NoteOff { channel, note, .. })
                if channel == Self::CHANNEL =>
            {
                Some(button(note, false))
            }
            (_, MidiMessage::PitchBend { channel, value }) => Some(ControllerEvent::FaderMoved {
                fader: channel,
                position: value,
            }),
            (_, other) => {
                trace!("{}: ignoring {}", self.info.name, other);
                None
            }
        }
    }
}

impl ControllerAdapter for GenericController {
    fn info(&self) -> &'static ControllerInfo {
        self.info
    }

    fn set_mackie_host_control(&mut self, host: HostHandle) {
        self.host = Some(host);
    }

    fn connect(&mut self) -> Result<()> {
        info!(
            "Opening {} ports - Input: '{}', Output: '{}'",
            self.info.name, self.midi_input, self.midi_output
        );
        let (input, output) = (self.midi_input.clone(), self.midi_output.clone());
        self.transport.open(&input, &output)
    }

    fn disconnect(&mut self) -> Result<()> {
        self.transport.close();
        Ok(())
    }

    fn process_midi_input(&mut self) -> Result<()> {
        if !self.transport.is_open() {
            return Err(BridgeError::PortClosed);
        }

        while let Some(data) = self.transport.receive() {
            let Some(message) = MidiMessage::parse(&data) else {
                trace!("{}: unparsed MIDI {}", self.info.name, format_hex(&data));
                continue;
            };
            if let Some(event) = self.decode(message) {
                match &self.host {
                    Some(host) => host.dispatch(event),
                    None => trace!("{}: no host attached, dropping {:?}", self.info.name, event),
                }
            }
        }
        Ok(())
    }

    fn host_connected(&mut self) {
        if let Some(host) = &self.host {
            info!("{}: host is {:?}", self.info.name, host.host_status());
        }
    }

    fn host_disconnected(&mut self) {
        info!("{}: host went offline", self.info.name);
    }

    fn has_display_7seg(&self) -> bool {
        false
    }

    fn has_display_lcd(&self) -> bool {
        false
    }

    fn has_display_timecode(&self) -> bool {
        false
    }

    fn has_automated_faders(&self) -> bool {
        false
    }

    fn has_meter_bridge(&self) -> bool {
        false
    }

    fn update_led(&mut self, control: &ControlRef, status: LedStatus) -> Result<()> {
        let Some(number) = self.buttons.number(control) else {
            debug!("{}: '{}' is not a {} control", self.info.name, control, self.buttons.prefix());
            return Ok(());
        };

        let message = match self.buttons {
            ButtonMessage::ControlChange => MidiMessage::ControlChange {
                channel: Self::CHANNEL,
                cc: number,
                value: status.value(),
            },
            ButtonMessage::Note => MidiMessage::NoteOn {
                channel: Self::CHANNEL,
                note: number,
                velocity: status.value(),
            },
        };
        self.transport.send_message(&message)
    }

    fn fader_moved(&mut self, fader: u8, position: u16) -> Result<()> {
        trace!("{}: no motor fader for {} -> {}", self.info.name, fader, position);
        Ok(())
    }

    fn set_peak_level(&mut self, meter: u8, level: u8) -> Result<()> {
        trace!("{}: no meter for {} -> {}", self.info.name, meter, level);
        Ok(())
    }

    fn set_display_7seg(&mut self, position: u8, character: u8) -> Result<()> {
        trace!("{}: no 7-segment display ({} = 0x{:02X})", self.info.name, position, character);
        Ok(())
    }

    fn set_display_timecode(&mut self, position: u8, character: u8) -> Result<()> {
        trace!("{}: no timecode display ({} = 0x{:02X})", self.info.name, position, character);
        Ok(())
    }

    fn set_vpot_led_ring(&mut self, vpot: u8, ring: VPotRing) -> Result<()> {
        trace!("{}: no LED ring for v-pot {} ({:?})", self.info.name, vpot, ring);
        Ok(())
    }

    fn update_lcd(&mut self, row: u8, text: &str) -> Result<()> {
        trace!("{}: no LCD, row {}: '{}'", self.info.name, row, text.trim_end());
        Ok(())
    }
}
