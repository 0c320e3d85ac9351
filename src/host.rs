//! MCU host endpoint
//!
//! Emulates a Mackie Control / Logic Control surface towards the DAW:
//! answers the SysEx handshake, decodes LED, fader, meter, v-pot ring,
//! 7-segment and LCD output, and encodes surface input in MCU format.

pub mod handshake;
#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, trace, warn};

use crate::adapter::{HostAdapter, HostEvent, HostStatus, SessionHandle, VPotRing};
use crate::command::{LedStatus, LogicalCommand};
use crate::error::{BridgeError, Result};
use crate::midi::{format_hex, MidiMessage};
use crate::transport::MidiTransport;

/// LCD characters per row
pub const LCD_ROW_LENGTH: usize = 56;
const LCD_LENGTH: usize = LCD_ROW_LENGTH * 2;

/// Fader index of the master fader
pub const MASTER_FADER: u8 = 8;
const FADER_TOUCH_NOTE: u8 = 0x68;
const VPOT_ROTATION_CC: u8 = 0x10;
const VPOT_RING_CC: u8 = 0x30;
const TIMECODE_CC: u8 = 0x40;
const ASSIGNMENT_CC: u8 = 0x4A;

/// Emulated MCU device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum McuModel {
    #[default]
    LogicControl,
    LogicControlXt,
    MackieControl,
    MackieControlXt,
}

impl McuModel {
    pub const ALL: [McuModel; 4] = [
        McuModel::LogicControl,
        McuModel::LogicControlXt,
        McuModel::MackieControl,
        McuModel::MackieControlXt,
    ];

    pub fn id(self) -> &'static str {
        match self {
            McuModel::LogicControl => "logic-control",
            McuModel::LogicControlXt => "logic-control-xt",
            McuModel::MackieControl => "mackie-control",
            McuModel::MackieControlXt => "mackie-control-xt",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            McuModel::LogicControl => "Logic Control",
            McuModel::LogicControlXt => "Logic Control XT",
            McuModel::MackieControl => "Mackie Control",
            McuModel::MackieControlXt => "Mackie Control XT",
        }
    }

    /// Device id byte used in SysEx messages
    pub fn device_id(self) -> u8 {
        match self {
            McuModel::LogicControl => 0x10,
            McuModel::LogicControlXt => 0x11,
            McuModel::MackieControl => 0x14,
            McuModel::MackieControlXt => 0x15,
        }
    }

    /// Logic hosts verify the challenge-response, Mackie hosts don't
    pub fn challenge_response_default(self) -> bool {
        matches!(self, McuModel::LogicControl | McuModel::LogicControlXt)
    }

    pub fn is_extender(self) -> bool {
        matches!(self, McuModel::LogicControlXt | McuModel::MackieControlXt)
    }

    pub fn preferred_midi_input(self) -> &'static str {
        if self.is_extender() {
            "MCU XT In"
        } else {
            "MCU In"
        }
    }

    pub fn preferred_midi_output(self) -> &'static str {
        if self.is_extender() {
            "MCU XT Out"
        } else {
            "MCU Out"
        }
    }
}

impl fmt::Display for McuModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for McuModel {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace([' ', '_'], "-");
        McuModel::ALL
            .into_iter()
            .find(|m| m.id() == wanted)
            .ok_or_else(|| BridgeError::UnknownModel(s.to_string()))
    }
}

/// Host endpoint settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSettings {
    pub model: McuModel,
    pub challenge_response: bool,
    pub midi_input: String,
    pub midi_output: String,
}

impl HostSettings {
    /// Model defaults: preferred ports and challenge-response flag
    pub fn for_model(model: McuModel) -> Self {
        Self {
            model,
            challenge_response: model.challenge_response_default(),
            midi_input: model.preferred_midi_input().to_string(),
            midi_output: model.preferred_midi_output().to_string(),
        }
    }
}

/// MCU protocol endpoint facing the DAW
pub struct MackieHostControl {
    settings: HostSettings,
    transport: Box<dyn MidiTransport>,
    session: Option<SessionHandle>,
    status: HostStatus,
    challenge: [u8; 4],
    lcd: [u8; LCD_LENGTH],
}

impl MackieHostControl {
    pub fn new(settings: HostSettings, transport: Box<dyn MidiTransport>) -> Self {
        Self {
            settings,
            transport,
            session: None,
            status: HostStatus::Offline,
            challenge: [0; 4],
            lcd: [b' '; LCD_LENGTH],
        }
    }

    pub fn settings(&self) -> &HostSettings {
        &self.settings
    }

    pub fn status(&self) -> HostStatus {
        self.status
    }

    /// Current LCD contents, one string per row
    pub fn lcd_rows(&self) -> [String; 2] {
        [self.lcd_row(1), self.lcd_row(2)]
    }

    fn lcd_row(&self, row: u8) -> String {
        let start = usize::from(row.saturating_sub(1)) * LCD_ROW_LENGTH;
        self.lcd[start..start + LCD_ROW_LENGTH]
            .iter()
            .map(|&b| if (0x20..0x7F).contains(&b) { b as char } else { ' ' })
            .collect()
    }

    fn dispatch(&self, event: HostEvent) {
        match &self.session {
            Some(session) => session.dispatch(event),
            None => trace!("No session attached, dropping {:?}", event),
        }
    }

    fn set_status(&mut self, status: HostStatus) {
        if self.status == status {
            return;
        }
        debug!("MCU host status: {:?} -> {:?}", self.status, status);
        self.status = status;
        if let Some(session) = &self.session {
            session.set_host_status(status);
        }
    }

    fn go_online(&mut self) {
        if self.status != HostStatus::Online {
            self.set_status(HostStatus::Online);
            self.dispatch(HostEvent::Connected);
        }
    }

    fn go_offline(&mut self) {
        if self.status == HostStatus::Online {
            self.dispatch(HostEvent::Disconnected);
        }
        self.set_status(HostStatus::Offline);
    }

    fn send(&mut self, message: MidiMessage) -> Result<()> {
        self.transport.send_message(&message)
    }

    fn send_sysex(&mut self, command: u8, data: &[u8]) -> Result<()> {
        let message = handshake::sysex(self.settings.model.device_id(), command, data);
        trace!("MCU TX {}", format_hex(&message));
        self.transport.send(&message)
    }

    fn handle_message(&mut self, message: MidiMessage) -> Result<()> {
        match message {
            MidiMessage::NoteOn { note, velocity, .. } => self.handle_led(note, velocity),
            MidiMessage::NoteOff { note, .. } => self.handle_led(note, 0),
            MidiMessage::PitchBend { channel, value } if channel <= MASTER_FADER => {
                self.dispatch(HostEvent::FaderPosition {
                    fader: channel,
                    position: value,
                });
            }
            MidiMessage::ChannelPressure { pressure, .. } => {
                self.dispatch(HostEvent::PeakLevel {
                    meter: pressure >> 4,
                    level: pressure & 0x0F,
                });
            }
            MidiMessage::ControlChange { cc, value, .. } => self.handle_cc(cc, value),
            MidiMessage::SysEx { data } => return self.handle_sysex(&data),
            other => trace!("Ignoring host message: {}", other),
        }
        Ok(())
    }

    fn handle_led(&mut self, note: u8, velocity: u8) {
        match LogicalCommand::from_mcu_led_note(note) {
            Some(command) => self.dispatch(HostEvent::Led {
                command,
                status: LedStatus::from_value(velocity),
            }),
            None => trace!("No LED for note 0x{:02X}", note),
        }
    }

    fn handle_cc(&mut self, cc: u8, value: u8) {
        match cc {
            VPOT_RING_CC..=0x37 => self.dispatch(HostEvent::VPotRing {
                vpot: cc - VPOT_RING_CC,
                ring: VPotRing::from_mcu(value),
            }),
            TIMECODE_CC..=0x49 => self.dispatch(HostEvent::Timecode {
                position: cc - TIMECODE_CC,
                character: value,
            }),
            ASSIGNMENT_CC..=0x4B => self.dispatch(HostEvent::Display7Seg {
                position: cc - ASSIGNMENT_CC,
                character: value,
            }),
            _ => trace!("Ignoring host CC {} = {}", cc, value),
        }
    }

    fn handle_sysex(&mut self, payload: &[u8]) -> Result<()> {
        let Some((device_id, command, data)) = handshake::split(payload) else {
            trace!("Ignoring foreign SysEx: {}", format_hex(payload));
            return Ok(());
        };
        if device_id != self.settings.model.device_id() {
            trace!("Ignoring SysEx for device 0x{:02X}", device_id);
            return Ok(());
        }

        match command {
            handshake::DEVICE_QUERY => {
                debug!("Host device query");
                self.challenge = handshake::new_challenge();
                let mut reply = handshake::SERIAL.to_vec();
                reply.extend_from_slice(&self.challenge);
                self.send_sysex(handshake::HOST_CONNECTION_QUERY, &reply)?;
                if self.status != HostStatus::Online {
                    self.set_status(HostStatus::Identifying);
                }
            }
            handshake::HOST_CONNECTION_REPLY => self.handle_connection_reply(data)?,
            handshake::VERSION_REQUEST => {
                debug!("Host firmware version request");
                self.send_sysex(handshake::VERSION_REPLY, handshake::FIRMWARE_VERSION)?;
            }
            handshake::GO_OFFLINE => {
                info!("MCU host requested offline mode");
                self.go_offline();
            }
            handshake::LCD => self.handle_lcd(data),
            handshake::RESET_FADERS => {
                for fader in 0..=MASTER_FADER {
                    self.dispatch(HostEvent::FaderPosition { fader, position: 0 });
                }
            }
            handshake::RESET_LEDS => {
                for &command in LogicalCommand::ALL {
                    self.dispatch(HostEvent::Led {
                        command,
                        status: LedStatus::Off,
                    });
                }
            }
            other => debug!("Ignoring MCU SysEx command 0x{:02X}", other),
        }
        Ok(())
    }

    fn handle_connection_reply(&mut self, data: &[u8]) -> Result<()> {
        let serial = data.get(..handshake::SERIAL.len());
        let response = data.get(handshake::SERIAL.len()..handshake::SERIAL.len() + 4);

        let accepted = match (serial, response) {
            (Some(serial), _) if serial != handshake::SERIAL => false,
            (Some(_), _) if !self.settings.challenge_response => true,
            (Some(_), Some(response)) => response == handshake::challenge_response(self.challenge),
            _ => false,
        };

        if accepted {
            info!("MCU host handshake accepted ({})", self.settings.model);
            self.send_sysex(handshake::HOST_CONNECTION_CONFIRMATION, &handshake::SERIAL)?;
            self.go_online();
        } else {
            warn!("MCU host handshake rejected: {}", format_hex(data));
            self.send_sysex(handshake::HOST_CONNECTION_ERROR, &handshake::SERIAL)?;
            self.set_status(HostStatus::Offline);
        }
        Ok(())
    }

    fn handle_lcd(&mut self, data: &[u8]) {
        let Some((&offset, text)) = data.split_first() else {
            return;
        };
        let offset = usize::from(offset);
        if offset >= LCD_LENGTH {
            debug!("LCD offset {} out of range", offset);
            return;
        }

        let end = (offset + text.len()).min(LCD_LENGTH);
        self.lcd[offset..end].copy_from_slice(&text[..end - offset]);

        for row in 1..=2u8 {
            let start = usize::from(row - 1) * LCD_ROW_LENGTH;
            if offset < start + LCD_ROW_LENGTH && end > start {
                let text = self.lcd_row(row);
                self.dispatch(HostEvent::Lcd { row, text });
            }
        }
    }
}

impl HostAdapter for MackieHostControl {
    fn set_hardware_controller(&mut self, session: SessionHandle) {
        session.set_host_status(self.status);
        self.session = Some(session);
    }

    fn connect(&mut self) -> Result<()> {
        info!(
            "Opening {} ports - Input: '{}', Output: '{}'",
            self.settings.model, self.settings.midi_input, self.settings.midi_output
        );
        let (input, output) = (self.settings.midi_input.clone(), self.settings.midi_output.clone());
        self.transport.open(&input, &output)?;

        if !self.settings.challenge_response {
            // Mackie hosts may skip the handshake altogether
            self.go_online();
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.go_offline();
        self.transport.close();
        Ok(())
    }

    fn process_midi_input(&mut self) -> Result<()> {
        if !self.transport.is_open() {
            return Err(BridgeError::PortClosed);
        }

        while let Some(data) = self.transport.receive() {
            match MidiMessage::parse(&data) {
                Some(message) => self.handle_message(message)?,
                None => trace!("Unparsed host MIDI: {}", format_hex(&data)),
            }
        }
        Ok(())
    }

    fn switch(&mut self, command: LogicalCommand, pressed: bool) -> Result<()> {
        let Some(note) = command.mcu_switch_note() else {
            debug!("{} has no MCU switch", command);
            return Ok(());
        };
        self.send(MidiMessage::NoteOn {
            channel: 0,
            note,
            velocity: if pressed { 0x7F } else { 0x00 },
        })
    }

    fn fader_moved(&mut self, fader: u8, position: u16) -> Result<()> {
        if fader > MASTER_FADER {
            debug!("No MCU fader {}", fader);
            return Ok(());
        }
        self.send(MidiMessage::PitchBend {
            channel: fader,
            value: position.min(0x3FFF),
        })
    }

    fn fader_touched(&mut self, fader: u8, touched: bool) -> Result<()> {
        if fader > MASTER_FADER {
            debug!("No MCU fader {}", fader);
            return Ok(());
        }
        self.send(MidiMessage::NoteOn {
            channel: 0,
            note: FADER_TOUCH_NOTE + fader,
            velocity: if touched { 0x7F } else { 0x00 },
        })
    }

    fn vpot_rotated(&mut self, vpot: u8, delta: i8) -> Result<()> {
        if vpot > 7 || delta == 0 {
            return Ok(());
        }
        let ticks = delta.unsigned_abs().min(0x3F);
        let value = if delta < 0 { 0x40 | ticks } else { ticks };
        self.send(MidiMessage::ControlChange {
            channel: 0,
            cc: VPOT_ROTATION_CC + vpot,
            value,
        })
    }
}
