//! Endpoint adapter contracts
//!
//! The interconnector owns one host adapter (DAW-facing MCU protocol) and one
//! controller adapter (the physical device's native dialect). Adapters never
//! hold a reference to the interconnector; instead they receive a handle at
//! connect time and dispatch decoded events through it. The interconnector
//! drains those events during `process_tick()`.

use crossbeam::channel::Sender;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;

use crate::command::{LedStatus, LogicalCommand};
use crate::error::Result;
use crate::link_table::ControlRef;

/// V-pot LED ring display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VPotMode {
    SingleDot,
    BoostCut,
    Wrap,
    Spread,
}

/// V-pot LED ring state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VPotRing {
    pub center_led: bool,
    pub mode: VPotMode,
    /// Ring position (0 = all off, 1-11)
    pub position: u8,
}

impl VPotRing {
    /// Decode the MCU ring byte: bit 6 center LED, bits 4-5 mode, bits 0-3 position
    pub fn from_mcu(value: u8) -> Self {
        let mode = match (value >> 4) & 0x03 {
            0 => VPotMode::SingleDot,
            1 => VPotMode::BoostCut,
            2 => VPotMode::Wrap,
            _ => VPotMode::Spread,
        };
        Self {
            center_led: value & 0x40 != 0,
            mode,
            position: value & 0x0F,
        }
    }

    pub fn to_mcu(self) -> u8 {
        let mode = match self.mode {
            VPotMode::SingleDot => 0,
            VPotMode::BoostCut => 1,
            VPotMode::Wrap => 2,
            VPotMode::Spread => 3,
        };
        (u8::from(self.center_led) << 6) | (mode << 4) | (self.position & 0x0F)
    }
}

/// Connection state of the host endpoint, as published by the host adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostStatus {
    #[default]
    Offline,
    /// Device query answered, waiting for the host's connection reply
    Identifying,
    Online,
}

/// Static capability flags of a hardware controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub display_7seg: bool,
    pub display_lcd: bool,
    pub display_timecode: bool,
    pub automated_faders: bool,
    pub meter_bridge: bool,
}

impl Capabilities {
    pub fn of(controller: &dyn ControllerAdapter) -> Self {
        Self {
            display_7seg: controller.has_display_7seg(),
            display_lcd: controller.has_display_lcd(),
            display_timecode: controller.has_display_timecode(),
            automated_faders: controller.has_automated_faders(),
            meter_bridge: controller.has_meter_bridge(),
        }
    }
}

/// Static metadata describing a hardware controller class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerInfo {
    /// Display name, e.g. "Generic MIDI (CC)"
    pub name: &'static str,
    pub preferred_midi_input: &'static str,
    pub preferred_midi_output: &'static str,
    pub usage_hint: &'static str,
}

/// Decoded event from the host (DAW) side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Led { command: LogicalCommand, status: LedStatus },
    /// 14-bit fader position (0-16383); fader 8 is the master
    FaderPosition { fader: u8, position: u16 },
    PeakLevel { meter: u8, level: u8 },
    Display7Seg { position: u8, character: u8 },
    Timecode { position: u8, character: u8 },
    VPotRing { vpot: u8, ring: VPotRing },
    /// Full LCD row (1 = top, 2 = bottom)
    Lcd { row: u8, text: String },
    /// Handshake completed
    Connected,
    /// Host went offline
    Disconnected,
}

/// Decoded event from the hardware controller side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    Control { control: ControlRef, pressed: bool },
    FaderMoved { fader: u8, position: u16 },
    FaderTouched { fader: u8, touched: bool },
    /// Relative encoder movement, positive is clockwise
    VPotRotated { vpot: u8, delta: i8 },
}

/// Callback endpoint handed to the host adapter
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: Sender<HostEvent>,
    host_status: Arc<RwLock<HostStatus>>,
    capabilities: Capabilities,
}

impl SessionHandle {
    pub fn new(
        events: Sender<HostEvent>,
        host_status: Arc<RwLock<HostStatus>>,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            events,
            host_status,
            capabilities,
        }
    }

    /// Queue a decoded host event for the interconnector
    pub fn dispatch(&self, event: HostEvent) {
        if self.events.send(event).is_err() {
            trace!("Session closed, dropping host event");
        }
    }

    pub fn set_host_status(&self, status: HostStatus) {
        *self.host_status.write() = status;
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

/// The controller adapter's view of the host side
#[derive(Debug, Clone)]
pub struct HostHandle {
    events: Sender<ControllerEvent>,
    host_status: Arc<RwLock<HostStatus>>,
}

impl HostHandle {
    pub fn new(events: Sender<ControllerEvent>, host_status: Arc<RwLock<HostStatus>>) -> Self {
        Self {
            events,
            host_status,
        }
    }

    /// Queue a decoded hardware event for translation towards the host
    pub fn dispatch(&self, event: ControllerEvent) {
        if self.events.send(event).is_err() {
            trace!("Session closed, dropping controller event");
        }
    }

    pub fn host_status(&self) -> HostStatus {
        *self.host_status.read()
    }
}

/// DAW-facing MCU protocol endpoint
pub trait HostAdapter: Send {
    /// Wire host-originated events back to the session
    fn set_hardware_controller(&mut self, session: SessionHandle);

    fn connect(&mut self) -> Result<()>;

    fn disconnect(&mut self) -> Result<()>;

    /// Pump pending host MIDI without blocking, dispatching decoded events
    fn process_midi_input(&mut self) -> Result<()>;

    /// A surface switch was pressed or released
    fn switch(&mut self, command: LogicalCommand, pressed: bool) -> Result<()>;

    fn fader_moved(&mut self, fader: u8, position: u16) -> Result<()>;

    fn fader_touched(&mut self, fader: u8, touched: bool) -> Result<()>;

    fn vpot_rotated(&mut self, vpot: u8, delta: i8) -> Result<()>;
}

/// Hardware controller endpoint speaking the device's native dialect
pub trait ControllerAdapter: Send {
    fn info(&self) -> &'static ControllerInfo;

    /// Give the controller access to the host side (status and input)
    fn set_mackie_host_control(&mut self, host: HostHandle);

    fn connect(&mut self) -> Result<()>;

    fn disconnect(&mut self) -> Result<()>;

    /// Pump pending hardware MIDI without blocking, dispatching decoded events
    fn process_midi_input(&mut self) -> Result<()>;

    /// Host handshake completed
    fn host_connected(&mut self) {}

    /// Host went offline
    fn host_disconnected(&mut self) {}

    fn has_display_7seg(&self) -> bool;
    fn has_display_lcd(&self) -> bool;
    fn has_display_timecode(&self) -> bool;
    fn has_automated_faders(&self) -> bool;
    fn has_meter_bridge(&self) -> bool;

    fn update_led(&mut self, control: &ControlRef, status: LedStatus) -> Result<()>;

    fn fader_moved(&mut self, fader: u8, position: u16) -> Result<()>;

    fn set_peak_level(&mut self, meter: u8, level: u8) -> Result<()>;

    fn set_display_7seg(&mut self, position: u8, character: u8) -> Result<()>;

    fn set_display_timecode(&mut self, position: u8, character: u8) -> Result<()>;

    fn set_vpot_led_ring(&mut self, vpot: u8, ring: VPotRing) -> Result<()>;

    /// Write a full LCD row (1 = top, 2 = bottom)
    fn update_lcd(&mut self, row: u8, text: &str) -> Result<()>;
}
