//! Interconnector - the hub between the MCU host endpoint and the hardware controller
//!
//! The interconnector owns:
//! - the host adapter and the controller adapter (injected, never swapped)
//! - the link table mapping logical commands to hardware controls
//! - the LED state cache used to suppress redundant LED traffic
//!
//! It is driven by an external timer calling [`Interconnector::process_tick`].
//! Within one tick all controller-side input is handled before host-side input.

mod leds;

use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::adapter::{
    Capabilities, ControllerAdapter, ControllerEvent, ControllerInfo, HostAdapter, HostEvent,
    HostHandle, HostStatus, SessionHandle, VPotRing,
};
use crate::command::{LedStatus, LogicalCommand};
use crate::error::{BridgeError, Result};
use crate::led_cache::LedStateCache;
use crate::link_table::{ControlRef, LinkTable};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
}

/// Number of events handled during one tick, per side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub controller_events: usize,
    pub host_events: usize,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.controller_events == 0 && self.host_events == 0
    }
}

pub struct Interconnector {
    host: Box<dyn HostAdapter>,
    controller: Box<dyn ControllerAdapter>,
    links: LinkTable,
    leds: LedStateCache,
    state: SessionState,
    /// Written by the host adapter, read by the controller adapter
    host_status: Arc<RwLock<HostStatus>>,
    host_tx: Sender<HostEvent>,
    host_rx: Receiver<HostEvent>,
    controller_tx: Sender<ControllerEvent>,
    controller_rx: Receiver<ControllerEvent>,
    unmapped_led_updates: u64,
}

impl Interconnector {
    /// Create a session around two already-configured adapters
    pub fn new(host: Box<dyn HostAdapter>, controller: Box<dyn ControllerAdapter>) -> Self {
        let (host_tx, host_rx) = unbounded();
        let (controller_tx, controller_rx) = unbounded();

        Self {
            host,
            controller,
            links: LinkTable::new(),
            leds: LedStateCache::new(),
            state: SessionState::Disconnected,
            host_status: Arc::new(RwLock::new(HostStatus::Offline)),
            host_tx,
            host_rx,
            controller_tx,
            controller_rx,
            unmapped_led_updates: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Handshake state last published by the host adapter
    pub fn host_status(&self) -> HostStatus {
        *self.host_status.read()
    }

    pub fn controller_info(&self) -> &'static ControllerInfo {
        self.controller.info()
    }

    // --- lifecycle ---

    /// Wire both adapters together and connect them, controller first.
    ///
    /// If the host fails to connect, the controller is disconnected again and
    /// the session stays disconnected.
    pub fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(BridgeError::AlreadyConnected);
        }

        self.controller.set_mackie_host_control(HostHandle::new(
            self.controller_tx.clone(),
            self.host_status.clone(),
        ));
        self.host.set_hardware_controller(SessionHandle::new(
            self.host_tx.clone(),
            self.host_status.clone(),
            Capabilities::of(self.controller.as_ref()),
        ));

        info!("Connecting hardware controller '{}'", self.controller.info().name);
        self.controller.connect()?;

        info!("Connecting MCU host");
        if let Err(e) = self.host.connect() {
            warn!("MCU host connection failed: {}", e);
            if let Err(rollback) = self.controller.disconnect() {
                warn!("Failed to disconnect hardware controller: {}", rollback);
            }
            return Err(e);
        }

        self.state = SessionState::Connected;
        info!("Interconnector connected");
        Ok(())
    }

    /// Disconnect the host first, then the controller.
    ///
    /// The controller hears that the host went offline before it is closed.
    pub fn disconnect(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Err(BridgeError::NotConnected);
        }

        info!("Disconnecting MCU host");
        self.host.disconnect()?;

        // Only the offline notice is delivered, the controller is still open
        let mut stale = 0;
        let mut went_offline = false;
        for event in self.host_rx.try_iter() {
            match event {
                HostEvent::Disconnected => went_offline = true,
                _ => stale += 1,
            }
        }
        if went_offline {
            info!("MCU host went offline");
            self.controller.host_disconnected();
        }

        info!("Disconnecting hardware controller '{}'", self.controller.info().name);
        self.controller.disconnect()?;

        self.state = SessionState::Disconnected;
        *self.host_status.write() = HostStatus::Offline;

        stale += self.controller_rx.try_iter().count();
        if stale > 0 {
            debug!("Dropped {} unprocessed events on disconnect", stale);
        }

        info!("Interconnector disconnected");
        Ok(())
    }

    /// Pump one round of controller input, then one round of host input.
    ///
    /// Never blocks; returns immediately when nothing is pending.
    pub fn process_tick(&mut self) -> Result<TickReport> {
        if !self.is_connected() {
            return Err(BridgeError::NotConnected);
        }

        let mut report = TickReport::default();

        self.controller.process_midi_input()?;
        let events: Vec<ControllerEvent> = self.controller_rx.try_iter().collect();
        report.controller_events = events.len();
        for event in events {
            self.on_controller_event(event);
        }

        self.host.process_midi_input()?;
        let events: Vec<HostEvent> = self.host_rx.try_iter().collect();
        report.host_events = events.len();
        for event in events {
            self.on_host_event(event);
        }

        if !report.is_idle() {
            trace!(
                "Tick: {} controller events, {} host events",
                report.controller_events,
                report.host_events
            );
        }

        Ok(report)
    }

    fn on_controller_event(&mut self, event: ControllerEvent) {
        let result = match event {
            ControllerEvent::Control { control, pressed } => {
                match self.links.resolve_to_command(&control) {
                    Some(command) => {
                        trace!("Control '{}' -> {} (pressed: {})", control, command, pressed);
                        self.host.switch(command, pressed)
                    }
                    None => {
                        debug!("Control '{}' is not linked to any MCU command", control);
                        Ok(())
                    }
                }
            }
            ControllerEvent::FaderMoved { fader, position } => self.host.fader_moved(fader, position),
            ControllerEvent::FaderTouched { fader, touched } => {
                self.host.fader_touched(fader, touched)
            }
            ControllerEvent::VPotRotated { vpot, delta } => self.host.vpot_rotated(vpot, delta),
        };

        if let Err(e) = result {
            warn!("Failed to forward controller input to host: {}", e);
        }
    }

    fn on_host_event(&mut self, event: HostEvent) {
        let result = match event {
            HostEvent::Led { command, status } => self.update_led(command, status),
            HostEvent::FaderPosition { fader, position } => self.fader_moved(fader, position),
            HostEvent::PeakLevel { meter, level } => self.set_peak_level(meter, level),
            HostEvent::Display7Seg {
                position,
                character,
            } => self.set_display_7seg(position, character),
            HostEvent::Timecode {
                position,
                character,
            } => self.set_display_timecode(position, character),
            HostEvent::VPotRing { vpot, ring } => self.set_vpot_led_ring(vpot, ring),
            HostEvent::Lcd { row, text } => self.update_lcd(row, &text),
            HostEvent::Connected => {
                info!("MCU host connected");
                self.controller.host_connected();
                Ok(())
            }
            HostEvent::Disconnected => {
                info!("MCU host went offline");
                self.controller.host_disconnected();
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("Failed to forward host output to controller: {}", e);
        }
    }

    // --- link table ---

    /// Link a logical command to a hardware control, replacing prior links.
    ///
    /// The cached LED value is kept and reaches the hardware on its next change.
    pub fn link(&mut self, command: LogicalCommand, control: ControlRef) {
        debug!("Linking {} <-> {}", command, control);
        self.links.link(command, control);
    }

    /// Remove a link; a pair that is not currently linked is ignored
    pub fn unlink(&mut self, command: LogicalCommand, control: &ControlRef) {
        if self.links.unlink(command, control) {
            debug!("Unlinked {} <-> {}", command, control);
        } else {
            debug!("Ignoring unlink of {} <-> {}: not linked to each other", command, control);
        }
    }

    pub fn resolve_to_control(&self, command: LogicalCommand) -> Option<&ControlRef> {
        self.links.resolve_to_control(command)
    }

    pub fn resolve_to_command(&self, control: &ControlRef) -> Option<LogicalCommand> {
        self.links.resolve_to_command(control)
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    // --- LED state ---

    /// Single writer of LED state.
    ///
    /// Identical consecutive updates produce no traffic. Unlinked commands are
    /// cached and counted but never reach the controller.
    pub fn update_led(&mut self, command: LogicalCommand, status: LedStatus) -> Result<()> {
        let previous = self.leds.get(command);
        if !self.leds.update(command, status) {
            return Ok(());
        }

        let Some(control) = self.links.resolve_to_control(command) else {
            self.unmapped_led_updates += 1;
            debug!("LED \"{}\" NOT set to \"{}\" (no linked control)", command, status);
            return Ok(());
        };

        if let Err(e) = self.controller.update_led(control, status) {
            // Keep the cache honest so the next update retries
            self.leds.update(command, previous);
            return Err(e);
        }
        Ok(())
    }

    pub fn led_status(&self, command: LogicalCommand) -> LedStatus {
        self.leds.get(command)
    }

    /// LED updates dropped because their command had no linked control
    pub fn unmapped_led_updates(&self) -> u64 {
        self.unmapped_led_updates
    }

    // --- hardware controller capabilities ---

    pub fn has_display_7seg(&self) -> bool {
        self.controller.has_display_7seg()
    }

    pub fn has_display_lcd(&self) -> bool {
        self.controller.has_display_lcd()
    }

    pub fn has_display_timecode(&self) -> bool {
        self.controller.has_display_timecode()
    }

    pub fn has_automated_faders(&self) -> bool {
        self.controller.has_automated_faders()
    }

    pub fn has_meter_bridge(&self) -> bool {
        self.controller.has_meter_bridge()
    }

    // --- host output passed through to the controller ---

    pub fn fader_moved(&mut self, fader: u8, position: u16) -> Result<()> {
        self.controller.fader_moved(fader, position)
    }

    pub fn set_peak_level(&mut self, meter: u8, level: u8) -> Result<()> {
        self.controller.set_peak_level(meter, level)
    }

    pub fn set_display_7seg(&mut self, position: u8, character: u8) -> Result<()> {
        self.controller.set_display_7seg(position, character)
    }

    pub fn set_display_timecode(&mut self, position: u8, character: u8) -> Result<()> {
        self.controller.set_display_timecode(position, character)
    }

    pub fn set_vpot_led_ring(&mut self, vpot: u8, ring: VPotRing) -> Result<()> {
        self.controller.set_vpot_led_ring(vpot, ring)
    }

    /// Send a full LCD row to the controller (1 = top, 2 = bottom)
    pub fn update_lcd(&mut self, row: u8, text: &str) -> Result<()> {
        self.controller.update_lcd(row, text)
    }
}
