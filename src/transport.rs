//! MIDI transport used by the endpoint adapters
//!
//! Ports are selected by case-insensitive substring match (Windows-friendly).
//! Inbound messages are queued by the midir callback thread and drained
//! without blocking from the tick loop.

pub mod memory;

use crossbeam::channel::{unbounded, Receiver};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tracing::{debug, info, trace};

use crate::error::{BridgeError, PortDirection, Result};
use crate::midi::{format_hex, MidiMessage};

pub use memory::{MemoryPeer, MemoryTransport};

/// A bidirectional MIDI port pair
pub trait MidiTransport: Send {
    /// Open the input and output ports matching the given names
    fn open(&mut self, input: &str, output: &str) -> Result<()>;

    fn close(&mut self);

    fn is_open(&self) -> bool;

    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Next pending inbound message, if any. Never blocks.
    fn receive(&mut self) -> Option<Vec<u8>>;

    fn send_message(&mut self, message: &MidiMessage) -> Result<()> {
        self.send(&message.encode())
    }
}

/// List available MIDI input ports
pub fn list_input_ports() -> Result<Vec<String>> {
    let midi_in = MidiInput::new("MCU-Bridge-Scanner")?;
    Ok(midi_in
        .ports()
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect())
}

/// List available MIDI output ports
pub fn list_output_ports() -> Result<Vec<String>> {
    let midi_out = MidiOutput::new("MCU-Bridge-Scanner")?;
    Ok(midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect())
}

/// Index of the first name containing `pattern`, ignoring case
pub fn match_port_name<S: AsRef<str>>(names: &[S], pattern: &str) -> Option<usize> {
    let pattern = pattern.to_lowercase();
    names
        .iter()
        .position(|name| name.as_ref().to_lowercase().contains(&pattern))
}

/// midir-backed transport
pub struct MidirTransport {
    client_name: String,
    input: Option<MidiInputConnection<()>>,
    output: Option<MidiOutputConnection>,
    inbound: Option<Receiver<Vec<u8>>>,
}

impl MidirTransport {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            input: None,
            output: None,
            inbound: None,
        }
    }

    fn connect_input(&mut self, pattern: &str) -> Result<()> {
        let mut midi_in = MidiInput::new(&format!("{}-In", self.client_name))?;
        // SysEx carries the MCU handshake and LCD text
        midi_in.ignore(Ignore::TimeAndActiveSense);

        let ports = midi_in.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|p| midi_in.port_name(p).unwrap_or_default())
            .collect();
        let index = match_port_name(&names, pattern).ok_or_else(|| BridgeError::PortNotFound {
            direction: PortDirection::Input,
            pattern: pattern.to_string(),
        })?;

        info!("Connecting to input port: {}", names[index]);

        let (tx, rx) = unbounded();
        let connection = midi_in.connect(
            &ports[index],
            &self.client_name,
            move |_timestamp, data, _| {
                trace!("RX {}", format_hex(data));
                // Receiver dropped means the transport is closing
                let _ = tx.send(data.to_vec());
            },
            (),
        )?;

        self.input = Some(connection);
        self.inbound = Some(rx);
        Ok(())
    }

    fn connect_output(&mut self, pattern: &str) -> Result<()> {
        let midi_out = MidiOutput::new(&format!("{}-Out", self.client_name))?;

        let ports = midi_out.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|p| midi_out.port_name(p).unwrap_or_default())
            .collect();
        let index = match_port_name(&names, pattern).ok_or_else(|| BridgeError::PortNotFound {
            direction: PortDirection::Output,
            pattern: pattern.to_string(),
        })?;

        info!("Connecting to output port: {}", names[index]);

        let connection = midi_out.connect(&ports[index], &self.client_name)?;
        self.output = Some(connection);
        Ok(())
    }
}

impl MidiTransport for MidirTransport {
    fn open(&mut self, input: &str, output: &str) -> Result<()> {
        self.close();

        let result = self
            .connect_input(input)
            .and_then(|_| self.connect_output(output));
        if result.is_err() {
            self.close();
        }
        result
    }

    fn close(&mut self) {
        if let Some(connection) = self.input.take() {
            connection.close();
        }
        if let Some(connection) = self.output.take() {
            connection.close();
        }
        if self.inbound.take().is_some() {
            debug!("{}: ports closed", self.client_name);
        }
    }

    fn is_open(&self) -> bool {
        self.input.is_some() && self.output.is_some()
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        let output = self.output.as_mut().ok_or(BridgeError::PortClosed)?;
        output.send(data)?;
        trace!("TX {}", format_hex(data));
        Ok(())
    }

    fn receive(&mut self) -> Option<Vec<u8>> {
        self.inbound.as_ref()?.try_recv().ok()
    }
}

impl Drop for MidirTransport {
    fn drop(&mut self) {
        self.close();
    }
}
