//! In-process MIDI transport
//!
//! The peer side plays the remote device: it injects inbound messages and
//! collects whatever the transport sent.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use super::MidiTransport;
use crate::error::{BridgeError, PortDirection, Result};

#[derive(Debug, Default)]
struct Shared {
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    ports: Option<(String, String)>,
    unavailable: bool,
}

/// Transport endpoint handed to an adapter
#[derive(Debug)]
pub struct MemoryTransport {
    shared: Arc<Mutex<Shared>>,
    open: bool,
}

/// Remote end of a [`MemoryTransport`]
#[derive(Debug, Clone)]
pub struct MemoryPeer {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryTransport {
    pub fn pair() -> (MemoryTransport, MemoryPeer) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            MemoryTransport {
                shared: shared.clone(),
                open: false,
            },
            MemoryPeer { shared },
        )
    }
}

impl MidiTransport for MemoryTransport {
    fn open(&mut self, input: &str, output: &str) -> Result<()> {
        let mut shared = self.shared.lock();
        if shared.unavailable {
            return Err(BridgeError::PortNotFound {
                direction: PortDirection::Input,
                pattern: input.to_string(),
            });
        }
        shared.ports = Some((input.to_string(), output.to_string()));
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        self.shared.lock().ports = None;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.open {
            return Err(BridgeError::PortClosed);
        }
        self.shared.lock().sent.push(data.to_vec());
        Ok(())
    }

    fn receive(&mut self) -> Option<Vec<u8>> {
        if !self.open {
            return None;
        }
        self.shared.lock().inbound.pop_front()
    }
}

impl MemoryPeer {
    /// Queue a message for the transport to receive
    pub fn inject(&self, data: &[u8]) {
        self.shared.lock().inbound.push_back(data.to_vec());
    }

    /// Take every message sent so far
    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.shared.lock().sent)
    }

    /// Port names the transport was last opened with
    pub fn opened_ports(&self) -> Option<(String, String)> {
        self.shared.lock().ports.clone()
    }

    /// Make the next `open` fail as if the ports did not exist
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.lock().unavailable = unavailable;
    }
}
