//! Error types for the bridge core and its endpoints.

use thiserror::Error;

/// Port direction, used in error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("session is not connected")]
    NotConnected,

    #[error("session is already connected")]
    AlreadyConnected,

    #[error("MIDI {direction} port '{pattern}' not found")]
    PortNotFound {
        direction: PortDirection,
        pattern: String,
    },

    #[error("MIDI port is not open")]
    PortClosed,

    #[error("MIDI error: {0}")]
    Midi(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown MCU command '{0}'")]
    UnknownCommand(String),

    #[error("unknown hardware controller '{0}'")]
    UnknownController(String),

    #[error("unknown MCU model '{0}'")]
    UnknownModel(String),
}

impl From<midir::InitError> for BridgeError {
    fn from(e: midir::InitError) -> Self {
        BridgeError::Midi(e.to_string())
    }
}

impl From<midir::PortInfoError> for BridgeError {
    fn from(e: midir::PortInfoError) -> Self {
        BridgeError::Midi(e.to_string())
    }
}

impl From<midir::SendError> for BridgeError {
    fn from(e: midir::SendError) -> Self {
        BridgeError::Midi(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiOutput>> for BridgeError {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        BridgeError::Midi(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiInput>> for BridgeError {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        BridgeError::Midi(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
