//! MCU SysEx vocabulary and the Logic Control challenge-response
//!
//! All SysEx payloads here exclude the F0/F7 framing:
//! `00 00 66 <device id> <command> <data...>`

use std::time::{SystemTime, UNIX_EPOCH};

/// Mackie Designs manufacturer id
pub const MANUFACTURER: [u8; 3] = [0x00, 0x00, 0x66];

/// Serial number reported to the host, seven ASCII bytes
pub const SERIAL: [u8; 7] = *b"MCUBR01";

/// Firmware version reported to the host
pub const FIRMWARE_VERSION: &[u8; 5] = b"V1.02";

pub const DEVICE_QUERY: u8 = 0x00;
pub const HOST_CONNECTION_QUERY: u8 = 0x01;
pub const HOST_CONNECTION_REPLY: u8 = 0x02;
pub const HOST_CONNECTION_CONFIRMATION: u8 = 0x03;
pub const HOST_CONNECTION_ERROR: u8 = 0x04;
pub const GO_OFFLINE: u8 = 0x0F;
pub const LCD: u8 = 0x12;
pub const VERSION_REQUEST: u8 = 0x13;
pub const VERSION_REPLY: u8 = 0x14;
pub const RESET_FADERS: u8 = 0x61;
pub const RESET_LEDS: u8 = 0x62;

/// Build a framed SysEx message for the given device
pub fn sysex(device_id: u8, command: u8, data: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(data.len() + 7);
    message.push(0xF0);
    message.extend_from_slice(&MANUFACTURER);
    message.push(device_id);
    message.push(command);
    message.extend_from_slice(data);
    message.push(0xF7);
    message
}

/// Split an unframed SysEx payload into device id, command and data.
///
/// Returns `None` for other manufacturers and truncated messages.
pub fn split(payload: &[u8]) -> Option<(u8, u8, &[u8])> {
    let rest = payload.strip_prefix(&MANUFACTURER[..])?;
    let (&device_id, rest) = rest.split_first()?;
    let (&command, data) = rest.split_first()?;
    Some((device_id, command, data))
}

/// Response a Logic host must return for `challenge`
pub fn challenge_response(challenge: [u8; 4]) -> [u8; 4] {
    let [l1, l2, l3, l4] = challenge.map(i32::from);

    [
        0x7F & (l1 + (l2 ^ 0x0A) - l4),
        0x7F & ((l3 >> 4) ^ (l1 + l4)),
        0x7F & ((l4 - (l3 << 2)) ^ (l1 | l2)),
        0x7F & (l2 - l3 + (0xF0 ^ (l4 << 4))),
    ]
    .map(|r| r as u8)
}

/// Fresh 7-bit challenge bytes
pub fn new_challenge() -> [u8; 4] {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
        .unwrap_or(0x2A5F_3C71);

    [
        (nanos & 0x7F) as u8,
        ((nanos >> 7) & 0x7F) as u8,
        ((nanos >> 14) & 0x7F) as u8,
        ((nanos >> 21) & 0x7F) as u8,
    ]
}
