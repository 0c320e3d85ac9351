use super::*;
use crate::adapter::Capabilities;
use crate::transport::{MemoryPeer, MemoryTransport};
use crossbeam::channel::{unbounded, Receiver};
use parking_lot::RwLock;
use std::sync::Arc;

struct Fixture {
    host: MackieHostControl,
    peer: MemoryPeer,
    events: Receiver<HostEvent>,
    status: Arc<RwLock<HostStatus>>,
}

impl Fixture {
    fn new(model: McuModel) -> Self {
        let (transport, peer) = MemoryTransport::pair();
        let mut host = MackieHostControl::new(HostSettings::for_model(model), Box::new(transport));

        let (tx, events) = unbounded();
        let status = Arc::new(RwLock::new(HostStatus::Offline));
        host.set_hardware_controller(SessionHandle::new(tx, status.clone(), Capabilities::default()));
        host.connect().unwrap();

        Self {
            host,
            peer,
            events,
            status,
        }
    }

    fn feed(&mut self, data: &[u8]) -> Vec<HostEvent> {
        self.peer.inject(data);
        self.host.process_midi_input().unwrap();
        self.events.try_iter().collect()
    }

    fn device_query(&mut self) -> [u8; 4] {
        let id = self.host.settings().model.device_id();
        self.feed(&[0xF0, 0x00, 0x00, 0x66, id, 0x00, 0xF7]);

        let sent = self.peer.take_sent();
        assert_eq!(sent.len(), 1);
        let query = &sent[0];
        assert_eq!(&query[..6], &[0xF0, 0x00, 0x00, 0x66, id, 0x01]);
        assert_eq!(&query[6..13], &handshake::SERIAL);
        assert_eq!(query[17], 0xF7);
        [query[13], query[14], query[15], query[16]]
    }

    fn connection_reply(&mut self, response: [u8; 4]) -> Vec<HostEvent> {
        let mut message = vec![0xF0, 0x00, 0x00, 0x66, self.host.settings().model.device_id(), 0x02];
        message.extend_from_slice(&handshake::SERIAL);
        message.extend_from_slice(&response);
        message.push(0xF7);
        self.feed(&message)
    }
}

#[test]
fn test_model_defaults() {
    assert_eq!(McuModel::default(), McuModel::LogicControl);
    assert!(McuModel::LogicControl.challenge_response_default());
    assert!(!McuModel::MackieControl.challenge_response_default());
    assert_eq!(McuModel::MackieControlXt.device_id(), 0x15);
    assert_eq!(McuModel::LogicControlXt.preferred_midi_input(), "MCU XT In");

    assert_eq!("Mackie Control".parse::<McuModel>().unwrap(), McuModel::MackieControl);
    assert_eq!("logic_control_xt".parse::<McuModel>().unwrap(), McuModel::LogicControlXt);
    assert!(matches!("x-touch".parse::<McuModel>(), Err(BridgeError::UnknownModel(_))));
}

#[test]
fn test_logic_handshake() {
    let mut fx = Fixture::new(McuModel::LogicControl);
    assert_eq!(fx.host.status(), HostStatus::Offline);

    let challenge = fx.device_query();
    assert_eq!(*fx.status.read(), HostStatus::Identifying);

    let events = fx.connection_reply(handshake::challenge_response(challenge));
    assert_eq!(events, vec![HostEvent::Connected]);
    assert_eq!(*fx.status.read(), HostStatus::Online);

    let mut confirmation = vec![0xF0, 0x00, 0x00, 0x66, 0x10, 0x03];
    confirmation.extend_from_slice(&handshake::SERIAL);
    confirmation.push(0xF7);
    assert_eq!(fx.peer.take_sent(), vec![confirmation]);
}

#[test]
fn test_wrong_response_is_rejected() {
    let mut fx = Fixture::new(McuModel::LogicControl);
    let challenge = fx.device_query();

    let mut wrong = handshake::challenge_response(challenge);
    wrong[0] ^= 0x01;
    let events = fx.connection_reply(wrong);

    assert!(events.is_empty());
    assert_eq!(*fx.status.read(), HostStatus::Offline);
    let sent = fx.peer.take_sent();
    assert_eq!(sent[0][5], handshake::HOST_CONNECTION_ERROR);
}

#[test]
fn test_mackie_model_is_online_without_handshake() {
    let mut fx = Fixture::new(McuModel::MackieControl);
    assert_eq!(fx.host.status(), HostStatus::Online);
    assert_eq!(fx.events.try_iter().collect::<Vec<_>>(), vec![HostEvent::Connected]);

    fx.device_query();
    let events = fx.connection_reply([0, 0, 0, 0]);
    assert!(events.is_empty());
    assert_eq!(fx.peer.take_sent()[0][5], handshake::HOST_CONNECTION_CONFIRMATION);
}

#[test]
fn test_go_offline() {
    let mut fx = Fixture::new(McuModel::MackieControl);
    fx.events.try_iter().count();

    let events = fx.feed(&[0xF0, 0x00, 0x00, 0x66, 0x14, 0x0F, 0x7F, 0xF7]);
    assert_eq!(events, vec![HostEvent::Disconnected]);
    assert_eq!(*fx.status.read(), HostStatus::Offline);
}

#[test]
fn test_firmware_version_request() {
    let mut fx = Fixture::new(McuModel::LogicControlXt);
    fx.feed(&[0xF0, 0x00, 0x00, 0x66, 0x11, 0x13, 0x00, 0xF7]);

    assert_eq!(
        fx.peer.take_sent(),
        vec![handshake::sysex(0x11, handshake::VERSION_REPLY, handshake::FIRMWARE_VERSION)]
    );
}

#[test]
fn test_sysex_for_other_device_is_ignored() {
    let mut fx = Fixture::new(McuModel::LogicControl);
    let events = fx.feed(&[0xF0, 0x00, 0x00, 0x66, 0x14, 0x00, 0xF7]);

    assert!(events.is_empty());
    assert!(fx.peer.take_sent().is_empty());
}

#[test]
fn test_led_output() {
    let mut fx = Fixture::new(McuModel::LogicControl);

    let events = fx.feed(&[0x90, 0x10, 0x7F]);
    assert_eq!(
        events,
        vec![HostEvent::Led {
            command: LogicalCommand::MuteChannel1,
            status: LedStatus::On,
        }]
    );

    let events = fx.feed(&[0x90, 0x5E, 0x01]);
    assert_eq!(
        events,
        vec![HostEvent::Led {
            command: LogicalCommand::Play,
            status: LedStatus::Flashing,
        }]
    );

    let events = fx.feed(&[0x90, 0x10, 0x00]);
    assert_eq!(
        events,
        vec![HostEvent::Led {
            command: LogicalCommand::MuteChannel1,
            status: LedStatus::Off,
        }]
    );
}

#[test]
fn test_fader_meter_and_vpot_ring_output() {
    let mut fx = Fixture::new(McuModel::LogicControl);

    let events = fx.feed(&[0xE8, 0x7F, 0x7F]);
    assert_eq!(events, vec![HostEvent::FaderPosition { fader: 8, position: 0x3FFF }]);

    let events = fx.feed(&[0xD0, 0x2C]);
    assert_eq!(events, vec![HostEvent::PeakLevel { meter: 2, level: 0x0C }]);

    let events = fx.feed(&[0xB0, 0x31, 0x56]);
    assert_eq!(
        events,
        vec![HostEvent::VPotRing {
            vpot: 1,
            ring: VPotRing::from_mcu(0x56),
        }]
    );
}

#[test]
fn test_seven_segment_output() {
    let mut fx = Fixture::new(McuModel::LogicControl);

    let events = fx.feed(&[0xB0, 0x40, 0x31]);
    assert_eq!(events, vec![HostEvent::Timecode { position: 0, character: 0x31 }]);

    let events = fx.feed(&[0xB0, 0x4B, 0x05]);
    assert_eq!(events, vec![HostEvent::Display7Seg { position: 1, character: 0x05 }]);
}

#[test]
fn test_lcd_rows() {
    let mut fx = Fixture::new(McuModel::LogicControl);

    let mut message = vec![0xF0, 0x00, 0x00, 0x66, 0x10, 0x12, 0x00];
    message.extend_from_slice(b"Kick");
    message.push(0xF7);
    let events = fx.feed(&message);

    assert_eq!(events.len(), 1);
    match &events[0] {
        HostEvent::Lcd { row, text } => {
            assert_eq!(*row, 1);
            assert_eq!(text.len(), LCD_ROW_LENGTH);
            assert!(text.starts_with("Kick  "));
        }
        other => panic!("unexpected event {:?}", other),
    }

    // A write spanning the row boundary updates both rows
    let mut message = vec![0xF0, 0x00, 0x00, 0x66, 0x10, 0x12, 0x36];
    message.extend_from_slice(b"ABCD");
    message.push(0xF7);
    let events = fx.feed(&message);

    assert_eq!(events.len(), 2);
    let [top, bottom] = fx.host.lcd_rows();
    assert!(top.ends_with("AB"));
    assert!(bottom.starts_with("CD"));
}

#[test]
fn test_reset_leds() {
    let mut fx = Fixture::new(McuModel::LogicControl);
    let events = fx.feed(&[0xF0, 0x00, 0x00, 0x66, 0x10, 0x62, 0xF7]);

    assert_eq!(events.len(), LogicalCommand::ALL.len());
    assert!(events
        .iter()
        .all(|e| matches!(e, HostEvent::Led { status: LedStatus::Off, .. })));
}

#[test]
fn test_surface_input_encoding() {
    let mut fx = Fixture::new(McuModel::LogicControl);

    fx.host.switch(LogicalCommand::SoloChannel3, true).unwrap();
    fx.host.switch(LogicalCommand::SoloChannel3, false).unwrap();
    fx.host.switch(LogicalCommand::Smpte, true).unwrap();
    fx.host.fader_moved(2, 8192).unwrap();
    fx.host.fader_touched(MASTER_FADER, true).unwrap();
    fx.host.vpot_rotated(0, 3).unwrap();
    fx.host.vpot_rotated(7, -2).unwrap();

    assert_eq!(
        fx.peer.take_sent(),
        vec![
            vec![0x90, 0x0A, 0x7F],
            vec![0x90, 0x0A, 0x00],
            vec![0xE2, 0x00, 0x40],
            vec![0x90, 0x70, 0x7F],
            vec![0xB0, 0x10, 0x03],
            vec![0xB0, 0x17, 0x42],
        ]
    );
}

#[test]
fn test_disconnect_closes_ports() {
    let mut fx = Fixture::new(McuModel::LogicControl);
    assert!(fx.peer.opened_ports().is_some());

    fx.host.disconnect().unwrap();
    assert!(fx.peer.opened_ports().is_none());
    assert!(matches!(fx.host.process_midi_input(), Err(BridgeError::PortClosed)));
}

#[test]
fn test_connect_fails_without_ports() {
    let (transport, peer) = MemoryTransport::pair();
    peer.set_unavailable(true);
    let mut host = MackieHostControl::new(
        HostSettings::for_model(McuModel::MackieControl),
        Box::new(transport),
    );

    assert!(matches!(host.connect(), Err(BridgeError::PortNotFound { .. })));
    assert_eq!(host.status(), HostStatus::Offline);
}
