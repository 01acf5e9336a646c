use std::collections::VecDeque;
use std::time::Duration;

use sqrtlink_core::{
    BusEvent, BusTransport, DeviceSession, DigitalOutput, Level, SessionConfig, SimulatedDevice,
    TransportError,
};

fn fast() -> SessionConfig {
    SessionConfig {
        reset_hold: Duration::ZERO,
        settle: Duration::ZERO,
        log_capacity: 8,
    }
}

/// Replays captured peripheral replies in order.
struct FixtureBus {
    replies: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
}

impl BusTransport for FixtureBus {
    fn transfer(&mut self, out: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.sent.push(out.to_vec());
        self.replies
            .pop_front()
            .ok_or_else(|| TransportError::Simulated("no reply left".into()))
    }
}

#[derive(Default)]
struct RecordingPin {
    levels: Vec<Level>,
}

impl DigitalOutput for RecordingPin {
    fn set_level(&mut self, level: Level) -> Result<(), TransportError> {
        self.levels.push(level);
        Ok(())
    }
}

#[test]
fn decodes_captured_reply_for_one() {
    let mut bus = FixtureBus {
        replies: VecDeque::from(vec![
            vec![0x00, 0x00, 0x00, 0x00, 0x00],
            vec![0x00, 0x00, 0x01, 0x00, 0xEE],
        ]),
        sent: Vec::new(),
    };
    let mut pin = RecordingPin::default();
    {
        let mut session = DeviceSession::new(&mut bus, &mut pin, fast()).unwrap();
        assert_eq!(session.submit(1.0).unwrap(), 1.0);
    }
    assert_eq!(
        bus.sent,
        vec![
            vec![0x80, 0x00, 0x01, 0x00, 0x00],
            vec![0x01, 0x00, 0x00, 0x00, 0x00],
        ]
    );
    use Level::{High, Low};
    assert_eq!(pin.levels, vec![Low, High, Low, High, Low, High, Low]);
}

#[test]
fn boxed_backends_drive_simulated_device() {
    let dev = SimulatedDevice::new();
    let bus: Box<dyn BusTransport> = Box::new(dev.bus());
    let pin: Box<dyn DigitalOutput> = Box::new(dev.reset_line());
    let mut session = DeviceSession::new(bus, pin, fast()).unwrap();

    let results: Vec<f64> = [0.0, 1.0, 16.0, 100.0, 0.5]
        .into_iter()
        .map(|v| session.submit(v).unwrap())
        .collect();
    // 0.5 -> isqrt(0x8000) = 181 -> 0.70703125
    assert_eq!(results, vec![0.0, 1.0, 4.0, 10.0, 0.70703125]);

    let transfers = dev
        .journal()
        .iter()
        .filter(|e| matches!(e, BusEvent::Transfer { .. }))
        .count();
    assert_eq!(transfers, 10);
}

#[test]
fn zero_operand_goes_out_as_zero_word() {
    let dev = SimulatedDevice::new();
    let mut session = DeviceSession::new(dev.bus(), dev.reset_line(), fast()).unwrap();
    session.submit(0.0).unwrap();
    let first = dev.journal().into_iter().find_map(|e| match e {
        BusEvent::Transfer { out, .. } => Some(out),
        _ => None,
    });
    assert_eq!(first, Some(vec![0x80, 0, 0, 0, 0]));
}

#[test]
fn into_parts_returns_hardware() {
    let dev = SimulatedDevice::new();
    let session = DeviceSession::new(dev.bus(), dev.reset_line(), fast()).unwrap();
    let (mut bus, _pin) = session.into_parts();
    assert_eq!(bus.transfer(&[0x01, 0, 0, 0, 0]).unwrap().len(), 5);
}
