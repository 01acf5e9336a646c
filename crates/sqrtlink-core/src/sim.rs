//! In-process stand-in for the square-root peripheral.
//!
//! The bus and the reset line share one journal, so the exact interleaving of
//! pin writes and transfers can be inspected after a request.

use std::sync::Arc;

use parking_lot::Mutex;
use sqrtlink_codec::Selector;

use crate::transport::{BusTransport, DigitalOutput, Level, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    Level(Level),
    Transfer { out: Vec<u8>, response: Vec<u8> },
}

#[derive(Debug, Default)]
struct DeviceState {
    operand: u32,
    held_in_reset: bool,
    journal: Vec<BusEvent>,
    transfers: usize,
    level_writes: usize,
    fail_transfer: Option<usize>,
    fail_level_write: Option<usize>,
    truncate_replies: bool,
}

impl DeviceState {
    fn respond(&mut self, out: &[u8]) -> Vec<u8> {
        let mut response = vec![0u8; out.len()];
        if self.held_in_reset || out.is_empty() {
            return response;
        }
        response[0] = out[0];
        match Selector::from_byte(out[0]) {
            Some(Selector::WriteOperand) if out.len() >= 5 => {
                self.operand = u32::from_be_bytes([out[1], out[2], out[3], out[4]]);
            }
            Some(Selector::ReadResult) => {
                let root = isqrt(self.operand).to_be_bytes();
                for (dst, src) in response.iter_mut().skip(1).zip(&root[1..]) {
                    *dst = *src;
                }
            }
            _ => {}
        }
        response
    }
}

/// Handle to a simulated peripheral. Clones share the same device.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bus(&self) -> SimBus {
        SimBus {
            state: self.state.clone(),
        }
    }

    pub fn reset_line(&self) -> SimResetLine {
        SimResetLine {
            state: self.state.clone(),
        }
    }

    /// Make the transfer with this zero-based index fail.
    pub fn fail_transfer(&self, index: usize) {
        self.state.lock().fail_transfer = Some(index);
    }

    /// Make the pin write with this zero-based index fail.
    pub fn fail_level_write(&self, index: usize) {
        self.state.lock().fail_level_write = Some(index);
    }

    /// Answer every transfer with one byte less than was sent.
    pub fn truncate_replies(&self, on: bool) {
        self.state.lock().truncate_replies = on;
    }

    pub fn journal(&self) -> Vec<BusEvent> {
        self.state.lock().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state.lock().journal.clear();
    }

    /// Raw Q16.16 word currently latched in the operand register.
    pub fn latched_operand(&self) -> u32 {
        self.state.lock().operand
    }
}

pub struct SimBus {
    state: Arc<Mutex<DeviceState>>,
}

impl BusTransport for SimBus {
    fn transfer(&mut self, out: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut st = self.state.lock();
        let index = st.transfers;
        st.transfers += 1;
        if st.fail_transfer == Some(index) {
            return Err(TransportError::Simulated(format!("transfer #{index} failed")));
        }
        let mut response = st.respond(out);
        if st.truncate_replies {
            response.pop();
        }
        st.journal.push(BusEvent::Transfer {
            out: out.to_vec(),
            response: response.clone(),
        });
        Ok(response)
    }
}

pub struct SimResetLine {
    state: Arc<Mutex<DeviceState>>,
}

impl DigitalOutput for SimResetLine {
    fn set_level(&mut self, level: Level) -> Result<(), TransportError> {
        let mut st = self.state.lock();
        let index = st.level_writes;
        st.level_writes += 1;
        if st.fail_level_write == Some(index) {
            return Err(TransportError::Simulated(format!("pin write #{index} failed")));
        }
        st.held_in_reset = level == Level::High;
        st.journal.push(BusEvent::Level(level));
        Ok(())
    }
}

fn isqrt(n: u32) -> u32 {
    let n = u64::from(n);
    let mut x = (n as f64).sqrt() as u64;
    while x * x > n {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= n {
        x += 1;
    }
    x as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isqrt_exact_and_floor() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(0x0004_0000), 512);
        assert_eq!(isqrt(0x0002_0000), 362);
        assert_eq!(isqrt(u32::MAX), 65535);
    }

    #[test]
    fn write_latches_operand_and_read_returns_root() {
        let dev = SimulatedDevice::new();
        let mut bus = dev.bus();
        let ack = bus.transfer(&[0x80, 0x00, 0x04, 0x00, 0x00]).unwrap();
        assert_eq!(ack, vec![0x80, 0, 0, 0, 0]);
        assert_eq!(dev.latched_operand(), 0x0004_0000);

        let resp = bus.transfer(&[0x01, 0, 0, 0, 0]).unwrap();
        assert_eq!(resp, vec![0x01, 0x00, 0x02, 0x00, 0x00]);
    }

    #[test]
    fn frames_are_ignored_while_held_in_reset() {
        let dev = SimulatedDevice::new();
        let mut bus = dev.bus();
        let mut pin = dev.reset_line();
        pin.set_level(Level::High).unwrap();
        let resp = bus.transfer(&[0x80, 0x00, 0x09, 0x00, 0x00]).unwrap();
        assert_eq!(resp, vec![0; 5]);
        assert_eq!(dev.latched_operand(), 0);
    }

    #[test]
    fn reset_pulse_keeps_latched_operand() {
        let dev = SimulatedDevice::new();
        let mut bus = dev.bus();
        let mut pin = dev.reset_line();
        bus.transfer(&[0x80, 0x00, 0x09, 0x00, 0x00]).unwrap();
        pin.set_level(Level::High).unwrap();
        pin.set_level(Level::Low).unwrap();
        assert_eq!(dev.latched_operand(), 0x0009_0000);
    }

    #[test]
    fn injected_faults_fire_once_at_index() {
        let dev = SimulatedDevice::new();
        dev.fail_transfer(1);
        let mut bus = dev.bus();
        assert!(bus.transfer(&[0x01, 0, 0, 0, 0]).is_ok());
        assert!(matches!(
            bus.transfer(&[0x01, 0, 0, 0, 0]),
            Err(TransportError::Simulated(_))
        ));
        assert!(bus.transfer(&[0x01, 0, 0, 0, 0]).is_ok());
        assert_eq!(dev.journal().len(), 2);
    }
}
