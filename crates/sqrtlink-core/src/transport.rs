use serde::{Deserialize, Serialize};

/// BCM19, pin 4 of the FPGA board connector.
pub const DEFAULT_RESET_PIN: u8 = 19;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("bus I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("GPIO failed: {0}")]
    Gpio(String),
    #[error("transfer returned {received} bytes for {sent} sent")]
    LengthMismatch { sent: usize, received: usize },
    #[error("simulated fault: {0}")]
    Simulated(String),
    #[error("backend not available in this build: {0}")]
    Unsupported(String),
}

/// Electrical level of a digital output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    High,
    Low,
}

/// Full-duplex bus access.
///
/// `transfer` clocks out every byte of `out` and returns the bytes clocked in
/// at the same time, so the result has the same length as the input.
pub trait BusTransport {
    fn transfer(&mut self, out: &[u8]) -> Result<Vec<u8>, TransportError>;
}

/// A single push-pull output line.
pub trait DigitalOutput {
    fn set_level(&mut self, level: Level) -> Result<(), TransportError>;
}

impl<T: BusTransport + ?Sized> BusTransport for Box<T> {
    fn transfer(&mut self, out: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).transfer(out)
    }
}

impl<T: BusTransport + ?Sized> BusTransport for &mut T {
    fn transfer(&mut self, out: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).transfer(out)
    }
}

impl<T: DigitalOutput + ?Sized> DigitalOutput for Box<T> {
    fn set_level(&mut self, level: Level) -> Result<(), TransportError> {
        (**self).set_level(level)
    }
}

impl<T: DigitalOutput + ?Sized> DigitalOutput for &mut T {
    fn set_level(&mut self, level: Level) -> Result<(), TransportError> {
        (**self).set_level(level)
    }
}

/// SPI clock polarity/phase combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpiMode {
    Mode0,
    Mode1,
    Mode2,
    Mode3,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub bus: u8,
    pub chip_select: u8,
    pub clock_hz: u32,
    pub mode: SpiMode,
}

impl BusConfig {
    /// Character device path used by the Linux spidev driver.
    pub fn device_path(&self) -> String {
        format!("/dev/spidev{}.{}", self.bus, self.chip_select)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            bus: 0,
            chip_select: 0,
            clock_hz: 500_000,
            mode: SpiMode::Mode0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bus_matches_peripheral_wiring() {
        let cfg = BusConfig::default();
        assert_eq!(cfg.clock_hz, 500_000);
        assert_eq!(cfg.mode, SpiMode::Mode0);
        assert_eq!(cfg.device_path(), "/dev/spidev0.0");
    }

    struct Loopback;

    impl BusTransport for Loopback {
        fn transfer(&mut self, out: &[u8]) -> Result<Vec<u8>, TransportError> {
            Ok(out.to_vec())
        }
    }

    #[test]
    fn boxed_transport_delegates() {
        let mut bus: Box<dyn BusTransport> = Box::new(Loopback);
        assert_eq!(bus.transfer(&[1, 2, 3]).unwrap(), vec![1, 2, 3]);
    }
}
