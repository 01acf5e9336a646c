//! Host-side session with the square-root peripheral: reset line, SPI
//! transport, request sequencing.

pub mod framelog;
pub mod session;
pub mod sim;
pub mod transport;

#[cfg(all(feature = "rppal", target_os = "linux"))]
pub mod gpio;
#[cfg(all(feature = "spidev", target_os = "linux"))]
pub mod spi;

pub use framelog::{Direction, FrameLog, LogEntry};
pub use session::{DeviceSession, Phase, SessionConfig, SessionError};
pub use sim::{BusEvent, SimBus, SimResetLine, SimulatedDevice};
pub use transport::{
    BusConfig, BusTransport, DigitalOutput, Level, SpiMode, TransportError, DEFAULT_RESET_PIN,
};

#[cfg(all(feature = "rppal", target_os = "linux"))]
pub use gpio::RppalResetLine;
#[cfg(all(feature = "spidev", target_os = "linux"))]
pub use spi::SpidevBus;

pub use sqrtlink_codec as codec;
