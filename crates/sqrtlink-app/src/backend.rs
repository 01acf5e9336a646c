use anyhow::Result;
use sqrtlink_core::{BusTransport, DigitalOutput, SimulatedDevice};

use crate::settings::{Backend, Settings};

pub type BoxedBus = Box<dyn BusTransport>;
pub type BoxedPin = Box<dyn DigitalOutput>;

/// Open the bus and reset line selected in `settings`.
pub fn open(settings: &Settings) -> Result<(BoxedBus, BoxedPin)> {
    match settings.backend {
        Backend::Simulated => {
            log::info!("using simulated peripheral");
            let dev = SimulatedDevice::new();
            Ok((Box::new(dev.bus()), Box::new(dev.reset_line())))
        }
        Backend::Hardware => open_hardware(settings),
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_hardware(settings: &Settings) -> Result<(BoxedBus, BoxedPin)> {
    use anyhow::Context;
    use sqrtlink_core::{RppalResetLine, SpidevBus};

    let bus = SpidevBus::open(&settings.spi)
        .with_context(|| format!("opening {}", settings.spi.device_path()))?;
    let pin = RppalResetLine::open(settings.reset_pin)
        .with_context(|| format!("claiming reset pin BCM{}", settings.reset_pin))?;
    Ok((Box::new(bus), Box::new(pin)))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_hardware(_settings: &Settings) -> Result<(BoxedBus, BoxedPin)> {
    Err(sqrtlink_core::TransportError::Unsupported(
        "built without the `hardware` feature (or not on Linux); use --simulate".into(),
    )
    .into())
}
