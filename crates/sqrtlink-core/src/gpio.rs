//! Reset line on a Raspberry Pi header pin.

use rppal::gpio::{Gpio, OutputPin};

use crate::transport::{DigitalOutput, Level, TransportError};

pub struct RppalResetLine {
    pin: OutputPin,
}

impl RppalResetLine {
    /// Claim `bcm_pin` as an output, driven low.
    pub fn open(bcm_pin: u8) -> Result<Self, TransportError> {
        let gpio = Gpio::new().map_err(|e| TransportError::Gpio(e.to_string()))?;
        let pin = gpio
            .get(bcm_pin)
            .map_err(|e| TransportError::Gpio(format!("BCM{bcm_pin}: {e}")))?
            .into_output_low();
        log::info!("reset line on BCM{bcm_pin}");
        Ok(Self { pin })
    }
}

impl DigitalOutput for RppalResetLine {
    fn set_level(&mut self, level: Level) -> Result<(), TransportError> {
        match level {
            Level::High => self.pin.set_high(),
            Level::Low => self.pin.set_low(),
        }
        Ok(())
    }
}
