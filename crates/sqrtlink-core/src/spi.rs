//! Linux spidev backend.

use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};

use crate::transport::{BusConfig, BusTransport, SpiMode, TransportError};

pub struct SpidevBus {
    dev: Spidev,
}

impl SpidevBus {
    pub fn open(cfg: &BusConfig) -> Result<Self, TransportError> {
        let path = cfg.device_path();
        let mut dev = Spidev::open(&path)?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(cfg.clock_hz)
            .mode(mode_flags(cfg.mode))
            .build();
        dev.configure(&options)?;
        log::info!("opened {path} at {} Hz, {:?}", cfg.clock_hz, cfg.mode);
        Ok(Self { dev })
    }
}

impl BusTransport for SpidevBus {
    fn transfer(&mut self, out: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut rx = vec![0u8; out.len()];
        {
            // single message so chip select stays asserted for the whole frame
            let mut xfer = SpidevTransfer::read_write(out, &mut rx);
            self.dev.transfer(&mut xfer)?;
        }
        Ok(rx)
    }
}

fn mode_flags(mode: SpiMode) -> SpiModeFlags {
    match mode {
        SpiMode::Mode0 => SpiModeFlags::SPI_MODE_0,
        SpiMode::Mode1 => SpiModeFlags::SPI_MODE_1,
        SpiMode::Mode2 => SpiModeFlags::SPI_MODE_2,
        SpiMode::Mode3 => SpiModeFlags::SPI_MODE_3,
    }
}
